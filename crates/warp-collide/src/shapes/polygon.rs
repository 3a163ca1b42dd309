// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use super::ShapeError;
use crate::math::{cross_vs, Rot, Transform, Vec2};
use crate::settings::{EPSILON, LINEAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS};
use crate::types::aabb::Aabb;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Convex polygon with counter-clockwise winding and a small skin radius.
///
/// Vertices, outward edge normals and the centroid are precomputed at
/// construction. Edge `i` runs from vertex `i` to vertex `i + 1` (wrapping)
/// and `normals[i]` is its outward unit normal.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    vertices: [Vec2; MAX_POLYGON_VERTICES],
    normals: [Vec2; MAX_POLYGON_VERTICES],
    count: usize,
    centroid: Vec2,
    radius: f32,
}

impl Polygon {
    /// Builds the convex hull of `points`.
    ///
    /// Points closer than half the linear slop are welded first. Collinear
    /// points are dropped by the hull. Fails when fewer than three points
    /// survive or the hull has no area.
    pub fn new(points: &[Vec2]) -> Result<Self, ShapeError> {
        if points.len() < 3 {
            return Err(ShapeError::TooFewVertices {
                shape: "polygon",
                min: 3,
                got: points.len(),
            });
        }
        if points.len() > MAX_POLYGON_VERTICES {
            return Err(ShapeError::TooManyVertices {
                max: MAX_POLYGON_VERTICES,
                got: points.len(),
            });
        }

        let weld = 0.5 * LINEAR_SLOP;
        let mut ps = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let mut n = 0;
        for &v in points {
            if ps[..n].iter().all(|p| v.distance_squared(*p) > weld * weld) {
                ps[n] = v;
                n += 1;
            }
        }
        if n < 3 {
            return Err(ShapeError::DegenerateHull);
        }

        let hull = gift_wrap(&ps[..n]);
        if hull.len() < 3 {
            return Err(ShapeError::DegenerateHull);
        }

        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        for (dst, &src) in vertices.iter_mut().zip(hull.iter()) {
            *dst = ps[src];
        }
        Self::from_hull(&vertices[..hull.len()])
    }

    /// Axis-aligned box with half-widths `hx`, `hy` centred on the origin.
    pub fn new_box(hx: f32, hy: f32) -> Self {
        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let mut normals = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        vertices[..4].copy_from_slice(&[
            Vec2::new(-hx, -hy),
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
        ]);
        normals[..4].copy_from_slice(&[
            Vec2::new(0.0, -1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        ]);
        Self {
            vertices,
            normals,
            count: 4,
            centroid: Vec2::ZERO,
            radius: POLYGON_RADIUS,
        }
    }

    /// Box with half-widths `hx`, `hy`, centred at `center` and rotated by
    /// `angle` radians in the body frame.
    pub fn new_oriented_box(hx: f32, hy: f32, center: Vec2, angle: f32) -> Self {
        let mut poly = Self::new_box(hx, hy);
        let xf = Transform::new(center, Rot::from_angle(angle));
        for i in 0..poly.count {
            poly.vertices[i] = xf.apply(poly.vertices[i]);
            poly.normals[i] = xf.q.apply(poly.normals[i]);
        }
        poly.centroid = center;
        poly
    }

    // Vertices are already a counter-clockwise convex hull.
    fn from_hull(hull: &[Vec2]) -> Result<Self, ShapeError> {
        let count = hull.len();
        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let mut normals = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        vertices[..count].copy_from_slice(hull);

        for i in 0..count {
            let next = if i + 1 < count { i + 1 } else { 0 };
            let edge = vertices[next] - vertices[i];
            if edge.length_squared() <= EPSILON * EPSILON {
                return Err(ShapeError::DegenerateHull);
            }
            normals[i] = cross_vs(edge, 1.0).normalize();
        }

        let centroid = compute_centroid(&vertices[..count]).ok_or(ShapeError::DegenerateHull)?;
        Ok(Self {
            vertices,
            normals,
            count,
            centroid,
            radius: POLYGON_RADIUS,
        })
    }

    /// Hull vertices in counter-clockwise order.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices[..self.count]
    }

    /// Outward unit normals; `normals()[i]` belongs to edge `i`.
    #[must_use]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals[..self.count]
    }

    /// Number of vertices.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Area centroid in body-local coordinates.
    #[must_use]
    pub const fn centroid(&self) -> Vec2 {
        self.centroid
    }

    /// Skin radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// `true` if every vertex lies on the inner side of every other edge.
    #[must_use]
    pub fn is_convex(&self) -> bool {
        (0..self.count).all(|i| {
            let i2 = if i + 1 < self.count { i + 1 } else { 0 };
            let p = self.vertices[i];
            let e = self.vertices[i2] - p;
            (0..self.count)
                .filter(|&j| j != i && j != i2)
                .all(|j| e.cross(self.vertices[j] - p) >= 0.0)
        })
    }

    pub(crate) fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let local = xf.apply_inverse(p);
        self.vertices()
            .iter()
            .zip(self.normals())
            .all(|(v, n)| n.dot(local - *v) <= 0.0)
    }

    pub(crate) fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let first = xf.apply(self.vertices[0]);
        let (lower, upper) = self.vertices()[1..]
            .iter()
            .map(|v| xf.apply(*v))
            .fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Aabb::new(lower, upper).extended(self.radius)
    }

    // Clips the ray against each half-space; the skin radius is ignored.
    pub(crate) fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let p1 = xf.q.apply_inverse(input.p1 - xf.p);
        let p2 = xf.q.apply_inverse(input.p2 - xf.p);
        let d = p2 - p1;

        let mut lower = 0.0_f32;
        let mut upper = input.max_fraction;
        let mut index = None;

        for (i, (v, n)) in self.vertices().iter().zip(self.normals()).enumerate() {
            // dot(n, p1 + a d - v) = 0
            let numerator = n.dot(*v - p1);
            let denominator = n.dot(d);

            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else if denominator < 0.0 && numerator < lower * denominator {
                // Entering this half-space.
                lower = numerator / denominator;
                index = Some(i);
            } else if denominator > 0.0 && numerator < upper * denominator {
                // Leaving this half-space.
                upper = numerator / denominator;
            }

            if upper < lower {
                return None;
            }
        }

        index.map(|i| RayCastOutput {
            normal: xf.q.apply(self.normals[i]),
            fraction: lower,
        })
    }
}

// Gift-wrapping hull over at most MAX_POLYGON_VERTICES welded points.
// Returns indices into `ps`, counter-clockwise, starting at the rightmost point.
fn gift_wrap(ps: &[Vec2]) -> Vec<usize> {
    let mut i0 = 0;
    let mut x0 = ps[0].x;
    for (i, p) in ps.iter().enumerate().skip(1) {
        if p.x > x0 || (p.x == x0 && p.y < ps[i0].y) {
            i0 = i;
            x0 = p.x;
        }
    }

    let mut hull = Vec::with_capacity(ps.len());
    let mut ih = i0;
    loop {
        hull.push(ih);

        let mut ie = 0;
        for j in 1..ps.len() {
            if ie == ih {
                ie = j;
                continue;
            }
            let r = ps[ie] - ps[ih];
            let v = ps[j] - ps[ih];
            let c = r.cross(v);
            if c < 0.0 {
                ie = j;
            }
            // Collinear: keep the farthest point.
            if c == 0.0 && v.length_squared() > r.length_squared() {
                ie = j;
            }
        }

        ih = ie;
        if ie == i0 || hull.len() >= ps.len() {
            break;
        }
    }
    hull
}

// Area-weighted centroid of a triangle fan; `None` when the area vanishes.
fn compute_centroid(vs: &[Vec2]) -> Option<Vec2> {
    const INV3: f32 = 1.0 / 3.0;
    // Fanning from the first vertex keeps round-off local to the shape.
    let p_ref = vs[0];

    let mut c = Vec2::ZERO;
    let mut area = 0.0;
    for (i, &p2) in vs.iter().enumerate() {
        let p3 = vs[if i + 1 < vs.len() { i + 1 } else { 0 }];
        let e1 = p2 - p_ref;
        let e2 = p3 - p_ref;
        let triangle_area = 0.5 * e1.cross(e2);
        area += triangle_area;
        c += (p_ref + p2 + p3) * (triangle_area * INV3);
    }

    if area <= EPSILON {
        return None;
    }
    Some(c * (1.0 / area))
}
