// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Transform, Vec2};
use crate::settings::{ANGULAR_SLOP, MAX_MANIFOLD_POINTS, MAX_POLYGON_VERTICES, POLYGON_RADIUS};
use crate::shapes::{Circle, Edge, Polygon};

use super::clip::{clip_segment_to_line, ClipVertex};
use super::manifold::{feature_index, ContactFeature, FeatureType, Manifold, ManifoldType};

/// Edge-polygon contact skin: both sides carry a polygon radius.
const EDGE_POLYGON_RADIUS: f32 = 2.0 * POLYGON_RADIUS;

// A polygon face replaces the edge as reference only when its separation
// exceeds RELATIVE_TOLERANCE * edge + ABSOLUTE_TOLERANCE.
const RELATIVE_TOLERANCE: f32 = 0.98;
const ABSOLUTE_TOLERANCE: f32 = 0.001;

/// Edge A against circle B.
///
/// The circle center is classified into the Voronoi regions of the edge's
/// two vertices and its interior. Ghost vertices suppress vertex contacts
/// that belong to a neighbouring segment, so circles roll smoothly across
/// chain joints.
pub fn collide_edge_and_circle(
    manifold: &mut Manifold,
    edge_a: &Edge,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) {
    manifold.clear();

    // Circle center in the edge's frame.
    let q = xf_a.apply_inverse(xf_b.apply(circle_b.position));

    let a = edge_a.v1;
    let b = edge_a.v2;
    let e = b - a;

    // Barycentric coordinates.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let radius = edge_a.radius() + circle_b.radius;

    // Region A
    if v <= 0.0 {
        if q.distance_squared(a) > radius * radius {
            return;
        }
        // Is the circle in region AB of the previous edge?
        if let Some(a1) = edge_a.v0 {
            let e1 = a - a1;
            if e1.dot(a - q) > 0.0 {
                return;
            }
        }
        push_vertex_contact(manifold, a, 0, circle_b.position);
        return;
    }

    // Region B
    if u <= 0.0 {
        if q.distance_squared(b) > radius * radius {
            return;
        }
        // Is the circle in region AB of the next edge?
        if let Some(b2) = edge_a.v3 {
            let e2 = b2 - b;
            if e2.dot(q - b) > 0.0 {
                return;
            }
        }
        push_vertex_contact(manifold, b, 1, circle_b.position);
        return;
    }

    // Region AB
    let den = e.dot(e);
    debug_assert!(den > 0.0);
    let p = (a * u + b * v) * (1.0 / den);
    if q.distance_squared(p) > radius * radius {
        return;
    }

    let mut n = Vec2::new(-e.y, e.x);
    if n.dot(q - a) < 0.0 {
        n = -n;
    }

    manifold.kind = ManifoldType::FaceA;
    manifold.local_normal = n.normalize();
    manifold.local_point = a;
    manifold.push_point(
        circle_b.position,
        ContactFeature::new(0, FeatureType::Face, 0, FeatureType::Vertex),
    );
}

fn push_vertex_contact(manifold: &mut Manifold, vertex: Vec2, index: u8, center: Vec2) {
    manifold.kind = ManifoldType::Circles;
    manifold.local_normal = Vec2::ZERO;
    manifold.local_point = vertex;
    manifold.push_point(
        center,
        ContactFeature::new(index, FeatureType::Vertex, 0, FeatureType::Vertex),
    );
}

/// Edge A against polygon B.
///
/// The edge is treated as a thin polygon whose admissible collision normals
/// are limited by the convexity of its ghost neighbours. Without ghosts the
/// edge is two-sided. Contacts are clipped against whichever of the edge
/// face or a polygon face separates best, with hysteresis favouring the
/// edge.
pub fn collide_edge_and_polygon(
    manifold: &mut Manifold,
    edge_a: &Edge,
    xf_a: &Transform,
    polygon_b: &Polygon,
    xf_b: &Transform,
) {
    manifold.clear();
    EpCollider::new(edge_a, xf_a, polygon_b, xf_b).collide(manifold, polygon_b);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum AxisKind {
    EdgeA,
    EdgeB,
}

#[derive(Debug, Copy, Clone)]
struct Axis {
    kind: AxisKind,
    index: usize,
    separation: f32,
}

#[derive(Debug, Copy, Clone)]
struct ReferenceFace {
    i1: usize,
    i2: usize,
    v1: Vec2,
    normal: Vec2,
    side_normal1: Vec2,
    side_offset1: f32,
    side_normal2: Vec2,
    side_offset2: f32,
}

impl ReferenceFace {
    fn new(i1: usize, i2: usize, v1: Vec2, v2: Vec2, normal: Vec2) -> Self {
        let side_normal1 = Vec2::new(normal.y, -normal.x);
        let side_normal2 = -side_normal1;
        Self {
            i1,
            i2,
            v1,
            normal,
            side_normal1,
            side_offset1: side_normal1.dot(v1),
            side_normal2,
            side_offset2: side_normal2.dot(v2),
        }
    }
}

// Normal of a directed segment pointing to its right.
fn right_normal(from: Vec2, to: Vec2) -> Vec2 {
    let e = (to - from).normalize();
    Vec2::new(e.y, -e.x)
}

/// Edge-polygon collision state, everything in the edge's frame.
struct EpCollider {
    /// Polygon B's hull in A's frame.
    vertices: [Vec2; MAX_POLYGON_VERTICES],
    normals: [Vec2; MAX_POLYGON_VERTICES],
    count: usize,
    /// B's frame relative to A.
    xf: Transform,
    v1: Vec2,
    v2: Vec2,
    normal1: Vec2,
    /// Collision normal for the chosen side.
    normal: Vec2,
    lower_limit: Vec2,
    upper_limit: Vec2,
    front: bool,
}

impl EpCollider {
    fn new(edge: &Edge, xf_a: &Transform, polygon: &Polygon, xf_b: &Transform) -> Self {
        let xf = xf_a.inv_times(xf_b);
        let centroid_b = xf.apply(polygon.centroid());

        let v1 = edge.v1;
        let v2 = edge.v2;
        let edge1 = (v2 - v1).normalize();
        let normal1 = Vec2::new(edge1.y, -edge1.x);
        let offset1 = normal1.dot(centroid_b - v1);

        // (normal, offset, convex) for each present neighbour.
        let prev = edge.v0.map(|v0| {
            let n0 = right_normal(v0, v1);
            let convex = (v1 - v0).normalize().cross(edge1) >= 0.0;
            (n0, n0.dot(centroid_b - v0), convex)
        });
        let next = edge.v3.map(|v3| {
            let n2 = right_normal(v2, v3);
            let convex = edge1.cross((v3 - v2).normalize()) > 0.0;
            (n2, n2.dot(centroid_b - v2), convex)
        });

        let n1 = normal1;
        let o1 = offset1 >= 0.0;
        // (front, lower limit if front, upper if front, lower if back, upper if back)
        let (front, limits_front, limits_back) = match (prev, next) {
            (Some((n0, o0, convex1)), Some((n2, o2, convex2))) => {
                let (o0, o2) = (o0 >= 0.0, o2 >= 0.0);
                match (convex1, convex2) {
                    (true, true) => (o0 || o1 || o2, (n0, n2), (-n1, -n1)),
                    (true, false) => (o0 || (o1 && o2), (n0, n1), (-n2, -n1)),
                    (false, true) => (o2 || (o0 && o1), (n1, n2), (-n1, -n0)),
                    (false, false) => (o0 && o1 && o2, (n1, n1), (-n2, -n0)),
                }
            }
            (Some((n0, o0, convex1)), None) => {
                let o0 = o0 >= 0.0;
                if convex1 {
                    (o0 || o1, (n0, -n1), (n1, -n1))
                } else {
                    (o0 && o1, (n1, -n1), (n1, -n0))
                }
            }
            (None, Some((n2, o2, convex2))) => {
                let o2 = o2 >= 0.0;
                if convex2 {
                    (o1 || o2, (-n1, n2), (-n1, n1))
                } else {
                    (o1 && o2, (-n1, n1), (-n2, n1))
                }
            }
            (None, None) => (o1, (-n1, -n1), (n1, n1)),
        };
        let (normal, (lower_limit, upper_limit)) = if front {
            (n1, limits_front)
        } else {
            (-n1, limits_back)
        };

        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let mut normals = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        for (i, (v, n)) in polygon.vertices().iter().zip(polygon.normals()).enumerate() {
            vertices[i] = xf.apply(*v);
            normals[i] = xf.q.apply(*n);
        }

        Self {
            vertices,
            normals,
            count: polygon.count(),
            xf,
            v1,
            v2,
            normal1,
            normal,
            lower_limit,
            upper_limit,
            front,
        }
    }

    fn collide(&self, manifold: &mut Manifold, polygon_b: &Polygon) {
        let edge_axis = self.edge_separation();
        if edge_axis.separation > EDGE_POLYGON_RADIUS {
            return;
        }

        let polygon_axis = self.polygon_separation();
        if let Some(axis) = polygon_axis {
            if axis.separation > EDGE_POLYGON_RADIUS {
                return;
            }
        }

        // Hysteresis against jitter between the two candidate faces.
        let primary = match polygon_axis {
            Some(axis)
                if axis.separation
                    > RELATIVE_TOLERANCE * edge_axis.separation + ABSOLUTE_TOLERANCE =>
            {
                axis
            }
            _ => edge_axis,
        };

        let (incident, rf) = match primary.kind {
            AxisKind::EdgeA => {
                manifold.kind = ManifoldType::FaceA;
                (self.incident_polygon_edge(), self.edge_reference_face())
            }
            AxisKind::EdgeB => {
                manifold.kind = ManifoldType::FaceB;
                (
                    self.incident_edge(primary.index),
                    self.polygon_reference_face(primary.index),
                )
            }
        };

        let clip1 = clip_segment_to_line(
            &incident,
            rf.side_normal1,
            rf.side_offset1,
            feature_index(rf.i1),
        );
        if clip1.count < MAX_MANIFOLD_POINTS {
            return;
        }
        let clip2 = clip_segment_to_line(
            &clip1.vertices,
            rf.side_normal2,
            rf.side_offset2,
            feature_index(rf.i2),
        );
        if clip2.count < MAX_MANIFOLD_POINTS {
            return;
        }

        match primary.kind {
            AxisKind::EdgeA => {
                manifold.local_normal = rf.normal;
                manifold.local_point = rf.v1;
            }
            AxisKind::EdgeB => {
                manifold.local_normal = polygon_b.normals()[rf.i1];
                manifold.local_point = polygon_b.vertices()[rf.i1];
            }
        }

        for cv in clip2.as_slice() {
            let separation = rf.normal.dot(cv.v - rf.v1);
            if separation > EDGE_POLYGON_RADIUS {
                continue;
            }
            match primary.kind {
                AxisKind::EdgeA => manifold.push_point(self.xf.apply_inverse(cv.v), cv.id),
                AxisKind::EdgeB => manifold.push_point(cv.v, cv.id.swapped()),
            }
        }
    }

    fn polygon_vertices(&self) -> &[Vec2] {
        &self.vertices[..self.count]
    }

    fn polygon_normals(&self) -> &[Vec2] {
        &self.normals[..self.count]
    }

    fn next_index(&self, i: usize) -> usize {
        if i + 1 < self.count {
            i + 1
        } else {
            0
        }
    }

    fn edge_separation(&self) -> Axis {
        let separation = self
            .polygon_vertices()
            .iter()
            .map(|v| self.normal.dot(*v - self.v1))
            .fold(f32::MAX, f32::min);
        Axis {
            kind: AxisKind::EdgeA,
            index: usize::from(!self.front),
            separation,
        }
    }

    fn polygon_separation(&self) -> Option<Axis> {
        let mut best: Option<Axis> = None;
        let perp = Vec2::new(-self.normal.y, self.normal.x);

        for (i, (v, pn)) in self
            .polygon_vertices()
            .iter()
            .zip(self.polygon_normals())
            .enumerate()
        {
            let n = -*pn;
            let s1 = n.dot(*v - self.v1);
            let s2 = n.dot(*v - self.v2);
            let s = s1.min(s2);

            if s > EDGE_POLYGON_RADIUS {
                // No collision.
                return Some(Axis {
                    kind: AxisKind::EdgeB,
                    index: i,
                    separation: s,
                });
            }

            // Adjacency: skip normals outside the admissible range.
            let limit = if n.dot(perp) >= 0.0 {
                self.upper_limit
            } else {
                self.lower_limit
            };
            if (n - limit).dot(self.normal) < -ANGULAR_SLOP {
                continue;
            }

            if best.is_none_or(|axis| s > axis.separation) {
                best = Some(Axis {
                    kind: AxisKind::EdgeB,
                    index: i,
                    separation: s,
                });
            }
        }
        best
    }

    /// Polygon edge most anti-parallel to the collision normal.
    fn incident_polygon_edge(&self) -> [ClipVertex; 2] {
        let mut best_index = 0;
        let mut best_value = self.normal.dot(self.normals[0]);
        for (i, n) in self.polygon_normals().iter().enumerate().skip(1) {
            let value = self.normal.dot(*n);
            if value < best_value {
                best_value = value;
                best_index = i;
            }
        }

        let i1 = best_index;
        let i2 = self.next_index(i1);
        [
            ClipVertex::new(
                self.vertices[i1],
                ContactFeature::new(0, FeatureType::Face, feature_index(i1), FeatureType::Vertex),
            ),
            ClipVertex::new(
                self.vertices[i2],
                ContactFeature::new(0, FeatureType::Face, feature_index(i2), FeatureType::Vertex),
            ),
        ]
    }

    fn edge_reference_face(&self) -> ReferenceFace {
        if self.front {
            ReferenceFace::new(0, 1, self.v1, self.v2, self.normal1)
        } else {
            ReferenceFace::new(1, 0, self.v2, self.v1, -self.normal1)
        }
    }

    /// The edge itself, seen as incident on polygon face `face`.
    fn incident_edge(&self, face: usize) -> [ClipVertex; 2] {
        let id = ContactFeature::new(
            0,
            FeatureType::Vertex,
            feature_index(face),
            FeatureType::Face,
        );
        [ClipVertex::new(self.v1, id), ClipVertex::new(self.v2, id)]
    }

    fn polygon_reference_face(&self, face: usize) -> ReferenceFace {
        let i2 = self.next_index(face);
        ReferenceFace::new(
            face,
            i2,
            self.vertices[face],
            self.vertices[i2],
            self.normals[face],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrow::manifold::WorldManifold;

    fn at(x: f32, y: f32) -> Transform {
        Transform::from_angle(Vec2::new(x, y), 0.0)
    }

    fn ground() -> Edge {
        Edge::new(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0))
    }

    #[test]
    fn circle_over_edge_interior_hits_the_face() {
        let c = Circle::new(Vec2::ZERO, 0.5);
        let mut m = Manifold::new();
        collide_edge_and_circle(&mut m, &ground(), &Transform::IDENTITY, &c, &at(0.5, 0.45));
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.kind, ManifoldType::FaceA);
        assert!((m.local_normal - Vec2::UNIT_Y).length() < 1e-6);
        assert_eq!(m.points()[0].id.type_a, FeatureType::Face);
    }

    #[test]
    fn circle_under_two_sided_edge_gets_downward_normal() {
        let c = Circle::new(Vec2::ZERO, 0.5);
        let mut m = Manifold::new();
        collide_edge_and_circle(&mut m, &ground(), &Transform::IDENTITY, &c, &at(0.5, -0.45));
        assert!((m.local_normal + Vec2::UNIT_Y).length() < 1e-6);
    }

    #[test]
    fn ghost_vertex_suppresses_corner_contact() {
        let c = Circle::new(Vec2::ZERO, 0.5);
        let xf_b = at(-2.2, 0.3);
        let mut m = Manifold::new();
        collide_edge_and_circle(&mut m, &ground(), &Transform::IDENTITY, &c, &xf_b);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.kind, ManifoldType::Circles);
        assert_eq!(m.points()[0].id.index_a, 0);

        // The previous segment continues the ground, so it owns this contact.
        let linked = ground().with_v0(Vec2::new(-4.0, 0.0));
        collide_edge_and_circle(&mut m, &linked, &Transform::IDENTITY, &c, &xf_b);
        assert!(m.is_empty());
    }

    #[test]
    fn box_resting_on_edge_gets_two_points() {
        let b = Polygon::new_box(0.5, 0.5);
        let xf_b = at(0.3, 0.51);
        let mut m = Manifold::new();
        collide_edge_and_polygon(&mut m, &ground(), &Transform::IDENTITY, &b, &xf_b);
        assert_eq!(m.point_count(), 2);
        assert_eq!(m.kind, ManifoldType::FaceA);
        assert!((m.local_normal - Vec2::UNIT_Y).length() < 1e-6);

        let wm = WorldManifold::new(&m, &Transform::IDENTITY, POLYGON_RADIUS, &xf_b, b.radius());
        assert!((wm.normal - Vec2::UNIT_Y).length() < 1e-6);
        for p in wm.points() {
            assert!(p.y.abs() < 0.05);
        }
    }

    #[test]
    fn box_far_from_edge_produces_nothing() {
        let b = Polygon::new_box(0.5, 0.5);
        let mut m = Manifold::new();
        collide_edge_and_polygon(&mut m, &ground(), &Transform::IDENTITY, &b, &at(0.0, 0.6));
        assert!(m.is_empty());
    }

    #[test]
    fn flat_chain_segment_collides_on_either_side() {
        let e = ground()
            .with_v0(Vec2::new(-4.0, 0.0))
            .with_v3(Vec2::new(4.0, 0.0));
        let b = Polygon::new_box(0.5, 0.5);
        let mut m = Manifold::new();

        let above = at(0.0, 0.49);
        collide_edge_and_polygon(&mut m, &e, &Transform::IDENTITY, &b, &above);
        assert_eq!(m.point_count(), 2);
        let wm = WorldManifold::new(&m, &Transform::IDENTITY, POLYGON_RADIUS, &above, b.radius());
        assert!((wm.normal - Vec2::UNIT_Y).length() < 1e-6);

        let below = at(0.0, -0.49);
        collide_edge_and_polygon(&mut m, &e, &Transform::IDENTITY, &b, &below);
        assert_eq!(m.point_count(), 2);
        let wm = WorldManifold::new(&m, &Transform::IDENTITY, POLYGON_RADIUS, &below, b.radius());
        assert!((wm.normal + Vec2::UNIT_Y).length() < 1e-6);
    }
}
