// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use tracing::debug;

use crate::math::{cross_sv, cross_vs, Transform, Vec2};
use crate::settings::{EPSILON, MAX_POLYGON_VERTICES};
use crate::shapes::Shape;

/// Iteration cap for the GJK loop.
pub const GJK_MAX_ITERATIONS: usize = 20;

/// Convex point set plus rounding radius, as seen by GJK.
///
/// Circles become one point, edges and chain segments two, polygons their
/// hull. The vertices are copied so a proxy can outlive the shape borrow.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceProxy {
    vertices: [Vec2; MAX_POLYGON_VERTICES],
    count: usize,
    radius: f32,
}

impl DistanceProxy {
    /// Proxy for child `index` of `shape`.
    ///
    /// # Panics
    /// Panics if `index` is not a valid child of a chain.
    pub fn from_shape(shape: &Shape, index: usize) -> Self {
        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let (count, radius) = match shape {
            Shape::Circle(circle) => {
                vertices[0] = circle.position;
                (1, circle.radius)
            }
            Shape::Polygon(poly) => {
                vertices[..poly.count()].copy_from_slice(poly.vertices());
                (poly.count(), poly.radius())
            }
            Shape::Edge(edge) => {
                vertices[0] = edge.v1;
                vertices[1] = edge.v2;
                (2, edge.radius())
            }
            Shape::Chain(chain) => {
                let edge = chain.child_edge(index);
                vertices[0] = edge.v1;
                vertices[1] = edge.v2;
                (2, chain.radius())
            }
        };
        Self {
            vertices,
            count,
            radius,
        }
    }

    /// Proxy over an arbitrary convex point set. Returns `None` for an empty
    /// set or more than [`MAX_POLYGON_VERTICES`] points.
    pub fn from_points(points: &[Vec2], radius: f32) -> Option<Self> {
        if points.is_empty() || points.len() > MAX_POLYGON_VERTICES {
            return None;
        }
        let mut vertices = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        vertices[..points.len()].copy_from_slice(points);
        Some(Self {
            vertices,
            count: points.len(),
            radius,
        })
    }

    /// Index of the vertex furthest along `d`.
    #[must_use]
    pub fn support(&self, d: Vec2) -> usize {
        let mut best_index = 0;
        let mut best_value = self.vertices[0].dot(d);
        for (i, v) in self.vertices().iter().enumerate().skip(1) {
            let value = v.dot(d);
            if value > best_value {
                best_index = i;
                best_value = value;
            }
        }
        best_index
    }

    /// Vertex furthest along `d`.
    #[must_use]
    pub fn support_vertex(&self, d: Vec2) -> Vec2 {
        self.vertices[self.support(d)]
    }

    /// Vertex `index`.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Vec2 {
        debug_assert!(index < self.count);
        self.vertices[index]
    }

    /// Active vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices[..self.count]
    }

    /// Number of vertices.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.count
    }

    /// Rounding radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

/// Warm-start state for [`distance`], owned by the caller across steps.
///
/// Holds the vertex indices of the last simplex and its size metric. Start
/// with `SimplexCache::default()` (count 0) for a cold query.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct SimplexCache {
    /// Length or area of the cached simplex.
    pub metric: f32,
    /// Number of cached vertices, `0..=3`.
    pub count: usize,
    /// Vertex indices on shape A.
    pub index_a: [usize; 3],
    /// Vertex indices on shape B.
    pub index_b: [usize; 3],
}

/// Input to [`distance`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceInput {
    /// Shape A.
    pub proxy_a: DistanceProxy,
    /// Shape B.
    pub proxy_b: DistanceProxy,
    /// Placement of A.
    pub transform_a: Transform,
    /// Placement of B.
    pub transform_b: Transform,
    /// Account for the proxies' radii in the result.
    pub use_radii: bool,
}

/// Result of [`distance`].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct DistanceOutput {
    /// Closest point on A.
    pub point_a: Vec2,
    /// Closest point on B.
    pub point_b: Vec2,
    /// Distance between the points; 0 when overlapping.
    pub distance: f32,
    /// GJK iterations used. Diagnostic only.
    pub iterations: usize,
}

#[derive(Debug, Copy, Clone, Default)]
struct SimplexVertex {
    /// Support point on A, world frame.
    w_a: Vec2,
    /// Support point on B, world frame.
    w_b: Vec2,
    /// `w_b - w_a`.
    w: Vec2,
    /// Barycentric weight for the closest point.
    a: f32,
    index_a: usize,
    index_b: usize,
}

impl SimplexVertex {
    fn new(input: &DistanceInput, index_a: usize, index_b: usize) -> Self {
        let w_a = input.transform_a.apply(input.proxy_a.vertex(index_a));
        let w_b = input.transform_b.apply(input.proxy_b.vertex(index_b));
        Self {
            w_a,
            w_b,
            w: w_b - w_a,
            a: 0.0,
            index_a,
            index_b,
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
struct Simplex {
    v: [SimplexVertex; 3],
    count: usize,
}

impl Simplex {
    fn from_cache(cache: &SimplexCache, input: &DistanceInput) -> Self {
        debug_assert!(cache.count <= 3);
        let mut simplex = Self {
            count: cache.count.min(3),
            ..Self::default()
        };
        for i in 0..simplex.count {
            simplex.v[i] = SimplexVertex::new(input, cache.index_a[i], cache.index_b[i]);
        }

        // Flush the cache if the simplex changed size drastically since it
        // was stored.
        if simplex.count > 1 {
            let metric1 = cache.metric;
            let metric2 = simplex.metric();
            if metric2 < 0.5 * metric1 || 2.0 * metric1 < metric2 || metric2 < EPSILON {
                simplex.count = 0;
            }
        }

        if simplex.count == 0 {
            simplex.v[0] = SimplexVertex::new(input, 0, 0);
            simplex.v[0].a = 1.0;
            simplex.count = 1;
        }
        simplex
    }

    fn write_cache(&self, cache: &mut SimplexCache) {
        cache.metric = self.metric();
        cache.count = self.count;
        for (i, v) in self.v[..self.count].iter().enumerate() {
            cache.index_a[i] = v.index_a;
            cache.index_b[i] = v.index_b;
        }
    }

    fn search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.v[0].w,
            2 => {
                let e12 = self.v[1].w - self.v[0].w;
                let sgn = e12.cross(-self.v[0].w);
                if sgn > 0.0 {
                    // Origin is left of e12.
                    cross_sv(1.0, e12)
                } else {
                    cross_vs(e12, 1.0)
                }
            }
            _ => {
                debug_assert!(false, "search direction of a full simplex");
                Vec2::ZERO
            }
        }
    }

    fn witness_points(&self) -> (Vec2, Vec2) {
        let [v1, v2, v3] = &self.v;
        match self.count {
            1 => (v1.w_a, v1.w_b),
            2 => (
                v1.w_a * v1.a + v2.w_a * v2.a,
                v1.w_b * v1.a + v2.w_b * v2.a,
            ),
            3 => {
                let p = v1.w_a * v1.a + v2.w_a * v2.a + v3.w_a * v3.a;
                (p, p)
            }
            _ => (Vec2::ZERO, Vec2::ZERO),
        }
    }

    fn metric(&self) -> f32 {
        match self.count {
            2 => self.v[0].w.distance(self.v[1].w),
            3 => (self.v[1].w - self.v[0].w).cross(self.v[2].w - self.v[0].w),
            _ => 0.0,
        }
    }

    // Closest feature of segment [w1, w2] to the origin, via barycentric
    // coordinates of the projection.
    fn solve2(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let e12 = w2 - w1;

        // w1 region
        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // w2 region
        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.v[1].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[1];
            return;
        }

        // Must be in e12 region.
        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.v[0].a = d12_1 * inv_d12;
        self.v[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    // Voronoi-region test over the triangle's vertices, edges and interior.
    fn solve3(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let w3 = self.v[2].w;

        // Edge12
        let e12 = w2 - w1;
        let d12_1 = w2.dot(e12);
        let d12_2 = -w1.dot(e12);

        // Edge13
        let e13 = w3 - w1;
        let d13_1 = w3.dot(e13);
        let d13_2 = -w1.dot(e13);

        // Edge23
        let e23 = w3 - w2;
        let d23_1 = w3.dot(e23);
        let d23_2 = -w2.dot(e23);

        // Triangle123
        let n123 = e12.cross(e13);
        let d123_1 = n123 * w2.cross(w3);
        let d123_2 = n123 * w3.cross(w1);
        let d123_3 = n123 * w1.cross(w2);

        // w1 region
        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // e12
        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv = 1.0 / (d12_1 + d12_2);
            self.v[0].a = d12_1 * inv;
            self.v[1].a = d12_2 * inv;
            self.count = 2;
            return;
        }

        // e13
        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv = 1.0 / (d13_1 + d13_2);
            self.v[0].a = d13_1 * inv;
            self.v[2].a = d13_2 * inv;
            self.count = 2;
            self.v[1] = self.v[2];
            return;
        }

        // w2 region
        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.v[1].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[1];
            return;
        }

        // w3 region
        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.v[2].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[2];
            return;
        }

        // e23
        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv = 1.0 / (d23_1 + d23_2);
            self.v[1].a = d23_1 * inv;
            self.v[2].a = d23_2 * inv;
            self.count = 2;
            self.v[0] = self.v[2];
            return;
        }

        // Must be in triangle123
        let inv = 1.0 / (d123_1 + d123_2 + d123_3);
        self.v[0].a = d123_1 * inv;
        self.v[1].a = d123_2 * inv;
        self.v[2].a = d123_3 * inv;
        self.count = 3;
    }
}

/// Closest points between two convex proxies (GJK).
///
/// The simplex is seeded from `cache` and written back on exit so the next
/// call for the same pair starts warm. The loop ends when the origin is
/// enclosed, the search direction degenerates, a support pair repeats, or
/// [`GJK_MAX_ITERATIONS`] is reached. With `use_radii` the witness points are
/// moved onto the rounded surfaces; overlapping rounded shapes report a
/// distance of 0 and a shared midpoint.
pub fn distance(cache: &mut SimplexCache, input: &DistanceInput) -> DistanceOutput {
    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;
    let xf_a = &input.transform_a;
    let xf_b = &input.transform_b;

    let mut simplex = Simplex::from_cache(cache, input);

    let mut save_a = [0_usize; 3];
    let mut save_b = [0_usize; 3];

    let mut iterations = 0;
    while iterations < GJK_MAX_ITERATIONS {
        // Remember the simplex so duplicates can be detected.
        let save_count = simplex.count;
        for i in 0..save_count {
            save_a[i] = simplex.v[i].index_a;
            save_b[i] = simplex.v[i].index_b;
        }

        match simplex.count {
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => {}
        }

        // The origin is inside the triangle.
        if simplex.count == 3 {
            break;
        }

        let d = simplex.search_direction();

        // The origin is probably on the simplex; a new support point would
        // not be trustworthy.
        if d.length_squared() < EPSILON * EPSILON {
            break;
        }

        let index_a = proxy_a.support(xf_a.q.apply_inverse(-d));
        let index_b = proxy_b.support(xf_b.q.apply_inverse(d));
        simplex.v[simplex.count] = SimplexVertex::new(input, index_a, index_b);

        iterations += 1;

        // Repeated support pair: no further progress is possible.
        let duplicate = (0..save_count).any(|i| index_a == save_a[i] && index_b == save_b[i]);
        if duplicate {
            break;
        }

        simplex.count += 1;
    }

    if iterations == GJK_MAX_ITERATIONS {
        debug!(iterations, "gjk reached its iteration cap");
    }

    let (mut point_a, mut point_b) = simplex.witness_points();
    let mut distance = point_a.distance(point_b);
    simplex.write_cache(cache);

    if input.use_radii {
        let r_a = proxy_a.radius;
        let r_b = proxy_b.radius;

        if distance > r_a + r_b && distance > EPSILON {
            // Shapes are still separated; move the witness points onto the
            // rounded surfaces.
            distance -= r_a + r_b;
            let normal = (point_b - point_a).normalize();
            point_a += normal * r_a;
            point_b -= normal * r_b;
        } else {
            // Rounded shapes overlap; report the midpoint.
            let p = (point_a + point_b) * 0.5;
            point_a = p;
            point_b = p;
            distance = 0.0;
        }
    }

    DistanceOutput {
        point_a,
        point_b,
        distance,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::shapes::{Circle, Polygon};

    fn circle_proxy(r: f32) -> DistanceProxy {
        DistanceProxy::from_shape(&Shape::Circle(Circle::new(Vec2::ZERO, r)), 0)
    }

    #[test]
    fn support_picks_extreme_vertex() {
        let poly = Shape::Polygon(Polygon::new_box(1.0, 2.0));
        let proxy = DistanceProxy::from_shape(&poly, 0);
        assert_eq!(proxy.vertex_count(), 4);
        assert_eq!(proxy.support_vertex(Vec2::new(1.0, 1.0)), Vec2::new(1.0, 2.0));
        assert_eq!(proxy.support_vertex(Vec2::new(-1.0, -0.1)), Vec2::new(-1.0, -2.0));
    }

    #[test]
    fn from_points_rejects_empty_and_oversized() {
        assert!(DistanceProxy::from_points(&[], 0.0).is_none());
        assert!(DistanceProxy::from_points(&[Vec2::ZERO; MAX_POLYGON_VERTICES + 1], 0.0).is_none());
        let p = DistanceProxy::from_points(&[Vec2::ZERO, Vec2::UNIT_X], 0.5).unwrap();
        assert_eq!(p.vertex_count(), 2);
        assert_eq!(p.radius(), 0.5);
    }

    #[test]
    fn overlapping_boxes_enclose_origin() {
        let poly = Shape::Polygon(Polygon::new_box(1.0, 1.0));
        let proxy = DistanceProxy::from_shape(&poly, 0);
        let input = DistanceInput {
            proxy_a: proxy,
            proxy_b: proxy,
            transform_a: Transform::IDENTITY,
            transform_b: Transform::from_angle(Vec2::new(0.5, 0.25), 0.3),
            use_radii: false,
        };
        let mut cache = SimplexCache::default();
        let out = distance(&mut cache, &input);
        assert!(out.distance < 1e-5);
        assert_eq!(cache.count, 3);
    }

    #[test]
    fn cache_is_rewritten_each_call() {
        let input = DistanceInput {
            proxy_a: circle_proxy(1.0),
            proxy_b: circle_proxy(1.0),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::from_angle(Vec2::new(5.0, 0.0), 0.0),
            use_radii: false,
        };
        let mut cache = SimplexCache::default();
        let out = distance(&mut cache, &input);
        assert!((out.distance - 5.0).abs() < 1e-6);
        assert_eq!(cache.count, 1);
        assert_eq!(cache.metric, 0.0);
    }

    fn box_over_point() -> DistanceInput {
        DistanceInput {
            proxy_a: DistanceProxy::from_shape(&Shape::Polygon(Polygon::new_box(1.0, 0.5)), 0),
            proxy_b: circle_proxy(0.1),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::from_angle(Vec2::new(0.0, 2.0), 0.0),
            use_radii: false,
        }
    }

    #[test]
    fn matching_cache_seeds_the_simplex() {
        let input = box_over_point();
        let mut cache = SimplexCache::default();
        distance(&mut cache, &input);
        assert_eq!(cache.count, 2);

        let simplex = Simplex::from_cache(&cache, &input);
        assert_eq!(simplex.count, 2);
        assert_eq!(simplex.v[0].index_a, cache.index_a[0]);
        assert_eq!(simplex.v[1].index_a, cache.index_a[1]);
    }

    #[test]
    fn stale_cache_falls_back_to_first_vertices() {
        let input = box_over_point();

        // Stored metric far larger than the one the indices now produce.
        let shrunk = SimplexCache {
            metric: 100.0,
            count: 2,
            index_a: [2, 3, 0],
            index_b: [0, 0, 0],
        };
        // Both cached vertices coincide.
        let collapsed = SimplexCache {
            metric: 0.0,
            count: 2,
            index_a: [1, 1, 0],
            index_b: [0, 0, 0],
        };

        for stale in [shrunk, collapsed] {
            let simplex = Simplex::from_cache(&stale, &input);
            assert_eq!(simplex.count, 1);
            assert_eq!((simplex.v[0].index_a, simplex.v[0].index_b), (0, 0));
            assert_eq!(simplex.v[0].a, 1.0);

            let mut warm = stale;
            let mut cold = SimplexCache::default();
            assert_eq!(distance(&mut warm, &input), distance(&mut cold, &input));
            assert_eq!(warm, cold);
            assert_eq!(warm.metric, 2.0);
        }
    }

    #[test]
    fn chain_proxy_uses_the_child_segment() {
        let chain = crate::shapes::Chain::new_loop(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap();
        let last = chain.child_count() - 1;
        let proxy = DistanceProxy::from_shape(&Shape::Chain(chain.clone()), last);
        let edge = chain.child_edge(last);
        assert_eq!(proxy.vertices(), &[edge.v1, edge.v2]);
        assert_eq!(proxy.vertex(1), Vec2::new(0.0, 0.0));
    }
}
