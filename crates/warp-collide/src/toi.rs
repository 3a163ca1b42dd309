// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Time of impact by conservative advancement.
//!
//! Given two convex proxies moving along [`Sweep`]s, find the earliest
//! normalized time at which their separation drops to a small target just
//! above contact. The target is deliberately short of exact contact so the
//! discrete solver has room to resolve the remaining gap.
//!
//! Each outer iteration runs GJK at the current time `t1`, builds a
//! separating axis from the simplex cache, then pushes `t2` back from the end
//! of the sweep until the deepest points along that axis sit at the target.
//! Roots are found with alternating bisection and secant steps.

use tracing::{debug, instrument};

use crate::math::{cross_vs, Sweep, Transform, Vec2};
use crate::narrow::distance::{distance, DistanceInput, DistanceProxy, SimplexCache};
use crate::settings::{LINEAR_SLOP, MAX_POLYGON_VERTICES};

/// Input to [`time_of_impact`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ToiInput {
    /// Shape A.
    pub proxy_a: DistanceProxy,
    /// Shape B.
    pub proxy_b: DistanceProxy,
    /// Motion of A.
    pub sweep_a: Sweep,
    /// Motion of B.
    pub sweep_b: Sweep,
    /// Upper bound of the search interval, usually 1.
    pub t_max: f32,
}

/// Outcome of a time-of-impact query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToiState {
    /// Not yet determined.
    #[default]
    Unknown,
    /// The solver could not converge; `t` is the last safe time.
    Failed,
    /// The shapes already overlap at the start; `t` is 0.
    Overlapped,
    /// The shapes reach the target separation at `t`.
    Touching,
    /// The shapes stay apart for the whole interval; `t` is `t_max`.
    Separated,
}

/// Result of [`time_of_impact`].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ToiOutput {
    /// Final classification.
    pub state: ToiState,
    /// Time of impact, in `[0, t_max]`.
    pub t: f32,
    /// Outer iterations used.
    pub iterations: usize,
    /// Largest number of root-finder iterations in any push-back step.
    pub root_iterations: usize,
}

/// Iteration limits for [`time_of_impact_with`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ToiConfig {
    /// Cap on outer (separating-axis) iterations.
    pub max_iterations: usize,
    /// Cap on root-finder iterations per push-back step.
    pub max_root_iterations: usize,
}

impl Default for ToiConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_root_iterations: 50,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SeparationKind {
    Points,
    FaceA,
    FaceB,
}

/// Separation of two proxies along a fixed axis as a function of time.
struct SeparationFunction<'a> {
    proxy_a: &'a DistanceProxy,
    proxy_b: &'a DistanceProxy,
    sweep_a: Sweep,
    sweep_b: Sweep,
    kind: SeparationKind,
    /// Face midpoint for the face kinds, in the owning proxy's frame.
    local_point: Vec2,
    /// World axis for `Points`, local face normal otherwise.
    axis: Vec2,
}

impl<'a> SeparationFunction<'a> {
    /// Builds the axis from the GJK simplex left in `cache` at time `t1`.
    fn new(
        cache: &SimplexCache,
        proxy_a: &'a DistanceProxy,
        sweep_a: Sweep,
        proxy_b: &'a DistanceProxy,
        sweep_b: Sweep,
        t1: f32,
    ) -> Self {
        debug_assert!(0 < cache.count && cache.count < 3);
        let xf_a = sweep_a.transform_at(t1);
        let xf_b = sweep_b.transform_at(t1);

        let mut f = Self {
            proxy_a,
            proxy_b,
            sweep_a,
            sweep_b,
            kind: SeparationKind::Points,
            local_point: Vec2::ZERO,
            axis: Vec2::ZERO,
        };

        if cache.count == 1 {
            let point_a = xf_a.apply(proxy_a.vertex(cache.index_a[0]));
            let point_b = xf_b.apply(proxy_b.vertex(cache.index_b[0]));
            f.axis = (point_b - point_a).normalize();
        } else if cache.index_a[0] == cache.index_a[1] {
            // Two points on B and one on A.
            f.kind = SeparationKind::FaceB;
            let b1 = proxy_b.vertex(cache.index_b[0]);
            let b2 = proxy_b.vertex(cache.index_b[1]);
            f.axis = cross_vs(b2 - b1, 1.0).normalize();
            f.local_point = (b1 + b2) * 0.5;
            let normal = xf_b.q.apply(f.axis);
            let point_b = xf_b.apply(f.local_point);
            let point_a = xf_a.apply(proxy_a.vertex(cache.index_a[0]));
            if (point_a - point_b).dot(normal) < 0.0 {
                f.axis = -f.axis;
            }
        } else {
            // Two points on A and one or two points on B.
            f.kind = SeparationKind::FaceA;
            let a1 = proxy_a.vertex(cache.index_a[0]);
            let a2 = proxy_a.vertex(cache.index_a[1]);
            f.axis = cross_vs(a2 - a1, 1.0).normalize();
            f.local_point = (a1 + a2) * 0.5;
            let normal = xf_a.q.apply(f.axis);
            let point_a = xf_a.apply(f.local_point);
            let point_b = xf_b.apply(proxy_b.vertex(cache.index_b[0]));
            if (point_b - point_a).dot(normal) < 0.0 {
                f.axis = -f.axis;
            }
        }
        f
    }

    fn transforms(&self, t: f32) -> (Transform, Transform) {
        (self.sweep_a.transform_at(t), self.sweep_b.transform_at(t))
    }

    /// Deepest pair of points along the axis at `t`: `(separation, index_a,
    /// index_b)`. The face side's index is unused and reported as 0.
    fn find_min_separation(&self, t: f32) -> (f32, usize, usize) {
        let (xf_a, xf_b) = self.transforms(t);
        match self.kind {
            SeparationKind::Points => {
                let index_a = self.proxy_a.support(xf_a.q.apply_inverse(self.axis));
                let index_b = self.proxy_b.support(xf_b.q.apply_inverse(-self.axis));
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                ((point_b - point_a).dot(self.axis), index_a, index_b)
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);
                let index_b = self.proxy_b.support(xf_b.q.apply_inverse(-normal));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                ((point_b - point_a).dot(normal), 0, index_b)
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);
                let index_a = self.proxy_a.support(xf_a.q.apply_inverse(-normal));
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                ((point_a - point_b).dot(normal), index_a, 0)
            }
        }
    }

    /// Separation of a fixed witness pair at `t`.
    fn evaluate(&self, index_a: usize, index_b: usize, t: f32) -> f32 {
        let (xf_a, xf_b) = self.transforms(t);
        match self.kind {
            SeparationKind::Points => {
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(self.axis)
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(normal)
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                (point_a - point_b).dot(normal)
            }
        }
    }
}

/// Time of impact with the default iteration limits.
pub fn time_of_impact(input: &ToiInput) -> ToiOutput {
    time_of_impact_with(input, &ToiConfig::default())
}

/// Time of impact with explicit iteration limits.
///
/// Rotation is interpolated linearly, so fast spinners may tunnel through
/// thin features; the result is still conservative for the sampled motion.
#[instrument(level = "trace", skip_all, fields(t_max = input.t_max))]
pub fn time_of_impact_with(input: &ToiInput, config: &ToiConfig) -> ToiOutput {
    let mut output = ToiOutput {
        state: ToiState::Unknown,
        t: input.t_max,
        iterations: 0,
        root_iterations: 0,
    };

    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;

    // Large rotations can make the root finder fail.
    let mut sweep_a = input.sweep_a;
    let mut sweep_b = input.sweep_b;
    sweep_a.normalize();
    sweep_b.normalize();

    let t_max = input.t_max;
    let total_radius = proxy_a.radius() + proxy_b.radius();
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    let mut t1 = 0.0_f32;
    let mut cache = SimplexCache::default();

    loop {
        let distance_input = DistanceInput {
            proxy_a: *proxy_a,
            proxy_b: *proxy_b,
            transform_a: sweep_a.transform_at(t1),
            transform_b: sweep_b.transform_at(t1),
            use_radii: false,
        };
        let distance_output = distance(&mut cache, &distance_input);

        // Already overlapping: continuous collision cannot help.
        if distance_output.distance <= 0.0 {
            output.state = ToiState::Overlapped;
            output.t = 0.0;
            break;
        }

        if distance_output.distance < target + tolerance {
            output.state = ToiState::Touching;
            output.t = t1;
            break;
        }

        let f = SeparationFunction::new(&cache, proxy_a, sweep_a, proxy_b, sweep_b, t1);

        // Resolve the deepest point on the axis, one vertex at a time.
        let mut done = false;
        let mut t2 = t_max;
        for _ in 0..MAX_POLYGON_VERTICES {
            let (mut s2, index_a, index_b) = f.find_min_separation(t2);

            // Separated for the whole remaining interval.
            if s2 > target + tolerance {
                output.state = ToiState::Separated;
                output.t = t_max;
                done = true;
                break;
            }

            // Reached the target: advance the sweeps.
            if s2 > target - tolerance {
                t1 = t2;
                break;
            }

            let mut s1 = f.evaluate(index_a, index_b, t1);

            // Started inside the target band; the root finder ran out of
            // iterations on an earlier pass.
            if s1 < target - tolerance {
                output.state = ToiState::Failed;
                output.t = t1;
                done = true;
                break;
            }

            if s1 <= target + tolerance {
                output.state = ToiState::Touching;
                output.t = t1;
                done = true;
                break;
            }

            // Root of s(t) - target on [a1, a2].
            let mut root_iterations = 0;
            let mut a1 = t1;
            let mut a2 = t2;
            loop {
                let t = if root_iterations % 2 == 1 {
                    // Secant for convergence speed.
                    a1 + (target - s1) * (a2 - a1) / (s2 - s1)
                } else {
                    // Bisection for guaranteed progress.
                    0.5 * (a1 + a2)
                };
                root_iterations += 1;

                let s = f.evaluate(index_a, index_b, t);
                if (s - target).abs() < tolerance {
                    t2 = t;
                    break;
                }

                // Keep the root bracketed.
                if s > target {
                    a1 = t;
                    s1 = s;
                } else {
                    a2 = t;
                    s2 = s;
                }

                if root_iterations == config.max_root_iterations {
                    debug!(t1, t2, "toi root finder reached its iteration cap");
                    break;
                }
            }
            output.root_iterations = output.root_iterations.max(root_iterations);
        }

        output.iterations += 1;
        if done {
            break;
        }

        if output.iterations == config.max_iterations {
            // Stuck on the axis search; report the last safe time.
            debug!(t1, iterations = output.iterations, "toi failed to converge");
            output.state = ToiState::Failed;
            output.t = t1;
            break;
        }
    }

    output
}
