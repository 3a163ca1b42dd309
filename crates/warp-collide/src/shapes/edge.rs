// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Transform, Vec2};
use crate::settings::POLYGON_RADIUS;
use crate::types::aabb::Aabb;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Line segment from `v1` to `v2`.
///
/// The optional ghost vertices `v0` (before `v1`) and `v3` (after `v2`) describe
/// neighbouring segments. Collision uses them to suppress contacts on
/// internal corners of a smooth surface.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Ghost vertex preceding `v1`.
    pub v0: Option<Vec2>,
    /// Segment start.
    pub v1: Vec2,
    /// Segment end.
    pub v2: Vec2,
    /// Ghost vertex following `v2`.
    pub v3: Option<Vec2>,
}

impl Edge {
    /// Isolated segment with no neighbours.
    pub const fn new(v1: Vec2, v2: Vec2) -> Self {
        Self {
            v0: None,
            v1,
            v2,
            v3: None,
        }
    }

    /// Sets the ghost vertex before `v1`.
    #[must_use]
    pub const fn with_v0(mut self, v0: Vec2) -> Self {
        self.v0 = Some(v0);
        self
    }

    /// Sets the ghost vertex after `v2`.
    #[must_use]
    pub const fn with_v3(mut self, v3: Vec2) -> Self {
        self.v3 = Some(v3);
        self
    }

    /// Skin radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        POLYGON_RADIUS
    }

    pub(crate) fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let v1 = xf.apply(self.v1);
        let v2 = xf.apply(self.v2);
        Aabb::new(v1.min(v2), v1.max(v2)).extended(self.radius())
    }

    // Two-sided: the returned normal faces the ray origin.
    pub(crate) fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let p1 = xf.q.apply_inverse(input.p1 - xf.p);
        let p2 = xf.q.apply_inverse(input.p2 - xf.p);
        let d = p2 - p1;

        let e = self.v2 - self.v1;
        let normal = Vec2::new(e.y, -e.x).normalize();

        // dot(normal, p1 + t d - v1) = 0
        let numerator = normal.dot(self.v1 - p1);
        let denominator = normal.dot(d);
        if denominator == 0.0 {
            return None;
        }

        let t = numerator / denominator;
        if t < 0.0 || input.max_fraction < t {
            return None;
        }

        let q = p1 + d * t;
        let rr = e.length_squared();
        if rr == 0.0 {
            return None;
        }
        let s = (q - self.v1).dot(e) / rr;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let world_normal = xf.q.apply(normal);
        Some(RayCastOutput {
            normal: if numerator > 0.0 {
                -world_normal
            } else {
                world_normal
            },
            fraction: t,
        })
    }
}
