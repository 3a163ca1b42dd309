// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Transform, Vec2};
use crate::settings::EPSILON;
use crate::types::aabb::Aabb;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Solid circle.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle {
    /// Centre in body-local coordinates.
    pub position: Vec2,
    /// Radius in metres; must be non-negative.
    pub radius: f32,
}

impl Circle {
    /// Circle at `position` with `radius`.
    pub const fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }

    pub(crate) fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let center = xf.apply(self.position);
        (p - center).length_squared() <= self.radius * self.radius
    }

    pub(crate) fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let p = xf.apply(self.position);
        Aabb::from_center_half_extents(p, Vec2::splat(self.radius))
    }

    // Solves |s + a r|^2 = radius^2 for the smallest a in [0, max_fraction].
    pub(crate) fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let position = xf.apply(self.position);
        let s = input.p1 - position;
        let b = s.length_squared() - self.radius * self.radius;

        let r = input.p2 - input.p1;
        let c = s.dot(r);
        let rr = r.length_squared();
        let sigma = c * c - rr * b;

        if sigma < 0.0 || rr < EPSILON {
            return None;
        }

        let a = -(c + sigma.sqrt());
        if 0.0 <= a && a <= input.max_fraction * rr {
            let fraction = a / rr;
            return Some(RayCastOutput {
                normal: (s + r * fraction).normalize(),
                fraction,
            });
        }
        None
    }
}
