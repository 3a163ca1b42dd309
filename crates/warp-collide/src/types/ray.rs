// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vec2;

/// Ray-cast input. The ray extends from `p1` to `p1 + max_fraction * (p2 - p1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RayCastInput {
    /// Ray origin.
    pub p1: Vec2,
    /// Point defining the ray direction and unit length.
    pub p2: Vec2,
    /// Fraction of `p2 - p1` to test.
    pub max_fraction: f32,
}

impl RayCastInput {
    /// Segment from `p1` to `p2` (`max_fraction = 1`).
    pub const fn segment(p1: Vec2, p2: Vec2) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }

    /// Point along the ray at `fraction`.
    pub fn point_at(&self, fraction: f32) -> Vec2 {
        self.p1 + (self.p2 - self.p1) * fraction
    }
}

/// Ray-cast hit: the surface normal and the hit fraction along the input ray.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RayCastOutput {
    /// Outward surface normal at the hit point.
    pub normal: Vec2,
    /// Hit fraction; the point is `p1 + fraction * (p2 - p1)`.
    pub fraction: f32,
}
