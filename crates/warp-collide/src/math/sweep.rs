// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use core::f32::consts::TAU;

use super::{Rot, Transform, Vec2};

/// Motion of a body over one step, used by time of impact.
///
/// The body's centre of mass moves linearly from `c0` to `c` and its angle
/// from `a0` to `a` as the normalized time goes from `alpha0` to `1`. The
/// shape origin is recovered through `local_center`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sweep {
    /// Centre of mass in body-local coordinates.
    pub local_center: Vec2,
    /// World centre at `alpha0`.
    pub c0: Vec2,
    /// World centre at time 1.
    pub c: Vec2,
    /// Angle at `alpha0`.
    pub a0: f32,
    /// Angle at time 1.
    pub a: f32,
    /// Fraction of the step already consumed, in `[0, 1)`.
    pub alpha0: f32,
}

impl Sweep {
    /// Pure translation from `c0` to `c` with a fixed angle and the centre of
    /// mass at the shape origin.
    pub const fn linear(c0: Vec2, c: Vec2, angle: f32) -> Self {
        Self {
            local_center: Vec2::ZERO,
            c0,
            c,
            a0: angle,
            a: angle,
            alpha0: 0.0,
        }
    }

    /// Interpolated transform at `beta` in `[0, 1]`.
    pub fn transform_at(&self, beta: f32) -> Transform {
        let center = self.c0 * (1.0 - beta) + self.c * beta;
        let angle = (1.0 - beta) * self.a0 + beta * self.a;
        let q = Rot::from_angle(angle);
        Transform::new(center - q.apply(self.local_center), q)
    }

    /// Advances the start of the sweep to `alpha`, keeping the end fixed.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0, "sweep already fully consumed");
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += (self.c - self.c0) * beta;
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }

    /// Shifts both angles by a multiple of 2π so `a0` lies in `[0, 2π)`.
    pub fn normalize(&mut self) {
        let d = TAU * libm::floorf(self.a0 / TAU);
        self.a0 -= d;
        self.a -= d;
    }
}
