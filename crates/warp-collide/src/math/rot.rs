// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use super::Vec2;

/// 2D rotation stored as sine/cosine.
///
/// Construction from an angle uses `libm` so identical angles yield identical
/// matrices on every target.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rot {
    /// Sine of the angle.
    pub s: f32,
    /// Cosine of the angle.
    pub c: f32,
}

impl Rot {
    /// The identity rotation.
    pub const IDENTITY: Self = Self { s: 0.0, c: 1.0 };

    /// Rotation by `angle` radians (counter-clockwise).
    pub fn from_angle(angle: f32) -> Self {
        Self {
            s: libm::sinf(angle),
            c: libm::cosf(angle),
        }
    }

    /// Angle in radians, in `(-pi, pi]`.
    pub fn angle(self) -> f32 {
        libm::atan2f(self.s, self.c)
    }

    /// Rotated +X axis.
    pub const fn x_axis(self) -> Vec2 {
        Vec2::new(self.c, self.s)
    }

    /// Rotated +Y axis.
    pub const fn y_axis(self) -> Vec2 {
        Vec2::new(-self.s, self.c)
    }

    /// Rotates a vector.
    pub fn apply(self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse-rotates a vector.
    pub fn apply_inverse(self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }

    /// Composition `self * other`: rotate by `other`, then by `self`.
    pub fn times(self, other: Self) -> Self {
        Self {
            s: self.s * other.c + self.c * other.s,
            c: self.c * other.c - self.s * other.s,
        }
    }

    /// Relative rotation `self^T * other`.
    pub fn inv_times(self, other: Self) -> Self {
        Self {
            s: self.c * other.s - self.s * other.c,
            c: self.c * other.c + self.s * other.s,
        }
    }
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}
