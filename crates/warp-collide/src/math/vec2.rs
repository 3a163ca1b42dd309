// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::settings::EPSILON;

/// 2D column vector in metres.
///
/// Represents either a point or a direction depending on context. Components
/// are public because collision code reads and writes them constantly; use the
/// helpers below for anything beyond component access.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Unit vector along +X.
    pub const UNIT_X: Self = Self::new(1.0, 0.0);

    /// Unit vector along +Y.
    pub const UNIT_Y: Self = Self::new(0.0, 1.0);

    /// Creates a vector from components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `value`.
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Returns the components as an array.
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product).
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Vector length.
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared length; avoids the square root.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Distance to another point.
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Squared distance to another point.
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Returns the unit vector and the original length.
    ///
    /// Vectors shorter than [`EPSILON`] are returned unchanged with a length
    /// of `0.0`, letting callers branch on degeneracy without a division by
    /// zero.
    pub fn normalize_with_length(self) -> (Self, f32) {
        let length = self.length();
        if length < EPSILON {
            return (self, 0.0);
        }
        (self * (1.0 / length), length)
    }

    /// Returns the unit vector, or `self` unchanged when degenerate.
    pub fn normalize(self) -> Self {
        self.normalize_with_length().0
    }

    /// Counter-clockwise perpendicular, `(-y, x)`.
    pub const fn skew(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Componentwise absolute value.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Componentwise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Componentwise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// `true` when both components are finite.
    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation `(1 - t) * self + t * other`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }
}

/// Cross product of a vector and a scalar: `(s * v.y, -s * v.x)`.
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * v.y, -s * v.x)
}

/// Cross product of a scalar and a vector: `(-s * v.y, s * v.x)`.
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

impl From<[f32; 2]> for Vec2 {
    fn from(value: [f32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;
    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn cross_helpers_are_perpendicular() {
        let v = Vec2::new(3.0, -2.0);
        assert_eq!(cross_vs(v, 1.0).dot(v), 0.0);
        assert_eq!(cross_sv(1.0, v).dot(v), 0.0);
        assert_eq!(cross_sv(1.0, v), v.skew());
        assert_eq!(cross_vs(v, 1.0), -v.skew());
    }

    #[test]
    fn degenerate_normalize_reports_zero_length() {
        let tiny = Vec2::new(1.0e-9, 0.0);
        let (n, len) = tiny.normalize_with_length();
        assert_eq!(len, 0.0);
        assert_eq!(n, tiny);

        let (n, len) = Vec2::new(3.0, 4.0).normalize_with_length();
        assert!((len - 5.0).abs() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
