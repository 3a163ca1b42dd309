// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use super::{Rot, Vec2};

/// Rigid transform: rotation followed by translation.
///
/// Shapes are defined in body-local coordinates and placed in the world by a
/// `Transform`. There is no scale; collision geometry is rigid.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Translation (world position of the local origin).
    pub p: Vec2,
    /// Rotation.
    pub q: Rot,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    /// Creates a transform from a position and rotation.
    pub const fn new(p: Vec2, q: Rot) -> Self {
        Self { p, q }
    }

    /// Creates a transform from a position and an angle in radians.
    pub fn from_angle(p: Vec2, angle: f32) -> Self {
        Self::new(p, Rot::from_angle(angle))
    }

    /// Maps a local point into the parent frame.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Maps a parent-frame point into the local frame.
    pub fn apply_inverse(&self, v: Vec2) -> Vec2 {
        self.q.apply_inverse(v - self.p)
    }

    /// Composition `self * other`.
    pub fn times(&self, other: &Self) -> Self {
        Self {
            q: self.q.times(other.q),
            p: self.q.apply(other.p) + self.p,
        }
    }

    /// Relative transform `self^-1 * other`, i.e. `other` expressed in the
    /// frame of `self`.
    pub fn inv_times(&self, other: &Self) -> Self {
        Self {
            q: self.q.inv_times(other.q),
            p: self.q.apply_inverse(other.p - self.p),
        }
    }
}
