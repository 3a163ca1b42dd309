// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vec2;
use crate::settings::EPSILON;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `lower` components are less than or equal to `upper` components.
/// - Values are `f32` metres.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    lower: Vec2,
    upper: Vec2,
}

impl Aabb {
    /// Degenerate box at the origin.
    pub const ZERO: Self = Self {
        lower: Vec2::ZERO,
        upper: Vec2::ZERO,
    };

    /// Constructs an AABB from its lower and upper corners.
    ///
    /// # Panics
    /// Panics if any component of `lower` is greater than its counterpart in
    /// `upper`.
    #[must_use]
    pub fn new(lower: Vec2, upper: Vec2) -> Self {
        assert!(
            lower.x <= upper.x && lower.y <= upper.y,
            "invalid AABB: lower {lower:?} > upper {upper:?}"
        );
        Self { lower, upper }
    }

    /// Lower (minimum) corner.
    #[must_use]
    pub const fn lower(&self) -> Vec2 {
        self.lower
    }

    /// Upper (maximum) corner.
    #[must_use]
    pub const fn upper(&self) -> Vec2 {
        self.upper
    }

    /// Box centred at `center` with the given half-extents.
    #[must_use]
    pub fn from_center_half_extents(center: Vec2, half: Vec2) -> Self {
        Self::new(center - half, center + half)
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (lower, upper) = rest
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { lower, upper })
    }

    /// `true` when the bounds are ordered and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let d = self.upper - self.lower;
        d.x >= 0.0 && d.y >= 0.0 && self.lower.is_valid() && self.upper.is_valid()
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.lower + self.upper) * 0.5
    }

    /// Half-widths.
    #[must_use]
    pub fn extents(&self) -> Vec2 {
        (self.upper - self.lower) * 0.5
    }

    /// Perimeter; the surface-area heuristic used by the tree.
    #[must_use]
    pub fn perimeter(&self) -> f32 {
        let wx = self.upper.x - self.lower.x;
        let wy = self.upper.y - self.lower.y;
        2.0 * (wx + wy)
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// `true` if `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.lower.x <= other.lower.x
            && self.lower.y <= other.lower.y
            && other.upper.x <= self.upper.x
            && other.upper.y <= self.upper.y
    }

    /// `true` if the boxes overlap; touching faces count.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let d1 = other.lower - self.upper;
        let d2 = self.lower - other.upper;
        !(d1.x > 0.0 || d1.y > 0.0 || d2.x > 0.0 || d2.y > 0.0)
    }

    /// Grows the box by `margin` on every side.
    #[must_use]
    pub fn extended(&self, margin: f32) -> Self {
        let r = Vec2::splat(margin);
        Self {
            lower: self.lower - r,
            upper: self.upper + r,
        }
    }

    /// Grows the box towards `d`: negative components move the lower corner,
    /// positive components move the upper corner.
    #[must_use]
    pub fn swept(&self, d: Vec2) -> Self {
        let mut out = *self;
        if d.x < 0.0 {
            out.lower.x += d.x;
        } else {
            out.upper.x += d.x;
        }
        if d.y < 0.0 {
            out.lower.y += d.y;
        } else {
            out.upper.y += d.y;
        }
        out
    }

    /// Box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            lower: self.lower + offset,
            upper: self.upper + offset,
        }
    }

    /// Slab ray cast. Returns the entry hit, or `None` when the ray misses,
    /// starts inside, or reaches the box beyond `max_fraction`.
    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        let mut tmin = -f32::MAX;
        let mut tmax = f32::MAX;

        let p = input.p1.to_array();
        let d = (input.p2 - input.p1).to_array();
        let lower = self.lower.to_array();
        let upper = self.upper.to_array();
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            if d[axis].abs() < EPSILON {
                // Parallel to this slab.
                if p[axis] < lower[axis] || upper[axis] < p[axis] {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d[axis];
                let mut t1 = (lower[axis] - p[axis]) * inv_d;
                let mut t2 = (upper[axis] - p[axis]) * inv_d;

                // Sign of the normal on the entry face.
                let mut s = -1.0;
                if t1 > t2 {
                    core::mem::swap(&mut t1, &mut t2);
                    s = 1.0;
                }

                if t1 > tmin {
                    normal = if axis == 0 {
                        Vec2::new(s, 0.0)
                    } else {
                        Vec2::new(0.0, s)
                    };
                    tmin = t1;
                }

                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }

        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastOutput {
            normal,
            fraction: tmin,
        })
    }
}
