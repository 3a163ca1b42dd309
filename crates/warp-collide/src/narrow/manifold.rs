// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Transform, Vec2};
use crate::settings::{EPSILON, MAX_MANIFOLD_POINTS};

/// Kind of feature a contact point was generated from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureType {
    /// A vertex.
    #[default]
    Vertex,
    /// An edge (face).
    Face,
}

impl FeatureType {
    const fn tag(self) -> u32 {
        match self {
            Self::Vertex => 0,
            Self::Face => 1,
        }
    }
}

/// Identifies the pair of features that produced a contact point.
///
/// Stable across frames while the same features stay in contact, which is
/// what lets a solver match points for warm starting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactFeature {
    /// Feature index on shape A.
    pub index_a: u8,
    /// Feature index on shape B.
    pub index_b: u8,
    /// Feature kind on shape A.
    pub type_a: FeatureType,
    /// Feature kind on shape B.
    pub type_b: FeatureType,
}

impl ContactFeature {
    /// Feature pair from its parts.
    pub const fn new(index_a: u8, type_a: FeatureType, index_b: u8, type_b: FeatureType) -> Self {
        Self {
            index_a,
            index_b,
            type_a,
            type_b,
        }
    }

    /// Packs the four fields into one integer key, one byte each.
    #[must_use]
    pub fn key(&self) -> u32 {
        u32::from(self.index_a)
            | (u32::from(self.index_b) << 8)
            | (self.type_a.tag() << 16)
            | (self.type_b.tag() << 24)
    }

    /// Same features with the A and B roles exchanged.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

// Feature indices never exceed MAX_POLYGON_VERTICES.
pub(crate) fn feature_index(index: usize) -> u8 {
    u8::try_from(index).unwrap_or(u8::MAX)
}

/// One contact point of a [`Manifold`].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifoldPoint {
    /// Point in the local frame selected by [`Manifold::kind`].
    pub local_point: Vec2,
    /// Solver warm-start slot; the generators leave it at 0.
    pub normal_impulse: f32,
    /// Solver warm-start slot; the generators leave it at 0.
    pub tangent_impulse: f32,
    /// Features that produced this point.
    pub id: ContactFeature,
}

/// How a [`Manifold`] stores its geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ManifoldType {
    /// `local_point` is A's circle center; the point holds B's center.
    #[default]
    Circles,
    /// Reference face on A: `local_normal`/`local_point` are in A's frame,
    /// points in B's frame.
    FaceA,
    /// Reference face on B: `local_normal`/`local_point` are in B's frame,
    /// points in A's frame.
    FaceB,
}

/// Contact points between two shapes, in local coordinates.
///
/// Local storage keeps the manifold valid while the bodies move a little,
/// so it can be reused for warm starting. An empty manifold means no
/// contact.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Manifold {
    points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    point_count: usize,
    /// Reference face normal; unused for [`ManifoldType::Circles`].
    pub local_normal: Vec2,
    /// Meaning depends on [`Manifold::kind`].
    pub local_point: Vec2,
    /// Storage layout.
    pub kind: ManifoldType,
}

impl Manifold {
    /// Empty manifold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active contact points.
    #[must_use]
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.point_count]
    }

    /// Active contact points, mutable for impulse bookkeeping.
    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points[..self.point_count]
    }

    /// Number of active points.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.point_count
    }

    /// `true` when the shapes are not touching.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Removes all points. The frame fields are left as they were.
    pub fn clear(&mut self) {
        self.point_count = 0;
    }

    pub(crate) fn push_point(&mut self, local_point: Vec2, id: ContactFeature) {
        debug_assert!(self.point_count < MAX_MANIFOLD_POINTS);
        if self.point_count < MAX_MANIFOLD_POINTS {
            self.points[self.point_count] = ManifoldPoint {
                local_point,
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
                id,
            };
            self.point_count += 1;
        }
    }
}

/// A [`Manifold`] resolved into world space.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct WorldManifold {
    /// World normal pointing from A to B.
    pub normal: Vec2,
    /// World contact points, midway between the two surfaces.
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Signed separation per point; negative means penetration.
    pub separations: [f32; MAX_MANIFOLD_POINTS],
    /// Number of valid entries, equal to the manifold's point count.
    pub point_count: usize,
}

impl WorldManifold {
    /// Resolves `manifold` using the shapes' current transforms and radii.
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut out = Self {
            point_count: manifold.point_count(),
            ..Self::default()
        };
        if manifold.is_empty() {
            return out;
        }

        match manifold.kind {
            ManifoldType::Circles => {
                out.normal = Vec2::UNIT_X;
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                if point_a.distance_squared(point_b) > EPSILON * EPSILON {
                    out.normal = (point_b - point_a).normalize();
                }
                let c_a = point_a + out.normal * radius_a;
                let c_b = point_b - out.normal * radius_b;
                out.points[0] = (c_a + c_b) * 0.5;
                out.separations[0] = (c_b - c_a).dot(out.normal);
            }
            ManifoldType::FaceA => {
                out.normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for (i, mp) in manifold.points().iter().enumerate() {
                    let clip_point = xf_b.apply(mp.local_point);
                    let c_a = clip_point
                        + out.normal * (radius_a - (clip_point - plane_point).dot(out.normal));
                    let c_b = clip_point - out.normal * radius_b;
                    out.points[i] = (c_a + c_b) * 0.5;
                    out.separations[i] = (c_b - c_a).dot(out.normal);
                }
            }
            ManifoldType::FaceB => {
                let normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for (i, mp) in manifold.points().iter().enumerate() {
                    let clip_point = xf_a.apply(mp.local_point);
                    let c_b = clip_point
                        + normal * (radius_b - (clip_point - plane_point).dot(normal));
                    let c_a = clip_point - normal * radius_a;
                    out.points[i] = (c_a + c_b) * 0.5;
                    out.separations[i] = (c_a - c_b).dot(normal);
                }
                // Keep the A-to-B convention.
                out.normal = -normal;
            }
        }
        out
    }

    /// Valid world points.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.point_count]
    }
}

/// Lifecycle of a contact point between two manifold updates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PointState {
    /// Slot not in use.
    #[default]
    Null,
    /// Point appeared in the new manifold.
    Add,
    /// Point is present in both.
    Persist,
    /// Point vanished from the old manifold.
    Remove,
}

/// Classifies points by matching [`ContactFeature`]s between an old and a
/// new manifold. Returns `(old_states, new_states)`.
pub fn point_states(
    old: &Manifold,
    new: &Manifold,
) -> (
    [PointState; MAX_MANIFOLD_POINTS],
    [PointState; MAX_MANIFOLD_POINTS],
) {
    let mut old_states = [PointState::Null; MAX_MANIFOLD_POINTS];
    let mut new_states = [PointState::Null; MAX_MANIFOLD_POINTS];

    for (i, p) in old.points().iter().enumerate() {
        old_states[i] = if new.points().iter().any(|q| q.id == p.id) {
            PointState::Persist
        } else {
            PointState::Remove
        };
    }
    for (i, p) in new.points().iter().enumerate() {
        new_states[i] = if old.points().iter().any(|q| q.id == p.id) {
            PointState::Persist
        } else {
            PointState::Add
        };
    }
    (old_states, new_states)
}
