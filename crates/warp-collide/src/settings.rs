// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine-wide tolerances shared by the broad and narrow phase.
//!
//! Lengths are in metres and angles in radians. These values are tuned for
//! objects between roughly 0.1 and 10 metres; changing them shifts contact
//! behaviour everywhere, so treat them as part of the physics contract.

use core::f32::consts::PI;

/// Maximum number of contact points between two convex shapes.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices on a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Margin added to every leaf AABB in the dynamic tree so small motions do not
/// trigger re-insertion.
pub const AABB_EXTENSION: f32 = 0.1;

/// Scale applied to the predicted displacement when a moved proxy's fat AABB
/// is extended along its direction of travel.
pub const AABB_MULTIPLIER: f32 = 2.0;

/// Collision and constraint tolerance. Chosen to be numerically significant
/// but visually insignificant.
pub const LINEAR_SLOP: f32 = 0.005;

/// Angular counterpart of [`LINEAR_SLOP`] (two degrees).
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * PI;

/// Skin radius carried by polygons and edges.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Largest position correction the solver applies in one step. Collision code
/// does not use it; it is published here so collaborators share one value.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Machine epsilon for `f32`.
pub const EPSILON: f32 = f32::EPSILON;
