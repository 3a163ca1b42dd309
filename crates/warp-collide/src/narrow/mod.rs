// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Narrow phase: exact queries on pairs of shape children.
//!
//! - [`distance`]: GJK closest points with a caller-owned warm-start cache.
//! - [`manifold`]: contact manifolds, feature ids, world-space resolution.
//! - [`clip`]: single-plane segment clipping used by the polygon and edge
//!   generators.
//! - `collide_*`: one manifold generator per supported shape pair.
//! - [`overlap`]: boolean overlap and the shape-pair dispatcher.
//!
//! Generators always overwrite the manifold they are given. No contact is an
//! empty manifold, never an error.

#[doc = "Segment clipping against a half-plane."]
pub mod clip;
#[doc = "Circle/circle and polygon/circle manifolds."]
pub mod collide_circle;
#[doc = "Edge/circle and edge/polygon manifolds, including chain children."]
pub mod collide_edge;
#[doc = "Polygon/polygon manifolds."]
pub mod collide_polygon;
#[doc = "GJK distance between convex proxies."]
pub mod distance;
#[doc = "Contact manifolds and feature ids."]
pub mod manifold;
#[doc = "Boolean overlap and the shape-pair dispatcher."]
pub mod overlap;

pub use clip::{clip_segment_to_line, ClipOutput, ClipVertex};
pub use collide_circle::{collide_circles, collide_polygon_and_circle};
pub use collide_edge::{collide_edge_and_circle, collide_edge_and_polygon};
pub use collide_polygon::collide_polygons;
pub use distance::{distance, DistanceInput, DistanceOutput, DistanceProxy, SimplexCache};
pub use manifold::{
    point_states, ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType, PointState,
    WorldManifold,
};
pub use overlap::{collide, test_overlap, CollideError};
