// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! warp-collide: 2D collision core for Echo.
//!
//! This crate provides:
//! - A dynamic AABB tree with fattened leaves and AVL-style rebalancing, and
//!   a broad phase that turns moved proxies into deduplicated candidate pairs.
//! - GJK closest-point queries with a caller-owned warm-start cache.
//! - Contact manifold generators for circles, polygons, edges and chains,
//!   built on separating axes and Sutherland-Hodgman clipping.
//! - Conservative-advancement time of impact for continuous collision.
//!
//! Design notes:
//! - Deterministic: no ambient RNG or global counters; diagnostics are
//!   returned in output structs.
//! - Float32 throughout, with tolerances centralised in [`settings`].
//! - Geometric queries never fail. No contact is an empty manifold; solver
//!   outcomes are state enums.
#![forbid(unsafe_code)]

/// Broad phase: dynamic AABB tree and pair management.
pub mod broad;
/// Deterministic 2D math (Vec2, Rot, Transform, Sweep, PRNG).
pub mod math;
pub mod narrow;
pub mod settings;
pub mod shapes;
pub mod toi;
/// Bounding boxes and ray-cast records.
pub mod types;

pub use broad::broad_phase::{BroadPhase, Pair};
pub use broad::dynamic_tree::{DynamicTree, ProxyId, TreeConfig, TreeError};
pub use math::{Rot, Sweep, Transform, Vec2};
pub use narrow::{
    clip_segment_to_line, collide, collide_circles, collide_edge_and_circle,
    collide_edge_and_polygon, collide_polygon_and_circle, collide_polygons, distance,
    test_overlap, CollideError, ContactFeature, DistanceInput, DistanceOutput, DistanceProxy,
    Manifold, ManifoldType, SimplexCache, WorldManifold,
};
pub use shapes::{Chain, Circle, Edge, Polygon, Shape, ShapeError, ShapeKind};
pub use toi::{time_of_impact, time_of_impact_with, ToiConfig, ToiInput, ToiOutput, ToiState};
pub use types::aabb::Aabb;
pub use types::ray::{RayCastInput, RayCastOutput};
