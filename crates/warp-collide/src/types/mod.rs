// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounding boxes and ray-cast records shared by the tree and the shapes.
//!
//! Overlap is inclusive on faces: touching boxes count as overlapping so
//! resting neighbours do not churn pairs on contact boundaries.

#[doc = "Axis-aligned bounding boxes."]
pub mod aabb;
#[doc = "Ray-cast input and output records."]
pub mod ray;
