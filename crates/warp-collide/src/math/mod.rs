// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic 2D math used by the collision core: vectors, rotations,
//! rigid transforms, motion sweeps, and a seeded pseudo-random generator.
//!
//! All arithmetic is `f32`. Transcendentals route through `libm` so the same
//! inputs produce bit-identical rotations on every supported target.

mod prng;
mod rot;
mod sweep;
mod transform;
mod vec2;

pub use prng::Prng;
pub use rot::Rot;
pub use sweep::Sweep;
pub use transform::Transform;
pub use vec2::{cross_sv, cross_vs, Vec2};

