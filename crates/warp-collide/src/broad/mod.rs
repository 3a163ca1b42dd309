// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Broad phase: a dynamic AABB tree and the pair manager built on top of it.
//!
//! Determinism contract:
//! - Pair identity is canonicalized as `(min_id, max_id)`.
//! - `update_pairs` reports pairs in ascending lexicographic order of that
//!   tuple, each at most once per call.
//! - Overlap is inclusive on faces (touching fat AABBs are overlapping).
//! - The tree's insertion heuristic and rotations depend only on input order
//!   and values; no ambient randomness is involved.

#[doc = "Pair management over a dynamic tree."]
pub mod broad_phase;
#[doc = "Self-balancing AABB tree with fattened leaves."]
pub mod dynamic_tree;
