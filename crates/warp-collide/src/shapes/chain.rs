// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use super::{Edge, ShapeError};
use crate::math::{Transform, Vec2};
use crate::settings::{LINEAR_SLOP, POLYGON_RADIUS};
use crate::types::aabb::Aabb;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Polyline or closed loop of edges with smooth connectivity.
///
/// Child `i` is the segment from vertex `i` to vertex `i + 1`. Loops repeat
/// the first vertex at the end so every segment is explicit. Chains carry no
/// interior; use them for static terrain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain {
    vertices: Vec<Vec2>,
    prev_vertex: Option<Vec2>,
    next_vertex: Option<Vec2>,
}

impl Chain {
    /// Closed loop through `vertices` (at least three). The closing segment
    /// is added automatically and the ends are connected to each other.
    pub fn new_loop(vertices: &[Vec2]) -> Result<Self, ShapeError> {
        check_vertices(vertices, 3)?;
        let mut vs = Vec::with_capacity(vertices.len() + 1);
        vs.extend_from_slice(vertices);
        vs.push(vertices[0]);
        Ok(Self {
            prev_vertex: Some(vs[vs.len() - 2]),
            next_vertex: Some(vs[1]),
            vertices: vs,
        })
    }

    /// Open chain through `vertices` (at least two) with isolated ends.
    pub fn new_chain(vertices: &[Vec2]) -> Result<Self, ShapeError> {
        check_vertices(vertices, 2)?;
        Ok(Self {
            vertices: vertices.to_vec(),
            prev_vertex: None,
            next_vertex: None,
        })
    }

    /// Connects the first vertex to a preceding ghost vertex. Not meaningful
    /// for loops.
    #[must_use]
    pub const fn with_prev_vertex(mut self, v: Vec2) -> Self {
        self.prev_vertex = Some(v);
        self
    }

    /// Connects the last vertex to a following ghost vertex. Not meaningful
    /// for loops.
    #[must_use]
    pub const fn with_next_vertex(mut self, v: Vec2) -> Self {
        self.next_vertex = Some(v);
        self
    }

    /// Chain vertices (loops include the repeated first vertex).
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Number of segments.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Skin radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        POLYGON_RADIUS
    }

    /// Segment `index` as an edge, with ghost vertices taken from the
    /// neighbouring segments or the chain's end connectivity.
    ///
    /// # Panics
    /// Panics if `index >= child_count()`.
    #[must_use]
    pub fn child_edge(&self, index: usize) -> Edge {
        let vs = &self.vertices;
        assert!(index + 1 < vs.len(), "chain child {index} out of range");
        Edge {
            v0: if index > 0 {
                Some(vs[index - 1])
            } else {
                self.prev_vertex
            },
            v1: vs[index],
            v2: vs[index + 1],
            v3: if index + 2 < vs.len() {
                Some(vs[index + 2])
            } else {
                self.next_vertex
            },
        }
    }

    pub(crate) fn compute_aabb(&self, xf: &Transform, index: usize) -> Aabb {
        self.child_edge(index).compute_aabb(xf)
    }

    pub(crate) fn ray_cast(
        &self,
        input: &RayCastInput,
        xf: &Transform,
        index: usize,
    ) -> Option<RayCastOutput> {
        Edge::new(self.vertices[index], self.vertices[index + 1]).ray_cast(input, xf)
    }
}

fn check_vertices(vertices: &[Vec2], min: usize) -> Result<(), ShapeError> {
    if vertices.len() < min {
        return Err(ShapeError::TooFewVertices {
            shape: "chain",
            min,
            got: vertices.len(),
        });
    }
    for (i, pair) in vertices.windows(2).enumerate() {
        if pair[0].distance_squared(pair[1]) <= LINEAR_SLOP * LINEAR_SLOP {
            return Err(ShapeError::VerticesTooClose {
                first: i,
                second: i + 1,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn square() -> [Vec2; 4] {
        [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn loop_children_wrap_ghosts() {
        let chain = Chain::new_loop(&square()).unwrap();
        assert_eq!(chain.child_count(), 4);
        let first = chain.child_edge(0);
        assert_eq!(first.v0, Some(Vec2::new(0.0, 1.0)));
        assert_eq!(first.v3, Some(Vec2::new(1.0, 1.0)));
        let last = chain.child_edge(3);
        assert_eq!(last.v1, Vec2::new(0.0, 1.0));
        assert_eq!(last.v2, Vec2::new(0.0, 0.0));
        assert_eq!(last.v3, Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn open_chain_ends_are_isolated_until_connected() {
        let chain = Chain::new_chain(&square()).unwrap();
        assert_eq!(chain.child_count(), 3);
        assert_eq!(chain.child_edge(0).v0, None);
        assert_eq!(chain.child_edge(2).v3, None);

        let linked = chain.with_prev_vertex(Vec2::new(-1.0, 0.0));
        assert_eq!(linked.child_edge(0).v0, Some(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn rejects_short_or_crowded_input() {
        assert!(matches!(
            Chain::new_loop(&square()[..2]),
            Err(ShapeError::TooFewVertices { min: 3, .. })
        ));
        let crowded = [Vec2::ZERO, Vec2::new(0.001, 0.0), Vec2::new(1.0, 0.0)];
        assert_eq!(
            Chain::new_chain(&crowded),
            Err(ShapeError::VerticesTooClose { first: 0, second: 1 })
        );
    }
}
