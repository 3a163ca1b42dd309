// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vec2;

use super::manifold::{ContactFeature, FeatureType};

/// Segment endpoint carried through clipping together with its feature id.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ClipVertex {
    /// Position.
    pub v: Vec2,
    /// Feature that produced this vertex.
    pub id: ContactFeature,
}

impl ClipVertex {
    /// Vertex at `v` tagged with `id`.
    pub const fn new(v: Vec2, id: ContactFeature) -> Self {
        Self { v, id }
    }
}

/// Result of [`clip_segment_to_line`]: up to two surviving vertices.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ClipOutput {
    /// Surviving vertices; only the first `count` are meaningful.
    pub vertices: [ClipVertex; 2],
    /// Number of surviving vertices, `0..=2`.
    pub count: usize,
}

impl ClipOutput {
    /// Surviving vertices.
    #[must_use]
    pub fn as_slice(&self) -> &[ClipVertex] {
        &self.vertices[..self.count]
    }

    fn push(&mut self, v: ClipVertex) {
        if self.count < 2 {
            self.vertices[self.count] = v;
            self.count += 1;
        }
    }
}

/// Sutherland-Hodgman clip of a segment against the half-plane
/// `dot(normal, p) - offset <= 0`.
///
/// Endpoints inside the half-plane are kept as-is. When the endpoints lie on
/// opposite sides, the crossing point is added with a fresh id: vertex
/// `vertex_index_a` on A against the face `v_in[0]` came from on B.
pub fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: u8,
) -> ClipOutput {
    let mut out = ClipOutput::default();

    let d0 = normal.dot(v_in[0].v) - offset;
    let d1 = normal.dot(v_in[1].v) - offset;

    if d0 <= 0.0 {
        out.push(v_in[0]);
    }
    if d1 <= 0.0 {
        out.push(v_in[1]);
    }

    if d0 * d1 < 0.0 {
        let interp = d0 / (d0 - d1);
        let v = v_in[0].v + (v_in[1].v - v_in[0].v) * interp;
        let id = ContactFeature::new(
            vertex_index_a,
            FeatureType::Vertex,
            v_in[0].id.index_b,
            FeatureType::Face,
        );
        out.push(ClipVertex::new(v, id));
    }

    out
}
