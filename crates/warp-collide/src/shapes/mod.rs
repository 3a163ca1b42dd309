// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collision shapes in body-local coordinates.
//!
//! Shapes form a closed set, so they are an enum rather than a trait object.
//! Every shape exposes one or more *children*: circles, polygons and edges
//! have exactly one, chains have one per segment. Broad-phase proxies and
//! distance proxies are built per child.

mod chain;
mod circle;
mod edge;
mod polygon;

pub use chain::Chain;
pub use circle::Circle;
pub use edge::Edge;
pub use polygon::Polygon;

use thiserror::Error;

use crate::math::{Transform, Vec2};
use crate::types::aabb::Aabb;
use crate::types::ray::{RayCastInput, RayCastOutput};

/// Errors raised while building shapes from caller-supplied vertices.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    /// Fewer vertices than the shape needs.
    #[error("{shape} needs at least {min} vertices, got {got}")]
    TooFewVertices {
        /// Shape being built.
        shape: &'static str,
        /// Minimum vertex count.
        min: usize,
        /// Vertices supplied.
        got: usize,
    },
    /// More vertices than a polygon can hold.
    #[error("polygon supports at most {max} vertices, got {got}")]
    TooManyVertices {
        /// Maximum vertex count.
        max: usize,
        /// Vertices supplied.
        got: usize,
    },
    /// Points are collinear, coincident, or enclose no area after welding.
    #[error("points do not form a convex hull with positive area")]
    DegenerateHull,
    /// Two consecutive chain vertices are closer than the linear slop.
    #[error("chain vertices {first} and {second} are closer than the linear slop")]
    VerticesTooClose {
        /// Index of the first vertex.
        first: usize,
        /// Index of the second vertex.
        second: usize,
    },
}

/// Discriminator for [`Shape`] variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    /// Solid circle.
    Circle,
    /// Line segment with optional ghost neighbours.
    Edge,
    /// Convex polygon.
    Polygon,
    /// Polyline or loop of edges.
    Chain,
}

/// A collision shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Solid circle.
    Circle(Circle),
    /// Line segment.
    Edge(Edge),
    /// Convex polygon.
    Polygon(Polygon),
    /// Chain of edges.
    Chain(Chain),
}

impl Shape {
    /// Variant discriminator.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle(_) => ShapeKind::Circle,
            Self::Edge(_) => ShapeKind::Edge,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Chain(_) => ShapeKind::Chain,
        }
    }

    /// Rounding radius added around the core geometry.
    #[must_use]
    pub fn radius(&self) -> f32 {
        match self {
            Self::Circle(c) => c.radius,
            Self::Edge(e) => e.radius(),
            Self::Polygon(p) => p.radius(),
            Self::Chain(c) => c.radius(),
        }
    }

    /// Number of children (segments for chains, otherwise one).
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Chain(c) => c.child_count(),
            _ => 1,
        }
    }

    /// `true` if `p` (world space) is inside the shape. Edges and chains have
    /// no interior.
    #[must_use]
    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        match self {
            Self::Circle(c) => c.test_point(xf, p),
            Self::Polygon(poly) => poly.test_point(xf, p),
            Self::Edge(_) | Self::Chain(_) => false,
        }
    }

    /// World-space bounds of child `child_index`.
    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform, child_index: usize) -> Aabb {
        match self {
            Self::Circle(c) => c.compute_aabb(xf),
            Self::Edge(e) => e.compute_aabb(xf),
            Self::Polygon(p) => p.compute_aabb(xf),
            Self::Chain(c) => c.compute_aabb(xf, child_index),
        }
    }

    /// Casts a world-space ray against child `child_index`.
    #[must_use]
    pub fn ray_cast(
        &self,
        input: &RayCastInput,
        xf: &Transform,
        child_index: usize,
    ) -> Option<RayCastOutput> {
        match self {
            Self::Circle(c) => c.ray_cast(input, xf),
            Self::Edge(e) => e.ray_cast(input, xf),
            Self::Polygon(p) => p.ray_cast(input, xf),
            Self::Chain(c) => c.ray_cast(input, xf, child_index),
        }
    }
}

impl From<Circle> for Shape {
    fn from(value: Circle) -> Self {
        Self::Circle(value)
    }
}

impl From<Edge> for Shape {
    fn from(value: Edge) -> Self {
        Self::Edge(value)
    }
}

impl From<Polygon> for Shape {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

impl From<Chain> for Shape {
    fn from(value: Chain) -> Self {
        Self::Chain(value)
    }
}
