// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use thiserror::Error;

use crate::math::Transform;
use crate::settings::EPSILON;
use crate::shapes::{Shape, ShapeKind};

use super::collide_circle::{collide_circles, collide_polygon_and_circle};
use super::collide_edge::{collide_edge_and_circle, collide_edge_and_polygon};
use super::collide_polygon::collide_polygons;
use super::distance::{distance, DistanceInput, DistanceProxy, SimplexCache};
use super::manifold::Manifold;

/// Errors from [`collide`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CollideError {
    /// No manifold generator exists for this ordered shape pair.
    #[error("no manifold generator for {a:?} against {b:?}")]
    UnsupportedPair {
        /// Kind of shape A.
        a: ShapeKind,
        /// Kind of shape B.
        b: ShapeKind,
    },
}

/// Whether two shape children overlap, radii included.
///
/// Runs a cold GJK query; the shapes count as overlapping once their
/// rounded distance drops below `10 * EPSILON`.
pub fn test_overlap(
    shape_a: &Shape,
    index_a: usize,
    shape_b: &Shape,
    index_b: usize,
    xf_a: &Transform,
    xf_b: &Transform,
) -> bool {
    let input = DistanceInput {
        proxy_a: DistanceProxy::from_shape(shape_a, index_a),
        proxy_b: DistanceProxy::from_shape(shape_b, index_b),
        transform_a: *xf_a,
        transform_b: *xf_b,
        use_radii: true,
    };
    let mut cache = SimplexCache::default();
    distance(&mut cache, &input).distance < 10.0 * EPSILON
}

/// Fills `manifold` for child `index_a` of `shape_a` against child `index_b`
/// of `shape_b`.
///
/// Shape A must be the "lower" kind of the pair: edges and chains go first
/// against circles and polygons, polygons go first against circles. Chain
/// children are collided as edges carrying their ghost vertices. Any other
/// ordering, or a pair with no generator such as edge against edge, yields
/// [`CollideError::UnsupportedPair`] and leaves `manifold` empty.
pub fn collide(
    manifold: &mut Manifold,
    shape_a: &Shape,
    index_a: usize,
    xf_a: &Transform,
    shape_b: &Shape,
    index_b: usize,
    xf_b: &Transform,
) -> Result<(), CollideError> {
    debug_assert!(index_b < shape_b.child_count());
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(manifold, a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Circle(b)) => {
            collide_polygon_and_circle(manifold, a, xf_a, b, xf_b);
        }
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(manifold, a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(manifold, a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Polygon(b)) => {
            collide_edge_and_polygon(manifold, a, xf_a, b, xf_b);
        }
        (Shape::Chain(chain), Shape::Circle(b)) => {
            let edge = chain.child_edge(index_a);
            collide_edge_and_circle(manifold, &edge, xf_a, b, xf_b);
        }
        (Shape::Chain(chain), Shape::Polygon(b)) => {
            let edge = chain.child_edge(index_a);
            collide_edge_and_polygon(manifold, &edge, xf_a, b, xf_b);
        }
        _ => {
            manifold.clear();
            return Err(CollideError::UnsupportedPair {
                a: shape_a.kind(),
                b: shape_b.kind(),
            });
        }
    }
    Ok(())
}
