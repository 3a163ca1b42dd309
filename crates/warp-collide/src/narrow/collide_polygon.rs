// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{cross_vs, Transform};
use crate::settings::LINEAR_SLOP;
use crate::shapes::Polygon;

use super::clip::{clip_segment_to_line, ClipVertex};
use super::manifold::{feature_index, ContactFeature, FeatureType, Manifold, ManifoldType};

/// Axis B must beat axis A by this much to become the reference face.
const REFERENCE_FACE_TOLERANCE: f32 = 0.1 * LINEAR_SLOP;

/// Largest separation of `poly2` along the face normals of `poly1`.
///
/// Returns `(separation, edge_index)`. Brute force over every edge pair;
/// polygons are small.
fn find_max_separation(
    poly1: &Polygon,
    xf1: &Transform,
    poly2: &Polygon,
    xf2: &Transform,
) -> (f32, usize) {
    // Work in poly2's frame.
    let xf = xf2.inv_times(xf1);

    let mut best_index = 0;
    let mut max_separation = f32::MIN;
    for (i, (n1, v1)) in poly1.normals().iter().zip(poly1.vertices()).enumerate() {
        let n = xf.q.apply(*n1);
        let v1 = xf.apply(*v1);

        let si = poly2
            .vertices()
            .iter()
            .map(|v2| n.dot(*v2 - v1))
            .fold(f32::MAX, f32::min);

        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (max_separation, best_index)
}

/// Edge of `poly2` whose normal is most anti-parallel to face `edge1` of
/// `poly1`, in world space.
fn find_incident_edge(
    poly1: &Polygon,
    xf1: &Transform,
    edge1: usize,
    poly2: &Polygon,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    let normal1 = xf2.q.apply_inverse(xf1.q.apply(poly1.normals()[edge1]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n2) in poly2.normals().iter().enumerate() {
        let dot = normal1.dot(*n2);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = if i1 + 1 < poly2.count() { i1 + 1 } else { 0 };
    let face = feature_index(edge1);
    let vertices = poly2.vertices();
    [
        ClipVertex::new(
            xf2.apply(vertices[i1]),
            ContactFeature::new(face, FeatureType::Face, feature_index(i1), FeatureType::Vertex),
        ),
        ClipVertex::new(
            xf2.apply(vertices[i2]),
            ContactFeature::new(face, FeatureType::Face, feature_index(i2), FeatureType::Vertex),
        ),
    ]
}

/// Polygon against polygon via separating axes and incident-edge clipping.
///
/// The reference face comes from whichever polygon has the larger maximum
/// separation; B wins only if it beats A by more than a small tolerance, so
/// resting contacts do not flip between faces. Points keep their contact
/// feature ids from frame to frame while the same features touch.
pub fn collide_polygons(
    manifold: &mut Manifold,
    poly_a: &Polygon,
    xf_a: &Transform,
    poly_b: &Polygon,
    xf_b: &Transform,
) {
    manifold.clear();
    let total_radius = poly_a.radius() + poly_b.radius();

    let (separation_a, edge_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return;
    }

    let (separation_b, edge_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return;
    }

    let (poly1, xf1, poly2, xf2, edge1, flip) =
        if separation_b > separation_a + REFERENCE_FACE_TOLERANCE {
            manifold.kind = ManifoldType::FaceB;
            (poly_b, xf_b, poly_a, xf_a, edge_b, true)
        } else {
            manifold.kind = ManifoldType::FaceA;
            (poly_a, xf_a, poly_b, xf_b, edge_a, false)
        };

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let iv1 = edge1;
    let iv2 = if edge1 + 1 < poly1.count() { edge1 + 1 } else { 0 };
    let v11 = poly1.vertices()[iv1];
    let v12 = poly1.vertices()[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = cross_vs(local_tangent, 1.0);
    let plane_point = (v11 + v12) * 0.5;

    let tangent = xf1.q.apply(local_tangent);
    let normal = cross_vs(tangent, 1.0);

    let v11 = xf1.apply(v11);
    let v12 = xf1.apply(v12);

    // Face offset.
    let front_offset = normal.dot(v11);

    // Side offsets, extended by the polygon skin.
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    let clip1 = clip_segment_to_line(&incident_edge, -tangent, side_offset1, feature_index(iv1));
    if clip1.count < 2 {
        return;
    }
    let clip2 = clip_segment_to_line(&clip1.vertices, tangent, side_offset2, feature_index(iv2));
    if clip2.count < 2 {
        return;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    for cv in clip2.as_slice() {
        let separation = normal.dot(cv.v) - front_offset;
        if separation <= total_radius {
            let id = if flip { cv.id.swapped() } else { cv.id };
            manifold.push_point(xf2.apply_inverse(cv.v), id);
        }
    }
}
