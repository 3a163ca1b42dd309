// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Transform, Vec2};
use crate::settings::EPSILON;
use crate::shapes::{Circle, Polygon};

use super::manifold::{ContactFeature, Manifold, ManifoldType};

/// Circle against circle.
///
/// Produces a single [`ManifoldType::Circles`] point when the centers are
/// within the summed radii; touching counts as contact.
pub fn collide_circles(
    manifold: &mut Manifold,
    circle_a: &Circle,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) {
    manifold.clear();

    let p_a = xf_a.apply(circle_a.position);
    let p_b = xf_b.apply(circle_b.position);
    let radius = circle_a.radius + circle_b.radius;
    if p_a.distance_squared(p_b) > radius * radius {
        return;
    }

    manifold.kind = ManifoldType::Circles;
    manifold.local_point = circle_a.position;
    manifold.local_normal = Vec2::ZERO;
    manifold.push_point(circle_b.position, ContactFeature::default());
}

/// Polygon A against circle B.
///
/// Finds the face of A with the largest separation from the circle center,
/// then resolves the vertex or face Voronoi region the center falls in.
pub fn collide_polygon_and_circle(
    manifold: &mut Manifold,
    polygon_a: &Polygon,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) {
    manifold.clear();

    // Circle center in the polygon's frame.
    let c = xf_b.apply(circle_b.position);
    let c_local = xf_a.apply_inverse(c);

    let radius = polygon_a.radius() + circle_b.radius;
    let vertices = polygon_a.vertices();
    let normals = polygon_a.normals();

    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for (i, (v, n)) in vertices.iter().zip(normals).enumerate() {
        let s = n.dot(c_local - *v);
        if s > radius {
            // Early out.
            return;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = vertices[normal_index];
    let v2 = vertices[(normal_index + 1) % vertices.len()];

    manifold.kind = ManifoldType::FaceA;

    // Center inside the polygon.
    if separation < EPSILON {
        manifold.local_normal = normals[normal_index];
        manifold.local_point = (v1 + v2) * 0.5;
        manifold.push_point(circle_b.position, ContactFeature::default());
        return;
    }

    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if c_local.distance_squared(v1) > radius * radius {
            return;
        }
        manifold.local_normal = (c_local - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if c_local.distance_squared(v2) > radius * radius {
            return;
        }
        manifold.local_normal = (c_local - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = (v1 + v2) * 0.5;
        let s = (c_local - face_center).dot(normals[normal_index]);
        if s > radius {
            return;
        }
        manifold.local_normal = normals[normal_index];
        manifold.local_point = face_center;
    }
    manifold.push_point(circle_b.position, ContactFeature::default());
}
