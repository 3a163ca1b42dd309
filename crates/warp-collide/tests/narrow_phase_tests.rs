// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Integration tests for GJK distance, manifold generation and clipping.

use warp_collide::narrow::distance::GJK_MAX_ITERATIONS;
use warp_collide::narrow::manifold::{point_states, FeatureType, PointState};
use warp_collide::narrow::{ClipVertex, ContactFeature};
use warp_collide::{
    clip_segment_to_line, collide, collide_polygons, distance, Chain, Circle, DistanceInput,
    DistanceProxy, Manifold, ManifoldType, Polygon, Shape, SimplexCache, Transform, Vec2,
    WorldManifold,
};

fn at(x: f32, y: f32) -> Transform {
    Transform::from_angle(Vec2::new(x, y), 0.0)
}

fn circle_input(radius: f32, offset: Vec2) -> DistanceInput {
    let proxy = DistanceProxy::from_shape(&Shape::Circle(Circle::new(Vec2::ZERO, radius)), 0);
    DistanceInput {
        proxy_a: proxy,
        proxy_b: proxy,
        transform_a: Transform::IDENTITY,
        transform_b: Transform::from_angle(offset, 0.0),
        use_radii: true,
    }
}

fn near(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn gjk_separated_circles_report_surface_points() {
    let mut cache = SimplexCache::default();
    let out = distance(&mut cache, &circle_input(1.0, Vec2::new(5.0, 0.0)));
    assert!((out.distance - 3.0).abs() < 1e-5, "distance {}", out.distance);
    assert!(near(out.point_a, Vec2::new(1.0, 0.0)));
    assert!(near(out.point_b, Vec2::new(4.0, 0.0)));
    assert!(out.iterations <= 20);
}

#[test]
fn gjk_overlapping_circles_report_zero_and_shared_point() {
    let mut cache = SimplexCache::default();
    let out = distance(&mut cache, &circle_input(1.0, Vec2::new(1.0, 0.0)));
    assert!(out.distance.abs() < f32::EPSILON);
    assert!(near(out.point_a, out.point_b));
    assert!(near(out.point_a, Vec2::new(0.5, 0.0)));
}

#[test]
fn gjk_warm_start_matches_cold_result() {
    let a = Shape::Polygon(Polygon::new_box(1.0, 0.5));
    let b = Shape::Polygon(Polygon::new_oriented_box(0.5, 0.5, Vec2::ZERO, 0.4));
    let mut input = DistanceInput {
        proxy_a: DistanceProxy::from_shape(&a, 0),
        proxy_b: DistanceProxy::from_shape(&b, 0),
        transform_a: Transform::IDENTITY,
        transform_b: at(3.0, 0.2),
        use_radii: false,
    };

    let mut warm = SimplexCache::default();
    distance(&mut warm, &input);

    // Small motion, then compare a warm-started query with a cold one.
    input.transform_b = Transform::from_angle(Vec2::new(2.95, 0.25), 0.02);
    let warm_out = distance(&mut warm, &input);
    let cold_out = distance(&mut SimplexCache::default(), &input);
    assert!((warm_out.distance - cold_out.distance).abs() < 1e-4);
    assert!(warm.count > 0);
}

fn box_proxy(hx: f32, hy: f32) -> DistanceProxy {
    DistanceProxy::from_shape(&Shape::Polygon(Polygon::new_box(hx, hy)), 0)
}

fn point_proxy() -> DistanceProxy {
    DistanceProxy::from_shape(&Shape::Circle(Circle::new(Vec2::ZERO, 0.1)), 0)
}

#[test]
fn gjk_stops_on_repeated_support_before_the_cap() {
    let input = DistanceInput {
        proxy_a: box_proxy(1.0, 0.5),
        proxy_b: point_proxy(),
        transform_a: Transform::IDENTITY,
        transform_b: at(0.0, 2.0),
        use_radii: false,
    };
    let mut cache = SimplexCache::default();
    let out = distance(&mut cache, &input);
    assert!((out.distance - 1.5).abs() < 1e-5, "distance {}", out.distance);
    assert!(out.iterations < GJK_MAX_ITERATIONS, "iterations {}", out.iterations);
    assert_eq!(cache.count, 2);
    assert!((cache.metric - 2.0).abs() < 1e-6);
}

#[test]
#[allow(clippy::float_cmp)]
fn gjk_discards_cache_after_the_pair_grows() {
    let small = DistanceInput {
        proxy_a: box_proxy(1.0, 0.5),
        proxy_b: point_proxy(),
        transform_a: Transform::IDENTITY,
        transform_b: at(0.0, 2.0),
        use_radii: false,
    };
    let mut warm = SimplexCache::default();
    distance(&mut warm, &small);
    assert_eq!(warm.count, 2);
    let stored = warm.metric;

    // Same vertex indices, eight times the size: the cached simplex is
    // rejected and the query restarts exactly like a cold one.
    let large = DistanceInput {
        proxy_a: box_proxy(8.0, 4.0),
        transform_b: at(0.0, 16.0),
        ..small
    };
    let mut cold = SimplexCache::default();
    let warm_out = distance(&mut warm, &large);
    let cold_out = distance(&mut cold, &large);
    assert_eq!(warm_out, cold_out);
    assert_eq!(warm, cold);
    assert!(warm.metric > 2.0 * stored);
    assert!((warm_out.distance - 12.0).abs() < 1e-4);
}

#[test]
fn gjk_warm_start_survives_a_far_move_along_a_long_box() {
    let long = box_proxy(4.0, 0.5);
    let small = box_proxy(0.25, 0.25);
    let mut input = DistanceInput {
        proxy_a: long,
        proxy_b: small,
        transform_a: Transform::IDENTITY,
        transform_b: at(-3.0, 1.5),
        use_radii: false,
    };
    let mut warm = SimplexCache::default();
    distance(&mut warm, &input);
    let stored = warm;

    input.transform_b = Transform::from_angle(Vec2::new(5.0, 0.5), 1.2);
    let warm_out = distance(&mut warm, &input);
    let cold_out = distance(&mut SimplexCache::default(), &input);
    assert!(
        (warm_out.distance - cold_out.distance).abs() < 1e-5,
        "warm {} cold {}",
        warm_out.distance,
        cold_out.distance
    );
    assert!((warm_out.point_a - cold_out.point_a).length() < 1e-4);
    assert!(warm.count > 0);
    assert_ne!(warm, stored);
}

#[test]
fn clipping_synthesizes_the_crossing_point() {
    let id = ContactFeature::new(0, FeatureType::Face, 1, FeatureType::Vertex);
    let seg = [
        ClipVertex::new(Vec2::new(-1.0, 0.0), id),
        ClipVertex::new(Vec2::new(1.0, 0.0), id),
    ];
    let out = clip_segment_to_line(&seg, Vec2::new(1.0, 0.0), 0.0, 0);
    assert_eq!(out.count, 2);
    assert_eq!(out.vertices[0].v, Vec2::new(-1.0, 0.0));
    assert_eq!(out.vertices[0].id, id);
    assert_eq!(out.vertices[1].v, Vec2::new(0.0, 0.0));
    assert_eq!(out.vertices[1].id.type_a, FeatureType::Vertex);
}

fn assert_ids_stable(a: &Polygon, b: &Polygon, xf_b: Transform, nudged: Transform) {
    let mut m1 = Manifold::new();
    let mut m2 = Manifold::new();
    collide_polygons(&mut m1, a, &Transform::IDENTITY, b, &xf_b);
    collide_polygons(&mut m2, a, &Transform::IDENTITY, b, &nudged);

    assert!(!m1.is_empty());
    assert_eq!(m1.point_count(), m2.point_count());
    for (p, q) in m1.points().iter().zip(m2.points()) {
        assert_eq!(p.id, q.id);
    }

    let (old, new) = point_states(&m1, &m2);
    assert!(old[..m1.point_count()].iter().all(|s| *s == PointState::Persist));
    assert!(new[..m2.point_count()].iter().all(|s| *s == PointState::Persist));
}

#[test]
fn polygon_ids_survive_a_tiny_perturbation() {
    let ground = Polygon::new_box(1.0, 1.0);
    let crate_box = Polygon::new_box(0.5, 0.5);

    // Fully supported.
    assert_ids_stable(
        &ground,
        &crate_box,
        at(0.0, 1.49),
        Transform::from_angle(Vec2::new(1e-4, 1.49 - 1e-4), 1e-4),
    );

    // Hanging over the edge, so one point comes from side-plane clipping.
    assert_ids_stable(
        &ground,
        &crate_box,
        at(0.8, 1.49),
        Transform::from_angle(Vec2::new(0.8 - 1e-4, 1.49), -1e-4),
    );
}

#[test]
fn overhanging_box_gets_a_clipped_point_on_the_side_plane() {
    let ground = Polygon::new_box(1.0, 1.0);
    let crate_box = Polygon::new_box(0.5, 0.5);
    let xf_b = at(0.8, 1.49);
    let mut m = Manifold::new();
    collide_polygons(&mut m, &ground, &Transform::IDENTITY, &crate_box, &xf_b);
    assert_eq!(m.point_count(), 2);
    assert_eq!(m.kind, ManifoldType::FaceA);

    let wm = WorldManifold::new(
        &m,
        &Transform::IDENTITY,
        ground.radius(),
        &xf_b,
        crate_box.radius(),
    );
    let max_x = wm.points().iter().map(|p| p.x).fold(f32::MIN, f32::max);
    // Ground half-width plus both skins.
    assert!((max_x - 1.02).abs() < 1e-4, "max_x {max_x}");
    assert!(m.points().iter().any(|p| p.id.type_a == FeatureType::Vertex));
}

#[test]
fn circle_rolls_across_chain_joint_without_vertex_contact() {
    let chain = Shape::Chain(
        Chain::new_chain(&[Vec2::new(-2.0, 0.0), Vec2::ZERO, Vec2::new(2.0, 0.0)])
            .expect("chain vertices are well spaced"),
    );
    let ball = Shape::Circle(Circle::new(Vec2::ZERO, 0.5));
    let xf_ball = at(0.05, 0.45);

    let mut contacts = Vec::new();
    for child in 0..chain.child_count() {
        let mut m = Manifold::new();
        collide(&mut m, &chain, child, &Transform::IDENTITY, &ball, 0, &xf_ball)
            .expect("chain against circle is supported");
        if !m.is_empty() {
            contacts.push(m);
        }
    }
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].kind, ManifoldType::FaceA);
    assert!(near(contacts[0].local_normal, Vec2::UNIT_Y));
}
