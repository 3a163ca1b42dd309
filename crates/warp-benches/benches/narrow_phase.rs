// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use warp_collide::{
    collide_edge_and_polygon, collide_polygons, distance, DistanceInput, DistanceProxy, Edge,
    Manifold, Polygon, Shape, SimplexCache, Transform, Vec2,
};

fn bench_gjk(c: &mut Criterion) {
    let a = Shape::Polygon(Polygon::new_box(1.0, 0.5));
    let b = Shape::Polygon(Polygon::new_oriented_box(0.5, 0.5, Vec2::ZERO, 0.4));
    let input = DistanceInput {
        proxy_a: DistanceProxy::from_shape(&a, 0),
        proxy_b: DistanceProxy::from_shape(&b, 0),
        transform_a: Transform::IDENTITY,
        transform_b: Transform::from_angle(Vec2::new(2.5, 0.7), 0.3),
        use_radii: true,
    };

    let mut group = c.benchmark_group("gjk_distance");
    group.bench_function("cold", |bench| {
        bench.iter(|| {
            let mut cache = SimplexCache::default();
            black_box(distance(&mut cache, black_box(&input)))
        });
    });

    let mut warm = SimplexCache::default();
    distance(&mut warm, &input);
    group.bench_function("warm", |bench| {
        bench.iter(|| {
            let mut cache = warm;
            black_box(distance(&mut cache, black_box(&input)))
        });
    });
    group.finish();
}

fn bench_manifolds(c: &mut Criterion) {
    let ground = Polygon::new_box(5.0, 0.5);
    let crate_box = Polygon::new_box(0.5, 0.5);
    let resting = Transform::from_angle(Vec2::new(0.3, 0.99), 0.05);
    let edge = Edge::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0))
        .with_v0(Vec2::new(-6.0, 0.5))
        .with_v3(Vec2::new(6.0, 0.5));
    let on_edge = Transform::from_angle(Vec2::new(0.3, 0.49), 0.05);

    let mut group = c.benchmark_group("manifold");
    group.bench_function("polygon_polygon", |bench| {
        let mut m = Manifold::new();
        bench.iter(|| {
            collide_polygons(
                &mut m,
                &ground,
                &Transform::IDENTITY,
                &crate_box,
                black_box(&resting),
            );
            black_box(m.point_count())
        });
    });
    group.bench_function("edge_polygon", |bench| {
        let mut m = Manifold::new();
        bench.iter(|| {
            collide_edge_and_polygon(
                &mut m,
                &edge,
                &Transform::IDENTITY,
                &crate_box,
                black_box(&on_edge),
            );
            black_box(m.point_count())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_gjk, bench_manifolds);
criterion_main!(benches);
