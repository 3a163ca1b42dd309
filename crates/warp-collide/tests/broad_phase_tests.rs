// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Integration tests for the dynamic tree and broad-phase pair manager.

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use warp_collide::math::Prng;
use warp_collide::{Aabb, BroadPhase, DynamicTree, Pair, ProxyId, Vec2};

fn unit_box_at(x: f32, y: f32) -> Aabb {
    Aabb::from_center_half_extents(Vec2::new(x, y), Vec2::splat(0.5))
}

// ceil(2 * log2(n + 1)) == ceil(log2((n + 1)^2)).
fn height_bound(n: usize) -> u32 {
    ((n + 1) * (n + 1)).next_power_of_two().trailing_zeros()
}

// Non-overlapping cells on a grid, visited in a seeded random order.
fn shuffled_cells(n: usize, prng: &mut Prng) -> Vec<Aabb> {
    let side = (1..).find(|s| s * s >= n).unwrap_or(1);
    let mut cells: Vec<Aabb> = (0..n)
        .map(|i| {
            let (col, row) = (i % side, i / side);
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (col as f32 * 3.0, row as f32 * 3.0);
            unit_box_at(x, y)
        })
        .collect();
    for i in (1..cells.len()).rev() {
        let j = prng.next_index(i + 1);
        cells.swap(i, j);
    }
    cells
}

// Balanced trees over a grid total O(sqrt(n)) root perimeters; a degenerate
// chain grows linearly in n.
#[allow(clippy::cast_precision_loss)]
fn area_ratio_bound(n: usize) -> f32 {
    8.0f32.mul_add((n as f32).sqrt(), 8.0)
}

#[test]
fn tree_stays_balanced_through_inserts_and_removals() {
    for (n, seed) in [(10, 1_u64), (100, 2), (1000, 3)] {
        let mut prng = Prng::from_seed(seed);
        let bound = height_bound(n);
        let ratio_bound = area_ratio_bound(n);
        let mut tree = DynamicTree::new();
        let mut ids = Vec::with_capacity(n);
        assert!(tree.area_ratio().abs() < f32::EPSILON);

        for aabb in shuffled_cells(n, &mut prng) {
            ids.push(tree.create_proxy(aabb, ()));
            assert!(tree.height() <= bound, "n={n} height {} > {bound}", tree.height());
            assert!(tree.max_balance() <= 2, "n={n} balance {}", tree.max_balance());
            let ratio = tree.area_ratio();
            assert!(
                ratio.is_finite() && (1.0..=ratio_bound).contains(&ratio),
                "n={n} area ratio {ratio} outside [1, {ratio_bound}]"
            );
        }
        assert_eq!(tree.validate(), Ok(()));

        while !ids.is_empty() {
            let id = ids.swap_remove(prng.next_index(ids.len()));
            assert_eq!(tree.destroy_proxy(id), Some(()));
            assert!(tree.height() <= bound);
            assert!(tree.max_balance() <= 2);
        }
        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(tree.proxy_count(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.area_ratio().abs() < f32::EPSILON);
    }
}

#[test]
fn fat_aabb_tracks_latest_tight_aabb_across_moves() {
    let mut prng = Prng::from_seed(0x5eed);
    let mut tree = DynamicTree::new();
    let mut current: Vec<(ProxyId, Aabb)> = (0..32)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let aabb = unit_box_at(i as f32 * 2.0, 0.0);
            (tree.create_proxy(aabb, i), aabb)
        })
        .collect();

    for &(id, aabb) in &current {
        assert!(tree.fat_aabb(id).contains(&aabb));
    }

    for _ in 0..500 {
        let k = prng.next_index(current.len());
        let (id, old) = current[k];
        let d = Vec2::new(prng.next_range(-0.5, 0.5), prng.next_range(-0.5, 0.5));
        let moved = old.translated(d);
        tree.move_proxy(id, moved, d);
        current[k].1 = moved;
        assert!(tree.fat_aabb(id).contains(&moved));
    }
    assert_eq!(tree.validate(), Ok(()));
    for &(id, aabb) in &current {
        assert!(tree.fat_aabb(id).contains(&aabb));
    }
}

#[test]
fn mutually_moved_overlap_is_reported_once() {
    let mut bp = BroadPhase::new();
    let a = bp.create_proxy(unit_box_at(0.0, 0.0), 'a');
    let b = bp.create_proxy(unit_box_at(0.8, 0.0), 'b');
    let _far = bp.create_proxy(unit_box_at(50.0, 0.0), 'c');

    // Both sides of the pair are in the move buffer, so each query finds it.
    let mut pairs = Vec::new();
    bp.update_pairs(|pair, x, y| pairs.push((pair, *x, *y)));
    assert_eq!(pairs, vec![(Pair::new(a, b), 'a', 'b')]);

    // Nothing moved: no pairs.
    let mut count = 0;
    bp.update_pairs(|_, _, _| count += 1);
    assert_eq!(count, 0);

    // Touch both again: still one report.
    bp.touch_proxy(b);
    bp.touch_proxy(a);
    bp.touch_proxy(b);
    let mut again = Vec::new();
    bp.update_pairs(|pair, _, _| again.push(pair));
    assert_eq!(again, vec![Pair::new(a, b)]);
}

#[test]
fn pairs_arrive_in_canonical_order() {
    let mut bp = BroadPhase::new();
    let ids: Vec<ProxyId> = (0..4)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * 0.25;
            bp.create_proxy(unit_box_at(x, 0.0), i)
        })
        .collect();

    let mut pairs = Vec::new();
    bp.update_pairs(|pair, _, _| pairs.push(pair));
    let mut sorted = pairs.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(pairs, sorted);
    for pair in &pairs {
        assert!(pair.proxy_a < pair.proxy_b);
    }
    // Every box overlaps every other at this spacing.
    assert_eq!(pairs.len(), ids.len() * (ids.len() - 1) / 2);
}

#[test]
fn destroy_then_create_reuses_slot_and_keeps_containment() {
    let mut tree = DynamicTree::new();
    let boxes: Vec<Aabb> = (0..16)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * 1.5;
            unit_box_at(x, 1.0)
        })
        .collect();
    let ids: Vec<ProxyId> = boxes.iter().map(|b| tree.create_proxy(*b, ())).collect();

    let victim = ids[7];
    assert_eq!(tree.destroy_proxy(victim), Some(()));
    let reborn = tree.create_proxy(boxes[7], ());
    assert_eq!(tree.validate(), Ok(()));
    assert!(tree.fat_aabb(reborn).contains(&boxes[7]));

    for (id, aabb) in ids.iter().zip(&boxes) {
        if *id != victim {
            assert!(tree.fat_aabb(*id).contains(aabb));
        }
    }

    let mut hits = Vec::new();
    tree.query(&boxes[7], |id| {
        hits.push(id);
        true
    });
    assert!(hits.contains(&reborn));
}

#[test]
fn shift_origin_moves_every_proxy() {
    let mut bp = BroadPhase::new();
    let a = bp.create_proxy(unit_box_at(10.0, 10.0), ());
    let before = bp.fat_aabb(a);
    bp.shift_origin(Vec2::new(10.0, 10.0));
    let after = bp.fat_aabb(a);
    assert!((after.center() - (before.center() - Vec2::new(10.0, 10.0))).length() < 1e-5);
    assert_eq!(bp.tree().validate(), Ok(()));
}

#[test]
fn proptest_seed_pinned_tree_containment() {
    const SEED_BYTES: [u8; 32] = [
        0x7c, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(
        PropConfig {
            cases: 64,
            ..PropConfig::default()
        },
        rng,
    );

    let coord = -100.0_f32..100.0;
    let half = 0.01_f32..5.0;
    let aabb = (coord.clone(), coord, half.clone(), half).prop_map(|(x, y, hx, hy)| {
        Aabb::from_center_half_extents(Vec2::new(x, y), Vec2::new(hx, hy))
    });
    let moves = prop::collection::vec((0_usize..16, -3.0_f32..3.0, -3.0_f32..3.0), 0..64);
    let scene = (prop::collection::vec(aabb, 1..16), moves);

    let result = runner.run(&scene, |(boxes, moves)| {
        let mut tree = DynamicTree::new();
        let mut live: Vec<(ProxyId, Aabb)> =
            boxes.iter().map(|b| (tree.create_proxy(*b, ()), *b)).collect();

        for (k, dx, dy) in moves {
            let k = k % live.len();
            let d = Vec2::new(dx, dy);
            let moved = live[k].1.translated(d);
            tree.move_proxy(live[k].0, moved, d);
            live[k].1 = moved;
        }

        for (id, aabb) in &live {
            prop_assert!(tree.fat_aabb(*id).contains(aabb));
        }
        prop_assert_eq!(tree.validate(), Ok(()));
        Ok(())
    });
    assert!(result.is_ok(), "{result:?}");
}
