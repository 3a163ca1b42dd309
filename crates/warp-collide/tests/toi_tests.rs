// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Integration tests for time of impact.

use warp_collide::settings::LINEAR_SLOP;
use warp_collide::{
    time_of_impact, time_of_impact_with, Circle, DistanceProxy, Polygon, Shape, Sweep, ToiConfig,
    ToiInput, ToiState, Vec2,
};

fn ball(radius: f32) -> DistanceProxy {
    DistanceProxy::from_shape(&Shape::Circle(Circle::new(Vec2::ZERO, radius)), 0)
}

// Ball A travels `speed` units along +x from x = -5 toward a resting ball B
// at the origin.
fn head_on(speed: f32) -> ToiInput {
    ToiInput {
        proxy_a: ball(0.5),
        proxy_b: ball(0.5),
        sweep_a: Sweep::linear(Vec2::new(-5.0, 0.0), Vec2::new(-5.0 + speed, 0.0), 0.0),
        sweep_b: Sweep::linear(Vec2::ZERO, Vec2::ZERO, 0.0),
        t_max: 1.0,
    }
}

#[test]
fn slow_approach_never_reaches_target() {
    for speed in [1.0, 2.0, 4.0] {
        let out = time_of_impact(&head_on(speed));
        assert_eq!(out.state, ToiState::Separated, "speed {speed}");
        assert!((out.t - 1.0).abs() < f32::EPSILON);
    }
}

#[test]
fn faster_approach_hits_no_later() {
    let mut last_t = f32::MAX;
    for speed in [4.5, 6.0, 8.0, 12.0, 20.0, 40.0] {
        let out = time_of_impact(&head_on(speed));
        assert_eq!(out.state, ToiState::Touching, "speed {speed}");
        assert!((0.0..=1.0).contains(&out.t), "t {} out of range", out.t);
        assert!(out.t <= last_t, "t rose from {last_t} to {}", out.t);
        last_t = out.t;

        // Centers stop just short of contact.
        let gap = 5.0 - speed * out.t;
        let target = 1.0 - 3.0 * LINEAR_SLOP;
        assert!((gap - target).abs() < LINEAR_SLOP, "speed {speed}: gap {gap}");
    }
}

#[test]
fn already_touching_reports_time_zero() {
    let input = ToiInput {
        proxy_a: ball(0.5),
        proxy_b: ball(0.5),
        sweep_a: Sweep::linear(Vec2::new(-0.986, 0.0), Vec2::new(3.0, 0.0), 0.0),
        sweep_b: Sweep::linear(Vec2::ZERO, Vec2::ZERO, 0.0),
        t_max: 1.0,
    };
    let out = time_of_impact(&input);
    assert_eq!(out.state, ToiState::Touching);
    assert!(out.t.abs() < f32::EPSILON);
}

#[test]
fn t_max_bounds_the_search() {
    let mut input = head_on(8.0);
    input.t_max = 0.25;
    let out = time_of_impact(&input);
    assert_eq!(out.state, ToiState::Separated);
    assert!((out.t - 0.25).abs() < f32::EPSILON);
}

#[test]
fn spinning_bar_result_stays_in_range() {
    let bar = DistanceProxy::from_shape(&Shape::Polygon(Polygon::new_box(2.0, 0.1)), 0);
    let block = DistanceProxy::from_shape(&Shape::Polygon(Polygon::new_box(0.5, 0.5)), 0);
    let input = ToiInput {
        proxy_a: bar,
        proxy_b: block,
        sweep_a: Sweep {
            a: 3.0,
            ..Sweep::linear(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.0)
        },
        sweep_b: Sweep::linear(Vec2::new(0.0, 2.0), Vec2::new(0.0, 2.0), 0.0),
        t_max: 1.0,
    };
    let out = time_of_impact(&input);
    // Rotation is sampled along the axis, so fast spin may legitimately
    // tunnel; the result must still be a decided state inside the interval.
    assert_ne!(out.state, ToiState::Unknown);
    assert!((0.0..=1.0).contains(&out.t));
    assert!(out.iterations >= 1);
}

#[test]
fn outer_iteration_cap_is_configurable() {
    let config = ToiConfig {
        max_iterations: 1,
        ..ToiConfig::default()
    };
    let out = time_of_impact_with(&head_on(8.0), &config);
    // One axis pass advances t1 but the cap stops before confirming contact.
    assert_eq!(out.state, ToiState::Failed);
    assert_eq!(out.iterations, 1);
    assert!(out.t > 0.0 && out.t <= 1.0);
}
