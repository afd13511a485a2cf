//! Body and island sleeping.

use planar_physics::prelude::*;

use crate::{DT, add_ball, add_ground, run};

// ============================================================================
// Body sleeping
// ============================================================================

#[test]
fn settled_ball_falls_asleep() {
    let config = WorldConfig::default().with_sleep_mode(SleepMode::BodySleeping);
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    let ball = add_ball(&mut world, 0.0, 2.0, 0.5);

    let mut saw_sleepy = false;
    for _ in 0..600 {
        world.step(DT).unwrap();
        saw_sleepy |= world.body(ball).unwrap().sleep_state() == SleepState::Sleepy;
    }

    let body = world.body(ball).unwrap();
    assert!(saw_sleepy);
    assert_eq!(body.sleep_state(), SleepState::Sleeping);
    assert_eq!(body.velocity(), Vec2::zeros());
    assert!(!world.has_active_bodies());
}

#[test]
fn no_sleeping_keeps_world_active() {
    let mut world = World::default();
    add_ground(&mut world);
    let ball = add_ball(&mut world, 0.0, 2.0, 0.5);

    for _ in 0..1200 {
        world.step(DT).unwrap();
        assert!(world.has_active_bodies());
    }
    assert_eq!(world.body(ball).unwrap().sleep_state(), SleepState::Awake);
}

#[test]
fn sleeping_body_woken_by_fast_impact() {
    let config = WorldConfig::default().with_sleep_mode(SleepMode::BodySleeping);
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    let resting = add_ball(&mut world, 0.0, 0.5, 0.5);
    run(&mut world, 300);
    assert!(world.body(resting).unwrap().is_sleeping());

    world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 3.0))
                .with_velocity(vec2(0.0, -5.0))
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    let mut woke = false;
    for _ in 0..60 {
        world.step(DT).unwrap();
        woke |= !world.body(resting).unwrap().is_sleeping();
    }
    assert!(woke);
}

#[test]
fn sleep_disallowed_body_stays_awake() {
    let config = WorldConfig::default().with_sleep_mode(SleepMode::BodySleeping);
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    let ball = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 0.5))
                .with_allow_sleep(false)
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    run(&mut world, 300);
    assert_eq!(world.body(ball).unwrap().sleep_state(), SleepState::Awake);
}

// ============================================================================
// Island sleeping
// ============================================================================

/// Two frictionless circles stacked on the ground. The bottom one is ready
/// to sleep well before the top one.
fn stacked_pair() -> (World, BodyId, BodyId) {
    let config = WorldConfig::default()
        .with_sleep_mode(SleepMode::IslandSleeping)
        .with_default_contact_material(ContactMaterialParams::frictionless());
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    let bottom = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 0.5))
                .with_sleep_limits(0.2, 0.5)
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    let top = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 1.5))
                .with_sleep_limits(0.2, 2.0)
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    (world, bottom, top)
}

#[test]
fn island_sleeps_only_when_every_body_wants_to() {
    let (mut world, bottom, top) = stacked_pair();

    let mut bottom_waited = false;
    let mut asleep_at = None;
    for step in 0..1200 {
        world.step(DT).unwrap();
        let b = world.body(bottom).unwrap();
        let t = world.body(top).unwrap();
        if b.is_sleeping() || t.is_sleeping() {
            assert!(b.is_sleeping() && t.is_sleeping(), "island split up at step {step}");
            asleep_at = Some(step);
            break;
        }
        bottom_waited |= b.wants_to_sleep() && !t.wants_to_sleep();
    }

    assert!(asleep_at.is_some());
    assert!(bottom_waited);
    assert!(!world.has_active_bodies());
}

#[test]
fn one_restless_body_keeps_island_awake() {
    let (mut world, bottom, top) = stacked_pair();

    for _ in 0..1200 {
        world.body_mut(top).unwrap().set_angular_velocity(1.0);
        world.step(DT).unwrap();
    }

    let b = world.body(bottom).unwrap();
    assert!(b.wants_to_sleep());
    assert!(!b.is_sleeping());
    assert!(!world.body(top).unwrap().is_sleeping());
}

#[test]
fn island_sleeping_without_split_never_sleeps() {
    let config = WorldConfig::default()
        .with_sleep_mode(SleepMode::IslandSleeping)
        .with_island_split(false);
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    let ball = add_ball(&mut world, 0.0, 0.5, 0.5);
    run(&mut world, 300);
    assert!(!world.body(ball).unwrap().is_sleeping());
}
