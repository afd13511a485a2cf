//! Joints driven through a full world step.

use approx::assert_relative_eq;
use planar_physics::prelude::*;

use crate::{DT, run};

fn anchor(world: &mut World) -> BodyId {
    world.add_body(Body::static_body()).unwrap()
}

fn disc(world: &mut World, x: f64, y: f64) -> BodyId {
    world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(x, y))
                .with_shape(Shape::circle(0.1)),
        )
        .unwrap()
}

fn distance_between(world: &World, a: BodyId, b: BodyId) -> f64 {
    (world.body(b).unwrap().position() - world.body(a).unwrap().position()).norm()
}

// ============================================================================
// Distance
// ============================================================================

#[test]
fn distance_constraint_holds_length() {
    let mut world = World::default();
    let a = anchor(&mut world);
    let b = disc(&mut world, 1.0, 0.0);
    let joint = DistanceConstraint::new(world.body(a).unwrap(), world.body(b).unwrap());
    world.add_constraint(joint).unwrap();

    let mut lowest = 0.0_f64;
    for _ in 0..240 {
        world.step(DT).unwrap();
        assert!((distance_between(&world, a, b) - 1.0).abs() < 0.02);
        lowest = lowest.min(world.body(b).unwrap().position().y);
    }
    // It swings rather than hanging still.
    assert!(lowest < -0.9);
}

#[test]
fn distance_limits_act_as_rope() {
    let mut world = World::default();
    let a = anchor(&mut world);
    let b = disc(&mut world, 0.0, -1.0);
    let rope = DistanceConstraint::new(world.body(a).unwrap(), world.body(b).unwrap())
        .with_limits(JointLimits::new(0.0, 2.0));
    let id = world.add_constraint(rope).unwrap();

    let mut longest = 0.0_f64;
    for _ in 0..180 {
        world.step(DT).unwrap();
        longest = longest.max(distance_between(&world, a, b));
    }
    assert!(longest > 1.9);
    assert!(longest < 2.1);

    let rope = world
        .constraint(id)
        .and_then(|c| c.downcast_ref::<DistanceConstraint>())
        .unwrap();
    assert_relative_eq!(rope.position(), distance_between(&world, a, b), epsilon = 0.05);
}

// ============================================================================
// Revolute
// ============================================================================

#[test]
fn revolute_pendulum_keeps_radius() {
    let mut world = World::default();
    let a = anchor(&mut world);
    let b = disc(&mut world, 1.0, 0.0);
    let hinge = RevoluteConstraint::from_world_pivot(world.body(a).unwrap(), world.body(b).unwrap(), vec2(0.0, 0.0));
    world.add_constraint(hinge).unwrap();

    for _ in 0..240 {
        world.step(DT).unwrap();
        assert!((distance_between(&world, a, b) - 1.0).abs() < 0.02);
    }
}

#[test]
fn revolute_motor_drives_relative_speed() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = anchor(&mut world);
    let b = disc(&mut world, 0.0, 0.0);
    let mut hinge =
        RevoluteConstraint::from_world_pivot(world.body(a).unwrap(), world.body(b).unwrap(), vec2(0.0, 0.0));
    hinge.enable_motor();
    hinge.set_motor_speed(2.0);
    world.add_constraint(hinge).unwrap();

    run(&mut world, 30);
    assert_relative_eq!(world.body(b).unwrap().angular_velocity(), 2.0, epsilon = 0.05);
    assert_relative_eq!(world.body(b).unwrap().position().norm(), 0.0, epsilon = 1e-3);
}

#[test]
fn revolute_limits_stop_rotation() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = anchor(&mut world);
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_angular_velocity(3.0)
                .with_damping(0.0, 0.0)
                .with_shape(Shape::circle(0.1)),
        )
        .unwrap();
    let mut hinge =
        RevoluteConstraint::from_world_pivot(world.body(a).unwrap(), world.body(b).unwrap(), vec2(0.0, 0.0));
    hinge.set_limits(Some(-0.5), Some(0.5));
    let id = world.add_constraint(hinge).unwrap();

    run(&mut world, 120);
    assert!(world.body(b).unwrap().angle() < 0.6);
    let hinge = world
        .constraint(id)
        .and_then(|c| c.downcast_ref::<RevoluteConstraint>())
        .unwrap();
    assert!(hinge.angle() < 0.6);
}

// ============================================================================
// Prismatic
// ============================================================================

#[test]
fn prismatic_slides_only_along_axis_within_limits() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = anchor(&mut world);
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_velocity(vec2(5.0, 3.0))
                .with_damping(0.0, 0.0)
                .with_shape(Shape::circle(0.1)),
        )
        .unwrap();
    let slider = PrismaticConstraint::new(world.body(a).unwrap(), world.body(b).unwrap())
        .with_limits(JointLimits::new(-1.0, 1.0));
    world.add_constraint(slider).unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
        let body = world.body(b).unwrap();
        assert!(body.position().y.abs() < 0.02);
        assert!(body.position().x < 1.1);
        assert!(body.angle().abs() < 1e-3);
    }
    assert!(world.body(b).unwrap().position().x > 0.9);
}

// ============================================================================
// Lock and gear
// ============================================================================

#[test]
fn lock_without_collide_connected_skips_contacts() {
    let mut world = World::default();
    let a = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 5.0))
                .with_shape(Shape::rectangle(1.0, 1.0)),
        )
        .unwrap();
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.5, 5.0))
                .with_shape(Shape::rectangle(1.0, 1.0)),
        )
        .unwrap();
    let mut lock = LockConstraint::new(world.body(a).unwrap(), world.body(b).unwrap());
    lock.set_collide_connected(false);
    world.add_constraint(lock).unwrap();

    for _ in 0..30 {
        world.step(DT).unwrap();
        assert!(world.contact_equations().is_empty());
    }
    let offset = world.body(b).unwrap().position() - world.body(a).unwrap().position();
    assert_relative_eq!(offset, vec2(0.5, 0.0), epsilon = 1e-3);
    assert!(world.body(a).unwrap().position().y < 5.0);
}

#[test]
fn connected_bodies_collide_by_default() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = world
        .add_body(Body::dynamic(1.0).with_shape(Shape::rectangle(1.0, 1.0)))
        .unwrap();
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.5, 0.0))
                .with_shape(Shape::rectangle(1.0, 1.0)),
        )
        .unwrap();
    let lock = LockConstraint::new(world.body(a).unwrap(), world.body(b).unwrap());
    world.add_constraint(lock).unwrap();

    world.step(DT).unwrap();
    assert!(!world.contact_equations().is_empty());
}

#[test]
fn gear_couples_rotation() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = world
        .add_body(
            Body::dynamic(1.0)
                .with_angular_velocity(1.0)
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(3.0, 0.0))
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    let gear = GearConstraint::new(world.body(a).unwrap(), world.body(b).unwrap(), 2.0);
    world.add_constraint(gear).unwrap();

    for _ in 0..120 {
        world.step(DT).unwrap();
        let angle_a = world.body(a).unwrap().angle();
        let angle_b = world.body(b).unwrap().angle();
        assert!((angle_b - 2.0 * angle_a).abs() < 0.02);
    }
    assert!(world.body(a).unwrap().angle().abs() > 0.1);
}
