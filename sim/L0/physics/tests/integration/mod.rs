//! Integration tests for the planar-* crates.
//!
//! These tests drive the whole pipeline through the public [`World`] API:
//! - shape pairs colliding and coming to rest
//! - solver iteration behaviour on joint scenarios
//! - body and island sleeping
//! - contact and lifecycle events
//! - ray casts against placed bodies
//! - springs, materials, kinematic bodies and determinism
//!
//! [`World`]: planar_physics::prelude::World

#![allow(clippy::float_cmp, clippy::cast_precision_loss)]

pub mod collision;
pub mod constraints;
pub mod events;
pub mod raycast;
pub mod scenarios;
pub mod sleep;
pub mod solver;

use planar_physics::prelude::*;

/// Fixed step used by every scenario.
pub const DT: f64 = 1.0 / 60.0;

/// Step a world `n` times.
pub fn run(world: &mut World, n: usize) {
    for _ in 0..n {
        world.step(DT).expect("step failed");
    }
}

/// A static ground plane through the origin, normal +y.
pub fn add_ground(world: &mut World) -> BodyId {
    world
        .add_body(Body::static_body().with_shape(Shape::plane()))
        .expect("add ground")
}

/// A dynamic circle of unit mass.
pub fn add_ball(world: &mut World, x: f64, y: f64, radius: f64) -> BodyId {
    world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(x, y))
                .with_shape(Shape::circle(radius)),
        )
        .expect("add ball")
}
