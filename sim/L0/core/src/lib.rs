//! Collision detection, bodies and the world for planar rigid-body
//! simulation.
//!
//! This crate builds the stepping pipeline on top of the rows and solver in
//! `planar-constraint`:
//!
//! - [`Shape`] - circles, particles, planes, polygons, lines, boxes,
//!   capsules and heightfields, with AABBs, point tests and ray casts
//! - [`Body`] - mass, pose, velocity, forces, sleep and integration
//! - [`BroadPhase`] - naive and sweep-and-prune candidate pair search
//! - [`Narrowphase`] - shape-pair contact and friction generation
//! - [`World`] - the step pipeline, events, springs and queries
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          World::step                         │
//! │  forces → broadphase → narrowphase → solver → integrate      │
//! │                              │                   │           │
//! │                      OverlapKeeper          CCD + sleep      │
//! │                      (begin/end contact)                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs single threaded and iterates in insertion order, so two
//! worlds built the same way produce bit-identical results.
//!
//! # Quick Start
//!
//! ```ignore
//! use planar_core::{Body, Shape, World};
//! use planar_types::{WorldConfig, math::vec2};
//!
//! let mut world = World::new(WorldConfig::default())?;
//! world.add_body(Body::static_body().with_shape(Shape::plane()))?;
//! let ball = world.add_body(
//!     Body::dynamic(1.0)
//!         .with_position(vec2(0.0, 2.0))
//!         .with_shape(Shape::circle(0.5)),
//! )?;
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0)?;
//! }
//! println!("ball at {:?}", world.body(ball).map(|b| b.position()));
//! ```

#![doc(html_root_url = "https://docs.rs/planar-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x >= 0.0) is intentional for NaN rejection
    clippy::option_if_let_else,         // if-let is often more readable than map_or_else
    clippy::too_many_lines,             // Collision routines naturally have many steps
    clippy::too_many_arguments,         // Routines take both colliders and shape data
    clippy::doc_markdown,               // Not all technical terms need backticks
    clippy::missing_errors_doc,         // Error docs added where non-obvious
)]

pub mod body;
pub mod broad_phase;
pub mod events;
pub mod narrow_phase;
pub mod overlap;
pub mod ray;
pub mod shape;
pub mod spring;
pub mod world;

pub use body::Body;
pub use broad_phase::{BroadPhase, NaiveBroadPhase, SweepAndPrune};
pub use events::{EventEmitter, ListenerId, WorldEvent, WorldEventKind};
pub use narrow_phase::{Collider, EquationPool, Narrowphase};
pub use overlap::{OverlapKeeper, OverlapRecord};
pub use ray::{Ray, RayCaster, RayMode, RaycastResult};
pub use shape::{BoxShape, Capsule, Circle, Convex, Heightfield, Line, Shape, ShapeKind, ShapeType};
pub use spring::{Spring, SpringKind};
pub use world::World;

// Re-export the crates the public API is built from.
pub use planar_constraint;
pub use planar_types;
