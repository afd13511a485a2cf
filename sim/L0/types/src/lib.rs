//! Core types for planar rigid-body simulation.
//!
//! This crate provides the foundational types shared by every layer of the
//! engine:
//!
//! - [`math`] - the 2D vector kernel over [`nalgebra::Vector2`]
//! - [`Aabb`] - axis-aligned bounding boxes
//! - [`BodyId`], [`ShapeId`], ... - world-assigned handles
//! - [`BodyState`], [`SolverState`] - kinematic state and solver accumulators
//! - [`Material`], [`ContactMaterial`] - surface interaction parameters
//! - [`WorldConfig`], [`SolverConfig`] - world and solver settings
//! - [`SimError`] - the error type of every fallible operation
//!
//! # Design Philosophy
//!
//! These types are **pure data**. Collision detection, solving and
//! integration live in `planar-constraint` and `planar-core`.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: up
//! - Angles: radians, counter-clockwise positive
//!
//! # Example
//!
//! ```
//! use planar_types::{Aabb, math::vec2};
//!
//! let a = Aabb::new(vec2(0.0, 0.0), vec2(1.0, 1.0));
//! let b = Aabb::new(vec2(1.0, 0.5), vec2(2.0, 2.0));
//! assert!(a.overlaps(&b));
//! ```

#![doc(html_root_url = "https://docs.rs/planar-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn,      // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord, // !(x >= 0.0) is intentional for NaN rejection
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod aabb;
mod body;
mod config;
mod error;
mod ids;
mod material;
pub mod math;

pub use aabb::{Aabb, Axis};
pub use body::{BodyState, BodyType, SleepState, SolverState};
pub use config::{BoundingVolume, BroadphaseKind, SleepMode, SolverConfig, WorldConfig};
pub use error::SimError;
pub use ids::{BodyId, ConstraintId, ContactMaterialId, MaterialId, ShapeId, SpringId};
pub use material::{ContactMaterial, ContactMaterialParams, Material, pair_key};
pub use math::Vec2;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
