//! Unified API for planar rigid-body simulation.
//!
//! This crate re-exports the complete stack:
//!
//! - [`planar_types`] - vector kernel, ids, AABBs, materials, configuration
//!   and errors
//! - [`planar_constraint`] - equation rows, joints and the Gauss-Seidel
//!   solver
//! - [`planar_core`] - shapes, bodies, broad and narrow phase, springs,
//!   events and the [`World`](planar_core::World)
//!
//! # Quick Start
//!
//! ```
//! use planar_physics::prelude::*;
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//! world
//!     .add_body(Body::static_body().with_shape(Shape::plane()))
//!     .unwrap();
//! let ball = world
//!     .add_body(
//!         Body::dynamic(1.0)
//!             .with_position(vec2(0.0, 2.0))
//!             .with_shape(Shape::circle(0.5)),
//!     )
//!     .unwrap();
//!
//! for _ in 0..240 {
//!     world.step(1.0 / 60.0).unwrap();
//! }
//!
//! let height = world.body(ball).unwrap().position().y;
//! assert!((height - 0.5).abs() < 0.05);
//! ```
//!
//! # Joints
//!
//! ```
//! use planar_physics::prelude::*;
//!
//! let mut world = World::default();
//! let anchor = world.add_body(Body::static_body()).unwrap();
//! let bob = world
//!     .add_body(
//!         Body::dynamic(1.0)
//!             .with_position(vec2(1.0, 0.0))
//!             .with_shape(Shape::circle(0.1)),
//!     )
//!     .unwrap();
//!
//! let hinge = RevoluteConstraint::from_world_pivot(
//!     world.body(anchor).unwrap(),
//!     world.body(bob).unwrap(),
//!     vec2(0.0, 0.0),
//! );
//! world.add_constraint(hinge).unwrap();
//! world.step(1.0 / 60.0).unwrap();
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              planar-physics (this crate)            │
//! │              Unified API / re-exports               │
//! └──────────────────────────┬──────────────────────────┘
//!                            ▼
//!                  ┌───────────────────┐
//!                  │    planar-core    │
//!                  │ World, narrowphase│
//!                  └─────────┬─────────┘
//!                            ▼
//!                  ┌───────────────────┐
//!                  │ planar-constraint │
//!                  │ Equations, solver │
//!                  └─────────┬─────────┘
//!                            ▼
//!                  ┌───────────────────┐
//!                  │   planar-types    │
//!                  │   Data structs    │
//!                  └───────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/planar-physics/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use planar_constraint;
pub use planar_core;
pub use planar_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use planar_physics::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from planar-types
    // ========================================================================

    // Math
    pub use planar_types::Vec2;
    pub use planar_types::math::vec2;

    // Handles
    pub use planar_types::{BodyId, ConstraintId, ContactMaterialId, MaterialId, ShapeId, SpringId};

    // Bodies, materials, bounds
    pub use planar_types::{Aabb, BodyType, ContactMaterial, ContactMaterialParams, Material, SleepState};

    // Configuration
    pub use planar_types::{Axis, BoundingVolume, BroadphaseKind, SleepMode, SolverConfig, WorldConfig};

    // Errors
    pub use planar_types::{Result, SimError};

    // ========================================================================
    // Joints and solver from planar-constraint
    // ========================================================================

    pub use planar_constraint::{
        Constraint, DistanceConstraint, Equation, GaussSeidelSolver, GearConstraint, JointLimits,
        LockConstraint, PrismaticConstraint, RevoluteConstraint, SolverStats,
    };

    // ========================================================================
    // World, bodies and shapes from planar-core
    // ========================================================================

    pub use planar_core::{
        Body, BroadPhase, Narrowphase, Ray, RayMode, RaycastResult, Shape, ShapeKind, ShapeType, Spring,
        SpringKind, World, WorldEvent, WorldEventKind,
    };
}
