//! Equations, joints and the iterative solver for planar rigid bodies.
//!
//! Everything the solver sees is an [`Equation`]: a single scalar row
//! coupling two bodies through a 6-entry Jacobian. Contacts and friction
//! rows are produced per step by the narrowphase; joints own a fixed set of
//! rows and refresh them before each solve.
//!
//! # Joints
//!
//! - [`DistanceConstraint`] - rod, rope or strut between two anchors
//! - [`RevoluteConstraint`] - hinge with optional motor and angle limits
//! - [`PrismaticConstraint`] - slider with optional motor and position limits
//! - [`LockConstraint`] - weld
//! - [`GearConstraint`] - angle coupling with a ratio
//!
//! # Solving
//!
//! [`GaussSeidelSolver`] runs projected Gauss-Seidel sweeps over the enabled
//! rows, optionally one island at a time (see [`Islands`]). Bodies are
//! reached through the [`SolverBody`] trait and addressed by their index in
//! the slice handed to the solver.
//!
//! # Example
//!
//! ```ignore
//! use planar_constraint::{Constraint, DistanceConstraint, GaussSeidelSolver};
//!
//! let mut rod = DistanceConstraint::new(&bodies[0], &bodies[1]);
//! rod.update(bodies[0].state(), bodies[1].state());
//! rod.bind(0, 1);
//!
//! let mut solver = GaussSeidelSolver::default();
//! let mut rows: Vec<_> = rod.equations_mut().iter_mut().collect();
//! let stats = solver.solve(1.0 / 60.0, &mut rows, &mut bodies);
//! ```

#![doc(html_root_url = "https://docs.rs/planar-constraint/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,      // nalgebra types block most const fns
    clippy::suboptimal_flops,          // Jacobian products read better unfused
    clippy::cast_precision_loss,       // usize -> f64 for iteration counts
    clippy::many_single_char_names,    // a, b, g, h follow the SPOOK notation
    clippy::similar_names,             // ri/rj, wpa/wpb pairs
    clippy::missing_panics_doc,        // row indices are fixed per joint
)]

mod body;
mod constraint;
mod distance;
pub mod equation;
mod gear;
mod islands;
pub mod limits;
mod lock;
pub mod motor;
mod prismatic;
mod revolute;
mod solver;

pub use body::SolverBody;
pub use constraint::{Constraint, ConstraintBase};
pub use distance::DistanceConstraint;
pub use equation::{
    ContactData, DEFAULT_RELAXATION, DEFAULT_STIFFNESS, Equation, EquationKind, FrictionData,
    Spook, UNBOUND_BODY,
};
pub use gear::GearConstraint;
pub use islands::{Islands, UnionFind};
pub use limits::{JointLimits, LimitState};
pub use lock::LockConstraint;
pub use motor::JointMotor;
pub use prismatic::PrismaticConstraint;
pub use revolute::RevoluteConstraint;
pub use solver::{GaussSeidelSolver, SolverStats};
