//! Rigid body state types.
//!
//! This module provides the plain-data parts of a body that both the solver
//! and the world need to see: its kinematic state in 3 degrees of freedom
//! (position, angle, linear and angular velocity) and the per-step solver
//! accumulators.

use crate::math::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Moved by forces and contacts.
    #[default]
    Dynamic,
    /// Never moves.
    Static,
    /// Moved only by its velocity; infinite mass to everything else.
    Kinematic,
}

impl BodyType {
    /// Dynamic bodies are the only ones with finite mass.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Check for a static body.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }

    /// Check for a kinematic body.
    #[must_use]
    pub const fn is_kinematic(self) -> bool {
        matches!(self, Self::Kinematic)
    }
}

/// Sleep state of a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SleepState {
    /// Fully simulated.
    #[default]
    Awake,
    /// Slow enough to be accumulating idle time.
    Sleepy,
    /// Not simulated until woken.
    Sleeping,
}

/// Kinematic state of a body.
///
/// # Example
///
/// ```
/// use planar_types::{BodyState, math::vec2};
///
/// let state = BodyState::at(vec2(1.0, 2.0), 0.5);
/// assert_eq!(state.position.x, 1.0);
/// assert_eq!(state.angle, 0.5);
/// assert_eq!(state.velocity.norm(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// World position of the body origin.
    pub position: Vec2,
    /// World angle in radians.
    pub angle: f64,
    /// Linear velocity.
    pub velocity: Vec2,
    /// Angular velocity.
    pub angular_velocity: f64,
    /// Accumulated force for this step.
    pub force: Vec2,
    /// Accumulated torque for this step.
    pub angular_force: f64,
}

impl BodyState {
    /// A body at rest at the given pose.
    #[must_use]
    pub fn at(position: Vec2, angle: f64) -> Self {
        Self {
            position,
            angle,
            ..Default::default()
        }
    }

    /// Velocity of a point at offset `relative_point` from the origin.
    #[must_use]
    pub fn velocity_at_point(&self, relative_point: &Vec2) -> Vec2 {
        self.velocity + Vec2::new(-relative_point.y, relative_point.x) * self.angular_velocity
    }

    /// Clear accumulated force and torque.
    pub fn set_zero_force(&mut self) {
        self.force = Vec2::zeros();
        self.angular_force = 0.0;
    }
}

/// Solver-facing inverse mass data and constraint velocity accumulators.
///
/// `vlambda`/`wlambda` collect the velocity change produced by the solver
/// during one solve. They are added to the real velocity only after all
/// sweeps finish.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverState {
    /// Inverse mass seen by the solver (zero while sleeping or kinematic).
    pub inv_mass: f64,
    /// Inverse inertia seen by the solver.
    pub inv_inertia: f64,
    /// Per-axis multiplier, zero for locked axes.
    pub mass_multiplier: Vec2,
    /// Constraint linear velocity accumulator.
    pub vlambda: Vec2,
    /// Constraint angular velocity accumulator.
    pub wlambda: f64,
}

impl Default for SolverState {
    fn default() -> Self {
        Self {
            inv_mass: 0.0,
            inv_inertia: 0.0,
            mass_multiplier: Vec2::new(1.0, 1.0),
            vlambda: Vec2::zeros(),
            wlambda: 0.0,
        }
    }
}

impl SolverState {
    /// Reset the velocity accumulators.
    pub fn reset_constraint_velocity(&mut self) {
        self.vlambda = Vec2::zeros();
        self.wlambda = 0.0;
    }

    /// Accumulate one solver delta.
    ///
    /// `linear` and `angular` are the Jacobian block for this body scaled by
    /// the change in lambda.
    pub fn add_to_wlambda(&mut self, linear: &Vec2, angular: f64) {
        self.vlambda += linear.component_mul(&self.mass_multiplier) * self.inv_mass;
        self.wlambda += angular * self.inv_inertia;
    }
}
