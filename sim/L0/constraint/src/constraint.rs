//! The constraint abstraction shared by all joints.
//!
//! A constraint owns a fixed set of [`Equation`] rows between two bodies.
//! Before every solve the world calls [`Constraint::update`] with the current
//! body states so the rows can refresh their Jacobians, position errors and
//! on/off state, then [`Constraint::bind`] with the bodies' indices in the
//! solver's body slice. Rows that are switched off (an unviolated limit, a
//! disabled motor) carry `enabled == false` and are skipped by the solver.

use std::any::Any;
use std::fmt;

use planar_types::{BodyId, BodyState};

use crate::Equation;

/// Data every constraint carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBase {
    body_a: BodyId,
    body_b: BodyId,
    collide_connected: bool,
    equations: Vec<Equation>,
}

impl ConstraintBase {
    /// Create a base for the given bodies and rows.
    ///
    /// Connected bodies keep colliding with each other by default.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId, equations: Vec<Equation>) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: true,
            equations,
        }
    }

    /// First body.
    #[must_use]
    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    /// Second body.
    #[must_use]
    pub fn body_b(&self) -> BodyId {
        self.body_b
    }

    /// Row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; each constraint only asks for
    /// rows it created.
    #[must_use]
    pub fn equation(&self, index: usize) -> &Equation {
        &self.equations[index]
    }

    /// Mutable row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn equation_mut(&mut self, index: usize) -> &mut Equation {
        &mut self.equations[index]
    }
}

/// A joint between two bodies, expressed as equation rows.
pub trait Constraint: fmt::Debug {
    /// Shared data.
    fn base(&self) -> &ConstraintBase;

    /// Mutable shared data.
    fn base_mut(&mut self) -> &mut ConstraintBase;

    /// Refresh every row from the current body states.
    fn update(&mut self, state_a: &BodyState, state_b: &BodyState);

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// First body.
    fn body_a(&self) -> BodyId {
        self.base().body_a
    }

    /// Second body.
    fn body_b(&self) -> BodyId {
        self.base().body_b
    }

    /// Whether the two bodies still collide with each other.
    fn collide_connected(&self) -> bool {
        self.base().collide_connected
    }

    /// Set whether the two bodies still collide with each other.
    fn set_collide_connected(&mut self, collide: bool) {
        self.base_mut().collide_connected = collide;
    }

    /// All rows, enabled or not.
    fn equations(&self) -> &[Equation] {
        &self.base().equations
    }

    /// All rows, mutably.
    fn equations_mut(&mut self) -> &mut [Equation] {
        &mut self.base_mut().equations
    }

    /// Point every row at the bodies' indices in the solver's body slice.
    fn bind(&mut self, index_a: usize, index_b: usize) {
        for eq in self.equations_mut() {
            eq.body_a = index_a;
            eq.body_b = index_b;
        }
    }

    /// Set the stiffness of every row.
    fn set_stiffness(&mut self, stiffness: f64) {
        for eq in self.equations_mut() {
            eq.set_stiffness(stiffness);
        }
    }

    /// Set the relaxation of every row.
    fn set_relaxation(&mut self, relaxation: f64) {
        for eq in self.equations_mut() {
            eq.set_relaxation(relaxation);
        }
    }

    /// Set the force bound magnitude of every row.
    ///
    /// One-sided rows stay one-sided.
    fn set_max_force(&mut self, max_force: f64) {
        for eq in self.equations_mut() {
            eq.set_force_magnitude(max_force);
        }
    }
}

impl dyn Constraint {
    /// Downcast to a concrete constraint type.
    #[must_use]
    pub fn downcast_ref<T: Constraint + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Mutably downcast to a concrete constraint type.
    pub fn downcast_mut<T: Constraint + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}
