//! Gear constraint: couples the rotation of two bodies.

use std::any::Any;

use planar_types::BodyState;

use crate::equation::UNBOUND_BODY;
use crate::{Constraint, ConstraintBase, Equation, EquationKind, SolverBody};

/// Keeps `θb = ratio·θa + angle`.
#[derive(Debug, Clone, PartialEq)]
pub struct GearConstraint {
    base: ConstraintBase,
}

impl GearConstraint {
    /// Gear the bodies with the given ratio, keeping their current angles.
    #[must_use]
    pub fn new<B: SolverBody>(body_a: &B, body_b: &B, ratio: f64) -> Self {
        let angle = body_b.state().angle - ratio * body_a.state().angle;
        let max_force = f64::MAX;
        let row = Equation::new(
            UNBOUND_BODY,
            UNBOUND_BODY,
            -max_force,
            max_force,
            EquationKind::AngleLock { angle, ratio },
        );
        Self {
            base: ConstraintBase::new(body_a.id(), body_b.id(), vec![row]),
        }
    }

    /// Override the angle offset.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.set_angle(angle);
        self
    }

    /// Set the maximum torque.
    #[must_use]
    pub fn with_max_torque(mut self, torque: f64) -> Self {
        self.set_max_torque(torque);
        self
    }

    fn params(&self) -> (f64, f64) {
        match self.base.equation(0).kind {
            EquationKind::AngleLock { angle, ratio } => (angle, ratio),
            _ => (0.0, 1.0),
        }
    }

    /// Gear ratio.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.params().1
    }

    /// Set the gear ratio.
    pub fn set_ratio(&mut self, ratio: f64) {
        let angle = self.angle();
        self.base.equation_mut(0).kind = EquationKind::AngleLock { angle, ratio };
    }

    /// Angle offset.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.params().0
    }

    /// Set the angle offset.
    pub fn set_angle(&mut self, angle: f64) {
        let ratio = self.ratio();
        self.base.equation_mut(0).kind = EquationKind::AngleLock { angle, ratio };
    }

    /// Set the maximum torque.
    pub fn set_max_torque(&mut self, torque: f64) {
        self.base.equation_mut(0).set_max_force(torque);
    }

    /// Maximum torque.
    #[must_use]
    pub fn max_torque(&self) -> f64 {
        self.base.equation(0).max_force
    }
}

impl Constraint for GearConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn update(&mut self, _state_a: &BodyState, _state_b: &BodyState) {
        // Picks up ratio changes.
        self.base.equation_mut(0).update_jacobian();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
