//! Lock constraint: welds two bodies together.

use std::any::Any;

use planar_types::BodyState;
use planar_types::math::{Vec2, cross_length, rotate, to_local_frame};

use crate::equation::UNBOUND_BODY;
use crate::{Constraint, ConstraintBase, Equation, EquationKind, SolverBody};

const ROW_X: usize = 0;
const ROW_Y: usize = 1;
const ROW_ROTATION: usize = 2;

/// Holds body B at a fixed offset and angle in body A's frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LockConstraint {
    base: ConstraintBase,
    local_offset_b: Vec2,
    local_angle_b: f64,
}

impl LockConstraint {
    /// Lock the bodies in their current relative pose.
    #[must_use]
    pub fn new<B: SolverBody>(body_a: &B, body_b: &B) -> Self {
        let (a, b) = (body_a.state(), body_b.state());
        let local_offset_b = to_local_frame(&b.position, &a.position, a.angle);
        let local_angle_b = b.angle - a.angle;
        let max_force = f64::MAX;
        let equations = vec![
            Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force),
            Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force),
            Equation::new(
                UNBOUND_BODY,
                UNBOUND_BODY,
                -max_force,
                max_force,
                EquationKind::RotationalLock {
                    angle: local_angle_b,
                },
            ),
        ];
        Self {
            base: ConstraintBase::new(body_a.id(), body_b.id(), equations),
            local_offset_b,
            local_angle_b,
        }
    }

    /// Set the maximum force of every row.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Position of B in A's frame.
    #[must_use]
    pub fn local_offset_b(&self) -> Vec2 {
        self.local_offset_b
    }

    /// Set the position of B in A's frame.
    pub fn set_relative_offset(&mut self, offset: Vec2) {
        self.local_offset_b = offset;
    }

    /// Angle of B relative to A.
    #[must_use]
    pub fn local_angle_b(&self) -> f64 {
        self.local_angle_b
    }

    /// Set the angle of B relative to A.
    pub fn set_relative_angle(&mut self, angle: f64) {
        self.local_angle_b = angle;
    }
}

impl Constraint for LockConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn update(&mut self, state_a: &BodyState, state_b: &BodyState) {
        let l = rotate(&self.local_offset_b, state_a.angle);
        let error = state_b.position - state_a.position - l;

        let x = self.base.equation_mut(ROW_X);
        x.g = [-1.0, 0.0, -cross_length(&l, &Vec2::x()), 1.0, 0.0, 0.0];
        x.kind = EquationKind::Joint {
            position_error: error.x,
        };

        let y = self.base.equation_mut(ROW_Y);
        y.g = [0.0, -1.0, -cross_length(&l, &Vec2::y()), 0.0, 1.0, 0.0];
        y.kind = EquationKind::Joint {
            position_error: error.y,
        };

        self.base.equation_mut(ROW_ROTATION).kind = EquationKind::RotationalLock {
            angle: self.local_angle_b,
        };
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
