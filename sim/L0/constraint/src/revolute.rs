//! Revolute (hinge) constraint.
//!
//! Pins a point of body A to a point of body B and lets them rotate freely
//! around it. Optional extras:
//!
//! - a motor driving the relative angular velocity `ωb - ωa`
//! - lower and upper limits on the relative angle `θb - θa`

use std::any::Any;

use planar_types::BodyState;
use planar_types::math::{Vec2, cross_length, rotate, to_local_frame};

use crate::equation::UNBOUND_BODY;
use crate::limits::JointLimits;
use crate::motor::JointMotor;
use crate::{Constraint, ConstraintBase, Equation, EquationKind, SolverBody};

const ROW_X: usize = 0;
const ROW_Y: usize = 1;
const ROW_MOTOR: usize = 2;
const ROW_UPPER: usize = 3;
const ROW_LOWER: usize = 4;

/// Connects two bodies at a shared pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteConstraint {
    base: ConstraintBase,
    pivot_a: Vec2,
    pivot_b: Vec2,
    motor: JointMotor,
    limits: JointLimits,
    angle: f64,
}

impl RevoluteConstraint {
    /// Hinge the bodies at a world point.
    #[must_use]
    pub fn from_world_pivot<B: SolverBody>(body_a: &B, body_b: &B, pivot: Vec2) -> Self {
        let (a, b) = (body_a.state(), body_b.state());
        let pivot_a = to_local_frame(&pivot, &a.position, a.angle);
        let pivot_b = to_local_frame(&pivot, &b.position, b.angle);
        Self::from_local_pivots(body_a, body_b, pivot_a, pivot_b)
    }

    /// Hinge the bodies at a pivot given in each body's frame.
    #[must_use]
    pub fn from_local_pivots<B: SolverBody>(body_a: &B, body_b: &B, pivot_a: Vec2, pivot_b: Vec2) -> Self {
        let max_force = f64::MAX;
        let mut motor_row = Equation::new(
            UNBOUND_BODY,
            UNBOUND_BODY,
            -max_force,
            max_force,
            EquationKind::RotationalVelocity { ratio: 1.0 },
        );
        motor_row.enabled = false;
        let mut upper = Equation::new(
            UNBOUND_BODY,
            UNBOUND_BODY,
            0.0,
            max_force,
            EquationKind::RotationalLock { angle: 0.0 },
        );
        upper.enabled = false;
        let mut lower = Equation::new(
            UNBOUND_BODY,
            UNBOUND_BODY,
            -max_force,
            0.0,
            EquationKind::RotationalLock { angle: 0.0 },
        );
        lower.enabled = false;

        let equations = vec![
            Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force),
            Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force),
            motor_row,
            upper,
            lower,
        ];
        Self {
            base: ConstraintBase::new(body_a.id(), body_b.id(), equations),
            pivot_a,
            pivot_b,
            motor: JointMotor::disabled(),
            limits: JointLimits::unlimited(),
            angle: body_b.state().angle - body_a.state().angle,
        }
    }

    /// Set the maximum force of the pivot and limit rows.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Set relative angle limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Pivot in body A's frame.
    #[must_use]
    pub fn pivot_a(&self) -> Vec2 {
        self.pivot_a
    }

    /// Pivot in body B's frame.
    #[must_use]
    pub fn pivot_b(&self) -> Vec2 {
        self.pivot_b
    }

    /// Relative angle `θb - θa` at the last update.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Angle limits.
    #[must_use]
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Set or clear both angle limits.
    pub fn set_limits(&mut self, lower: Option<f64>, upper: Option<f64>) {
        self.limits.set_lower(lower);
        self.limits.set_upper(upper);
    }

    /// Motor settings.
    #[must_use]
    pub fn motor(&self) -> &JointMotor {
        &self.motor
    }

    /// Start driving the joint.
    pub fn enable_motor(&mut self) {
        self.motor.set_enabled(true);
        self.sync_motor();
    }

    /// Stop driving the joint.
    pub fn disable_motor(&mut self) {
        self.motor.set_enabled(false);
        self.sync_motor();
    }

    /// Check if the motor is on.
    #[must_use]
    pub fn motor_enabled(&self) -> bool {
        self.motor.is_enabled()
    }

    /// Set the target relative angular velocity `ωb - ωa`.
    pub fn set_motor_speed(&mut self, speed: f64) {
        self.motor.set_speed(speed);
        self.sync_motor();
    }

    /// Target relative angular velocity.
    #[must_use]
    pub fn motor_speed(&self) -> f64 {
        self.motor.speed()
    }

    /// Set the maximum motor torque.
    pub fn set_motor_max_torque(&mut self, torque: f64) {
        self.motor.set_max_force(torque);
        self.sync_motor();
    }

    fn sync_motor(&mut self) {
        let motor = self.motor;
        // The row drives -ωa + ωb + relative_velocity to zero.
        motor.apply_to(self.base.equation_mut(ROW_MOTOR), -motor.speed());
    }
}

fn set_lock_angle(eq: &mut Equation, limit: Option<f64>, violated: bool) {
    match limit {
        Some(limit) if violated => {
            eq.kind = EquationKind::RotationalLock { angle: limit };
            eq.enabled = true;
        }
        _ => eq.enabled = false,
    }
}

impl Constraint for RevoluteConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn update(&mut self, state_a: &BodyState, state_b: &BodyState) {
        let wpa = rotate(&self.pivot_a, state_a.angle);
        let wpb = rotate(&self.pivot_b, state_b.angle);
        let gap = state_b.position + wpb - state_a.position - wpa;

        let x = self.base.equation_mut(ROW_X);
        x.g = [
            -1.0,
            0.0,
            -cross_length(&wpa, &Vec2::x()),
            1.0,
            0.0,
            cross_length(&wpb, &Vec2::x()),
        ];
        x.kind = EquationKind::Joint { position_error: gap.x };

        let y = self.base.equation_mut(ROW_Y);
        y.g = [
            0.0,
            -1.0,
            -cross_length(&wpa, &Vec2::y()),
            0.0,
            1.0,
            cross_length(&wpb, &Vec2::y()),
        ];
        y.kind = EquationKind::Joint { position_error: gap.y };

        self.angle = state_b.angle - state_a.angle;
        let upper = self.limits.upper();
        let lower = self.limits.lower();
        let angle = self.angle;
        set_lock_angle(
            self.base.equation_mut(ROW_UPPER),
            upper,
            upper.is_some_and(|u| angle > u),
        );
        set_lock_angle(
            self.base.equation_mut(ROW_LOWER),
            lower,
            lower.is_some_and(|l| angle < l),
        );

        self.sync_motor();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
