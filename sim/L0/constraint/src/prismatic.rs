//! Prismatic (slider) constraint.
//!
//! Body B may only translate along an axis fixed in body A. The relative
//! rotation is locked unless the lock is disabled, the slide position can be
//! limited from either side, and a motor can drive the slide velocity.

use std::any::Any;
use std::f64::consts::FRAC_PI_2;

use planar_types::BodyState;
use planar_types::math::{Vec2, cross_length, normalize_or_zero, rotate};

use crate::equation::{ContactData, UNBOUND_BODY};
use crate::limits::JointLimits;
use crate::motor::JointMotor;
use crate::{Constraint, ConstraintBase, Equation, EquationKind, SolverBody};

const ROW_TRANSLATION: usize = 0;
const ROW_ROTATION: usize = 1;
const ROW_MOTOR: usize = 2;
const ROW_UPPER: usize = 3;
const ROW_LOWER: usize = 4;

/// Constrains body B to slide along an axis of body A.
#[derive(Debug, Clone, PartialEq)]
pub struct PrismaticConstraint {
    base: ConstraintBase,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    local_axis_a: Vec2,
    rotational_lock: bool,
    motor: JointMotor,
    limits: JointLimits,
    position: f64,
}

impl PrismaticConstraint {
    /// Slide along body A's local x axis through both body centres.
    #[must_use]
    pub fn new<B: SolverBody>(body_a: &B, body_b: &B) -> Self {
        let max_force = f64::MAX;
        let angle = body_b.state().angle - body_a.state().angle;

        let mut motor_row = Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force);
        motor_row.enabled = false;
        let mut upper = Equation::contact(UNBOUND_BODY, UNBOUND_BODY, max_force);
        upper.enabled = false;
        let mut lower = Equation::contact(UNBOUND_BODY, UNBOUND_BODY, max_force);
        lower.enabled = false;

        let equations = vec![
            Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force),
            Equation::new(
                UNBOUND_BODY,
                UNBOUND_BODY,
                -max_force,
                max_force,
                EquationKind::RotationalLock { angle },
            ),
            motor_row,
            upper,
            lower,
        ];

        let mut constraint = Self {
            base: ConstraintBase::new(body_a.id(), body_b.id(), equations),
            local_anchor_a: Vec2::zeros(),
            local_anchor_b: Vec2::zeros(),
            local_axis_a: Vec2::x(),
            rotational_lock: true,
            motor: JointMotor::disabled(),
            limits: JointLimits::unlimited(),
            position: 0.0,
        };
        constraint.position = constraint.measure(body_a.state(), body_b.state()).0;
        constraint
    }

    /// Set the anchors, each in its body's frame.
    #[must_use]
    pub fn with_local_anchors(mut self, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        self.local_anchor_a = anchor_a;
        self.local_anchor_b = anchor_b;
        self
    }

    /// Set the slide axis in body A's frame. The axis is normalized.
    #[must_use]
    pub fn with_local_axis(mut self, axis: Vec2) -> Self {
        self.local_axis_a = normalize_or_zero(&axis);
        self
    }

    /// Enable or disable the rotational lock.
    #[must_use]
    pub fn with_rotational_lock(mut self, lock: bool) -> Self {
        self.rotational_lock = lock;
        self.base.equation_mut(ROW_ROTATION).enabled = lock;
        self
    }

    /// Set slide position limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum force of the slide, lock and limit rows.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Anchor on body A.
    #[must_use]
    pub fn local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    /// Anchor on body B.
    #[must_use]
    pub fn local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    /// Slide axis in body A's frame.
    #[must_use]
    pub fn local_axis_a(&self) -> Vec2 {
        self.local_axis_a
    }

    /// Whether the relative rotation is locked.
    #[must_use]
    pub fn rotational_lock(&self) -> bool {
        self.rotational_lock
    }

    /// Slide position at the last update: the anchor separation along the axis.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Position limits.
    #[must_use]
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Set or clear both position limits.
    pub fn set_limits(&mut self, lower: Option<f64>, upper: Option<f64>) {
        self.limits.set_lower(lower);
        self.limits.set_upper(upper);
    }

    /// Start driving the slide.
    pub fn enable_motor(&mut self) {
        self.motor.set_enabled(true);
        self.sync_motor();
    }

    /// Stop driving the slide.
    pub fn disable_motor(&mut self) {
        self.motor.set_enabled(false);
        self.sync_motor();
    }

    /// Check if the motor is on.
    #[must_use]
    pub fn motor_enabled(&self) -> bool {
        self.motor.is_enabled()
    }

    /// Set the target velocity of B relative to A along the axis.
    pub fn set_motor_speed(&mut self, speed: f64) {
        self.motor.set_speed(speed);
        self.sync_motor();
    }

    /// Target slide velocity.
    #[must_use]
    pub fn motor_speed(&self) -> f64 {
        self.motor.speed()
    }

    /// Set the maximum motor force.
    pub fn set_motor_max_force(&mut self, force: f64) {
        self.motor.set_max_force(force);
        self.sync_motor();
    }

    fn sync_motor(&mut self) {
        let motor = self.motor;
        motor.apply_to(self.base.equation_mut(ROW_MOTOR), motor.speed());
    }

    /// Slide position, world axis and both world anchors relative to their bodies.
    fn measure(&self, a: &BodyState, b: &BodyState) -> (f64, Vec2, Vec2, Vec2) {
        let axis = rotate(&self.local_axis_a, a.angle);
        let ri = rotate(&self.local_anchor_a, a.angle);
        let rj = rotate(&self.local_anchor_b, b.angle);
        let separation = b.position + rj - a.position - ri;
        (separation.dot(&axis), axis, ri, rj)
    }
}

fn set_limit_row(eq: &mut Equation, normal: Vec2, contact_point_a: Vec2, contact_point_b: Vec2) {
    eq.enabled = true;
    if let Some(c) = eq.as_contact_mut() {
        c.normal_a = normal;
        c.contact_point_a = contact_point_a;
        c.contact_point_b = contact_point_b;
    } else {
        eq.kind = EquationKind::Contact(ContactData {
            normal_a: normal,
            contact_point_a,
            contact_point_b,
            ..ContactData::default()
        });
    }
}

impl Constraint for PrismaticConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn update(&mut self, state_a: &BodyState, state_b: &BodyState) {
        let (position, axis, ri, rj) = self.measure(state_a, state_b);
        self.position = position;

        // Translation orthogonal to the axis.
        let t = rotate(&self.local_axis_a, state_a.angle + FRAC_PI_2);
        let gg = state_b.position + rj - state_a.position - ri;
        let row = self.base.equation_mut(ROW_TRANSLATION);
        row.g = [
            -t.x,
            -t.y,
            -cross_length(&ri, &t) + cross_length(&t, &gg),
            t.x,
            t.y,
            cross_length(&rj, &t),
        ];
        row.kind = EquationKind::Joint {
            position_error: gg.dot(&t),
        };

        self.base.equation_mut(ROW_ROTATION).enabled = self.rotational_lock;

        let motor = self.base.equation_mut(ROW_MOTOR);
        motor.g = [
            axis.x,
            axis.y,
            cross_length(&ri, &axis),
            -axis.x,
            -axis.y,
            -cross_length(&rj, &axis),
        ];
        self.sync_motor();

        match self.limits.upper() {
            Some(upper) if position > upper => set_limit_row(
                self.base.equation_mut(ROW_UPPER),
                -axis,
                ri + axis * upper,
                rj,
            ),
            _ => self.base.equation_mut(ROW_UPPER).enabled = false,
        }
        match self.limits.lower() {
            Some(lower) if position < lower => set_limit_row(
                self.base.equation_mut(ROW_LOWER),
                axis,
                ri + axis * lower,
                rj,
            ),
            _ => self.base.equation_mut(ROW_LOWER).enabled = false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
