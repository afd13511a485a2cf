//! Distance constraint.
//!
//! Keeps two anchor points at a fixed distance, like a rigid rod between
//! them. With limits enabled it becomes a rope (upper only) or a strut
//! (lower only), acting only while the distance is outside the range.

use std::any::Any;

use planar_types::BodyState;
use planar_types::math::{Vec2, cross_length, normalize_or_zero, rotate};

use crate::equation::UNBOUND_BODY;
use crate::limits::{JointLimits, LimitState};
use crate::{Constraint, ConstraintBase, Equation, EquationKind, SolverBody};

/// Holds two anchor points at a given distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    base: ConstraintBase,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    distance: f64,
    max_force: f64,
    limits: JointLimits,
    position: f64,
}

impl DistanceConstraint {
    /// Connect the bodies' centres at their current distance.
    #[must_use]
    pub fn new<B: SolverBody>(body_a: &B, body_b: &B) -> Self {
        Self::with_anchors(body_a, body_b, Vec2::zeros(), Vec2::zeros())
    }

    /// Connect two body-local anchors at their current distance.
    #[must_use]
    pub fn with_anchors<B: SolverBody>(
        body_a: &B,
        body_b: &B,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    ) -> Self {
        let distance = anchor_separation(
            body_a.state(),
            body_b.state(),
            &local_anchor_a,
            &local_anchor_b,
        )
        .norm();
        let max_force = f64::MAX;
        Self {
            base: ConstraintBase::new(
                body_a.id(),
                body_b.id(),
                vec![Equation::joint(UNBOUND_BODY, UNBOUND_BODY, max_force)],
            ),
            local_anchor_a,
            local_anchor_b,
            distance,
            max_force,
            limits: JointLimits::unlimited(),
            position: distance,
        }
    }

    /// Override the target distance.
    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Set the maximum force.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.set_max_force(max_force);
        self
    }

    /// Set length limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Target distance.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Set the target distance.
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    /// Maximum force.
    #[must_use]
    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    /// Length limits.
    #[must_use]
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Mutable length limits.
    pub fn limits_mut(&mut self) -> &mut JointLimits {
        &mut self.limits
    }

    /// Anchor on body A, body frame.
    #[must_use]
    pub fn local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    /// Anchor on body B, body frame.
    #[must_use]
    pub fn local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    /// Anchor distance measured at the last update.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }
}

fn anchor_separation(a: &BodyState, b: &BodyState, anchor_a: &Vec2, anchor_b: &Vec2) -> Vec2 {
    let ri = rotate(anchor_a, a.angle);
    let rj = rotate(anchor_b, b.angle);
    b.position + rj - a.position - ri
}

impl Constraint for DistanceConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn update(&mut self, state_a: &BodyState, state_b: &BodyState) {
        let ri = rotate(&self.local_anchor_a, state_a.angle);
        let rj = rotate(&self.local_anchor_b, state_b.angle);
        let separation = state_b.position + rj - state_a.position - ri;
        self.position = separation.norm();

        let max_force = self.max_force;
        let state = self.limits.state(self.position);
        let eq = self.base.equation_mut(0);

        let target = match state {
            LimitState::AtUpper(_) => {
                eq.min_force = -max_force;
                eq.max_force = 0.0;
                self.limits.upper().unwrap_or(self.distance)
            }
            LimitState::AtLower(_) => {
                eq.min_force = 0.0;
                eq.max_force = max_force;
                self.limits.lower().unwrap_or(self.distance)
            }
            LimitState::Free if self.limits.is_enabled() => {
                eq.enabled = false;
                return;
            }
            LimitState::Free => {
                eq.set_max_force(max_force);
                self.distance
            }
        };
        eq.enabled = true;

        let n = normalize_or_zero(&separation);
        eq.g = [
            -n.x,
            -n.y,
            -cross_length(&ri, &n),
            n.x,
            n.y,
            cross_length(&rj, &n),
        ];
        eq.kind = EquationKind::Joint {
            position_error: self.position - target,
        };
    }

    fn set_max_force(&mut self, max_force: f64) {
        self.max_force = max_force;
        self.base.equation_mut(0).set_max_force(max_force);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
