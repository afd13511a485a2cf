//! Damped springs between two bodies.
//!
//! Springs are not solver rows. The world applies their forces before the
//! broadphase, together with gravity.

use planar_types::math::{Vec2, cross_zv, normalize_or_zero, to_global_frame, to_local_frame};
use planar_types::BodyId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Default spring stiffness.
pub const DEFAULT_SPRING_STIFFNESS: f64 = 100.0;

/// Default spring damping.
pub const DEFAULT_SPRING_DAMPING: f64 = 1.0;

/// Geometry of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpringKind {
    /// Pulls two anchor points towards `rest_length` apart.
    Linear {
        /// Anchor on body A, body frame.
        local_anchor_a: Vec2,
        /// Anchor on body B, body frame.
        local_anchor_b: Vec2,
        /// Length at which the spring exerts no force.
        rest_length: f64,
    },
    /// Pulls the relative angle `angle_b - angle_a` towards `rest_angle`.
    Rotational {
        /// Relative angle at which the spring exerts no torque.
        rest_angle: f64,
    },
}

/// A linear or rotational spring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spring {
    body_a: BodyId,
    body_b: BodyId,
    /// Hooke constant.
    pub stiffness: f64,
    /// Relative velocity damping.
    pub damping: f64,
    /// Geometry.
    pub kind: SpringKind,
}

impl Spring {
    /// A linear spring between the body origins.
    ///
    /// The rest length is the current distance between the anchors.
    #[must_use]
    pub fn linear(body_a: &Body, body_b: &Body) -> Self {
        Self::linear_with_local_anchors(body_a, body_b, Vec2::zeros(), Vec2::zeros())
    }

    /// A linear spring between two body-frame anchors.
    #[must_use]
    pub fn linear_with_local_anchors(body_a: &Body, body_b: &Body, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        let world_a = body_a.to_world_frame(&anchor_a);
        let world_b = body_b.to_world_frame(&anchor_b);
        Self {
            body_a: body_a.id(),
            body_b: body_b.id(),
            stiffness: DEFAULT_SPRING_STIFFNESS,
            damping: DEFAULT_SPRING_DAMPING,
            kind: SpringKind::Linear {
                local_anchor_a: anchor_a,
                local_anchor_b: anchor_b,
                rest_length: (world_b - world_a).norm(),
            },
        }
    }

    /// A linear spring between two world-space anchors.
    #[must_use]
    pub fn linear_with_world_anchors(body_a: &Body, body_b: &Body, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self::linear_with_local_anchors(
            body_a,
            body_b,
            to_local_frame(&anchor_a, &body_a.position(), body_a.angle()),
            to_local_frame(&anchor_b, &body_b.position(), body_b.angle()),
        )
    }

    /// A rotational spring holding the current relative angle.
    #[must_use]
    pub fn rotational(body_a: &Body, body_b: &Body) -> Self {
        Self {
            body_a: body_a.id(),
            body_b: body_b.id(),
            stiffness: DEFAULT_SPRING_STIFFNESS,
            damping: DEFAULT_SPRING_DAMPING,
            kind: SpringKind::Rotational {
                rest_angle: body_b.angle() - body_a.angle(),
            },
        }
    }

    /// Set the stiffness.
    #[must_use]
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Set the damping.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Override the rest length or rest angle.
    #[must_use]
    pub fn with_rest(mut self, rest: f64) -> Self {
        match &mut self.kind {
            SpringKind::Linear { rest_length, .. } => *rest_length = rest,
            SpringKind::Rotational { rest_angle } => *rest_angle = rest,
        }
        self
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

    /// Add the spring force to both bodies.
    pub fn apply_force(&self, a: &mut Body, b: &mut Body) {
        match self.kind {
            SpringKind::Linear {
                local_anchor_a,
                local_anchor_b,
                rest_length,
            } => {
                let world_a = to_global_frame(&local_anchor_a, &a.position(), a.angle());
                let world_b = to_global_frame(&local_anchor_b, &b.position(), b.angle());
                let ri = world_a - a.position();
                let rj = world_b - b.position();
                let r = world_b - world_a;
                let length = r.norm();
                let direction = normalize_or_zero(&r);

                let relative_velocity = b.velocity() + cross_zv(b.angular_velocity(), &rj)
                    - a.velocity()
                    - cross_zv(a.angular_velocity(), &ri);
                let magnitude =
                    -self.stiffness * (length - rest_length) - self.damping * relative_velocity.dot(&direction);
                let force = direction * magnitude;

                a.apply_force(&-force, &ri);
                b.apply_force(&force, &rj);
            }
            SpringKind::Rotational { rest_angle } => {
                let relative_angle = b.angle() - a.angle();
                let relative_velocity = b.angular_velocity() - a.angular_velocity();
                let torque = -self.stiffness * (relative_angle - rest_angle) - self.damping * relative_velocity;
                a.apply_torque(-torque);
                b.apply_torque(torque);
            }
        }
    }
}
