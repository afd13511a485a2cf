//! Joint motors for active control.

use crate::Equation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A velocity motor that can drive a joint.
///
/// The motor owns no row of its own: the joint keeps a velocity row and the
/// motor settings are copied into it on every update. A disabled motor
/// disables its row.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointMotor {
    /// Target relative speed (rad/s or m/s).
    speed: f64,

    /// Maximum force/torque the motor can apply (N or Nm).
    max_force: f64,

    /// Whether the motor is currently enabled.
    enabled: bool,
}

impl JointMotor {
    /// Create an enabled motor.
    ///
    /// # Arguments
    ///
    /// * `speed` - Target relative speed (rad/s or m/s)
    /// * `max_force` - Maximum force/torque (N or Nm)
    #[must_use]
    pub fn velocity(speed: f64, max_force: f64) -> Self {
        Self {
            speed,
            max_force: max_force.abs(),
            enabled: true,
        }
    }

    /// Create a disabled motor (free joint).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            speed: 0.0,
            max_force: f64::MAX,
            enabled: false,
        }
    }

    /// Enable or disable the motor.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Target speed.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the target speed.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Get the maximum force/torque.
    #[must_use]
    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    /// Set the maximum force/torque.
    pub fn set_max_force(&mut self, max_force: f64) {
        self.max_force = max_force.abs();
    }

    /// Check if the motor is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the motor.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Copy the settings into a velocity row.
    ///
    /// `relative_velocity` is the value the row's constraint velocity is
    /// offset by; each joint decides how it relates to [`Self::speed`].
    pub(crate) fn apply_to(&self, eq: &mut Equation, relative_velocity: f64) {
        eq.enabled = self.enabled;
        eq.relative_velocity = relative_velocity;
        eq.set_max_force(self.max_force);
    }
}

impl Default for JointMotor {
    fn default() -> Self {
        Self::disabled()
    }
}
