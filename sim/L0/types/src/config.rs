//! Configuration types for a world.
//!
//! This module provides configuration types that control how a world steps:
//! gravity, sleeping, island splitting, broadphase selection, solver
//! settings and the fallback contact material.

use crate::aabb::Axis;
use crate::material::ContactMaterialParams;
use crate::math::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How bodies are put to sleep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SleepMode {
    /// Bodies never sleep. The sleep state machine is not ticked.
    #[default]
    NoSleeping,
    /// Every body sleeps on its own once it has been idle long enough.
    BodySleeping,
    /// A connected island sleeps only when every body in it wants to.
    ///
    /// Requires island splitting.
    IslandSleeping,
}

/// Broadphase algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BroadphaseKind {
    /// Test every pair of bodies.
    Naive,
    /// Sweep and prune along one axis.
    #[default]
    SweepAndPrune,
}

/// Bounding volume used by the broadphase overlap check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundingVolume {
    /// Axis-aligned bounding boxes.
    #[default]
    Aabb,
    /// Circles of each body's bounding radius.
    BoundingCircle,
}

/// Main configuration for a world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Gravity acceleration (m/s²).
    pub gravity: Vec2,
    /// Sleep mode.
    pub sleep_mode: SleepMode,
    /// Split the equation set into independent islands before solving.
    pub island_split: bool,
    /// Broadphase algorithm.
    pub broadphase: BroadphaseKind,
    /// Bounding volume used by the broadphase.
    pub bounding_volume: BoundingVolume,
    /// Sort axis for sweep and prune.
    pub sap_axis: Axis,
    /// Solver configuration.
    pub solver: SolverConfig,
    /// Use the gravity vector's length as the friction gravity each step.
    pub use_world_gravity_as_friction_gravity: bool,
    /// Fall back to `friction_gravity` when gravity is zero.
    pub use_friction_gravity_on_zero_gravity: bool,
    /// Gravity magnitude used to scale friction slip forces.
    pub friction_gravity: f64,
    /// Apply gravity to dynamic bodies.
    pub apply_gravity: bool,
    /// Apply linear and angular damping.
    pub apply_damping: bool,
    /// Apply spring forces.
    pub apply_spring_forces: bool,
    /// Run the solver at all.
    pub solve_constraints: bool,
    /// Emit an impact event on the first step of every contact.
    pub emit_impact_event: bool,
    /// Replace per-contact friction rows with one averaged row per shape pair.
    pub enable_friction_reduction: bool,
    /// Parameters used when no contact material matches a shape pair.
    pub default_contact_material: ContactMaterialParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.78),
            sleep_mode: SleepMode::NoSleeping,
            island_split: true,
            broadphase: BroadphaseKind::SweepAndPrune,
            bounding_volume: BoundingVolume::Aabb,
            sap_axis: Axis::X,
            solver: SolverConfig::default(),
            use_world_gravity_as_friction_gravity: true,
            use_friction_gravity_on_zero_gravity: true,
            friction_gravity: 9.78,
            apply_gravity: true,
            apply_damping: true,
            apply_spring_forces: true,
            solve_constraints: true,
            emit_impact_event: true,
            enable_friction_reduction: true,
            default_contact_material: ContactMaterialParams::default(),
        }
    }
}

impl WorldConfig {
    /// A world without gravity.
    #[must_use]
    pub fn zero_gravity() -> Self {
        Self {
            gravity: Vec2::zeros(),
            ..Default::default()
        }
    }

    /// More solver iterations and a tighter tolerance.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            solver: SolverConfig::high_accuracy(),
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the sleep mode.
    #[must_use]
    pub fn with_sleep_mode(mut self, sleep_mode: SleepMode) -> Self {
        self.sleep_mode = sleep_mode;
        self
    }

    /// Enable or disable island splitting.
    #[must_use]
    pub fn with_island_split(mut self, island_split: bool) -> Self {
        self.island_split = island_split;
        self
    }

    /// Set the broadphase algorithm.
    #[must_use]
    pub fn with_broadphase(mut self, broadphase: BroadphaseKind) -> Self {
        self.broadphase = broadphase;
        self
    }

    /// Set the broadphase bounding volume.
    #[must_use]
    pub fn with_bounding_volume(mut self, bounding_volume: BoundingVolume) -> Self {
        self.bounding_volume = bounding_volume;
        self
    }

    /// Set the sweep and prune axis.
    #[must_use]
    pub fn with_sap_axis(mut self, axis: Axis) -> Self {
        self.sap_axis = axis;
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Set the fallback contact material.
    #[must_use]
    pub fn with_default_contact_material(mut self, params: ContactMaterialParams) -> Self {
        self.default_contact_material = params;
        self
    }

    /// Enable or disable friction reduction.
    #[must_use]
    pub fn with_friction_reduction(mut self, enabled: bool) -> Self {
        self.enable_friction_reduction = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.gravity.x.is_finite() || !self.gravity.y.is_finite() {
            return Err(crate::SimError::invalid_config("gravity must be finite"));
        }

        if !(self.friction_gravity >= 0.0) {
            return Err(crate::SimError::invalid_config(
                "friction_gravity cannot be negative",
            ));
        }

        self.solver.validate()?;
        self.default_contact_material.validate()?;

        Ok(())
    }
}

/// Configuration for the Gauss-Seidel solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Maximum number of Gauss-Seidel sweeps.
    pub iterations: usize,
    /// Early-exit threshold on the summed per-sweep lambda change.
    ///
    /// The sweep loop stops once `(Σ|Δλ|)² < (tolerance · N)²`. A tolerance
    /// of zero always runs every iteration.
    pub tolerance: f64,
    /// Sweeps of the contact-only pre-pass used to estimate normal forces
    /// for friction. Zero disables the pre-pass.
    pub friction_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            tolerance: 1e-7,
            friction_iterations: 0,
        }
    }
}

impl SolverConfig {
    /// Create a high-accuracy solver configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            iterations: 40,
            tolerance: 1e-10,
            friction_iterations: 5,
        }
    }

    /// Create a fast solver configuration.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            iterations: 4,
            tolerance: 1e-5,
            friction_iterations: 0,
        }
    }

    /// Set the number of solver iterations.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the number of friction pre-pass iterations.
    #[must_use]
    pub fn with_friction_iterations(mut self, friction_iterations: usize) -> Self {
        self.friction_iterations = friction_iterations;
        self
    }

    /// Validate the solver configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.iterations == 0 {
            return Err(crate::SimError::invalid_config(
                "iterations must be at least 1",
            ));
        }

        if !(self.tolerance >= 0.0) {
            return Err(crate::SimError::invalid_config(
                "tolerance cannot be negative",
            ));
        }

        Ok(())
    }
}
