//! Projected Gauss-Seidel solver for equation rows.
//!
//! # Algorithm
//!
//! For every enabled equation `i` the solver precomputes
//!
//! ```text
//! B_i    = -Gq·a - GW·b - GiMf·h
//! invC_i = 1 / (G M⁻¹ Gᵀ + eps)
//! bounds = [min_force·h, max_force·h]
//! ```
//!
//! and then sweeps the rows in order, up to `iterations` times:
//!
//! ```text
//! Δλ_i = invC_i (B_i - G·Wλ - eps·λ_i)
//! λ_i  = clamp(λ_i + Δλ_i, bounds)
//! Wλ  += M⁻¹ Gᵀ Δλ_i               (applied delta only)
//! ```
//!
//! The sweep loop stops early once `(Σ|Δλ|)² < (tolerance·N)²`. After the
//! sweeps, each body's `Wλ` accumulator is added to its velocity and every
//! row's multiplier becomes `λ / h`.
//!
//! An optional friction pre-pass sweeps the contact rows alone to estimate
//! normal forces, then bounds each friction row by
//! `μ · Σ(normal multipliers) / n` before the main sweeps.

use hashbrown::HashMap;
use tracing::trace;

use planar_types::SolverConfig;

use crate::{Equation, SolverBody};

/// Result of one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Sweeps performed, friction pre-pass included, summed over islands.
    pub used_iterations: usize,
    /// Enabled equations that took part.
    pub equations: usize,
    /// Independent groups solved.
    pub islands: usize,
}

/// Gauss-Seidel equation solver.
#[derive(Debug, Clone, Default)]
pub struct GaussSeidelSolver {
    config: SolverConfig,
    last_stats: SolverStats,
    normal_forces: HashMap<usize, f64>,
}

impl GaussSeidelSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            last_stats: SolverStats::default(),
            normal_forces: HashMap::new(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    /// Statistics of the most recent solve.
    #[must_use]
    pub fn last_stats(&self) -> SolverStats {
        self.last_stats
    }

    /// Solve one set of equations.
    ///
    /// `bodies` is the slice the equations' body indices refer to.
    pub fn solve<B: SolverBody>(
        &mut self,
        h: f64,
        equations: &mut [&mut Equation],
        bodies: &mut [B],
    ) -> SolverStats {
        let mut group: Vec<&mut Equation> = equations.iter_mut().map(|e| &mut **e).collect();
        self.solve_islands(h, std::slice::from_mut(&mut group), bodies)
    }

    /// Solve independent groups of equations one after another.
    ///
    /// Body preparation and the final velocity update happen once for the
    /// whole body slice; each group converges on its own.
    pub fn solve_islands<B: SolverBody>(
        &mut self,
        h: f64,
        groups: &mut [Vec<&mut Equation>],
        bodies: &mut [B],
    ) -> SolverStats {
        let mut stats = SolverStats::default();
        let total: usize = groups
            .iter()
            .map(|g| g.iter().filter(|e| e.enabled).count())
            .sum();

        if total == 0 {
            self.last_stats = stats;
            return stats;
        }

        for body in bodies.iter_mut() {
            body.update_solve_mass_properties();
            body.reset_constraint_velocity();
        }

        for group in groups.iter_mut() {
            let mut active: Vec<&mut Equation> = group
                .iter_mut()
                .filter(|e| e.enabled)
                .map(|e| &mut **e)
                .collect();
            if active.is_empty() {
                continue;
            }
            stats.equations += active.len();
            stats.islands += 1;
            stats.used_iterations += self.solve_group(h, &mut active, bodies);
        }

        for body in bodies.iter_mut() {
            body.add_constraint_velocity();
        }

        trace!(
            equations = stats.equations,
            islands = stats.islands,
            iterations = stats.used_iterations,
            "solved"
        );
        self.last_stats = stats;
        stats
    }

    fn solve_group<B: SolverBody>(
        &mut self,
        h: f64,
        equations: &mut [&mut Equation],
        bodies: &mut [B],
    ) -> usize {
        let n = equations.len();
        let tol_squared = (self.config.tolerance * n as f64).powi(2);
        let mut used = 0;

        for eq in equations.iter_mut() {
            eq.prepare(bodies, h);
        }

        if self.config.friction_iterations > 0 {
            for _ in 0..self.config.friction_iterations {
                let mut delta_total = 0.0;
                for eq in equations.iter_mut().filter(|e| e.is_contact()) {
                    delta_total += eq.iterate(bodies).abs();
                }
                used += 1;
                if delta_total * delta_total <= tol_squared {
                    break;
                }
            }
            update_multipliers(equations, h);
            self.apply_friction_bounds(equations, h);
        }

        for _ in 0..self.config.iterations {
            let mut delta_total = 0.0;
            for eq in equations.iter_mut() {
                delta_total += eq.iterate(bodies).abs();
            }
            used += 1;
            if delta_total * delta_total < tol_squared {
                break;
            }
        }

        update_multipliers(equations, h);
        used
    }

    /// Bound each friction row by the solved normal forces of its contacts.
    fn apply_friction_bounds(&mut self, equations: &mut [&mut Equation], h: f64) {
        self.normal_forces.clear();
        for eq in equations.iter() {
            if let Some(c) = eq.as_contact() {
                self.normal_forces.insert(c.index, eq.multiplier);
            }
        }
        for eq in equations.iter_mut() {
            let Some(f) = eq.as_friction() else {
                continue;
            };
            if f.contacts.is_empty() {
                continue;
            }
            let sum: f64 = f
                .contacts
                .iter()
                .map(|i| self.normal_forces.get(i).copied().unwrap_or(0.0))
                .sum();
            let slip = f.friction_coefficient * sum / f.contacts.len() as f64;
            eq.set_slip_force(slip);
            eq.max_force_dt = eq.max_force * h;
            eq.min_force_dt = eq.min_force * h;
        }
    }
}

fn update_multipliers(equations: &mut [&mut Equation], h: f64) {
    let inv_h = 1.0 / h;
    for eq in equations.iter_mut() {
        eq.multiplier = eq.lambda * inv_h;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::body::test_support::TestBody;
    use crate::equation::EquationKind;
    use approx::assert_relative_eq;
    use planar_types::math::vec2;

    fn resting_contact() -> (Vec<TestBody>, Equation) {
        let mut bodies = vec![
            TestBody::fixed(vec2(0.0, 0.0)),
            TestBody::dynamic(vec2(0.0, 1.0), 1.0, 1.0),
        ];
        bodies[1].state.velocity = vec2(0.0, -1.0);
        let mut eq = Equation::contact(0, 1, f64::MAX);
        let c = eq.as_contact_mut().unwrap();
        c.normal_a = vec2(0.0, 1.0);
        c.contact_point_a = vec2(0.0, 0.5);
        c.contact_point_b = vec2(0.0, -0.5);
        (bodies, eq)
    }

    #[test]
    fn test_contact_stops_approach() {
        let (mut bodies, mut eq) = resting_contact();
        let mut solver = GaussSeidelSolver::new(SolverConfig::default().with_iterations(20));
        let stats = solver.solve(1.0 / 60.0, &mut [&mut eq], &mut bodies);
        assert_eq!(stats.equations, 1);
        assert!(eq.multiplier > 0.0);
        // Most of the approach velocity is removed in one step.
        assert!(bodies[1].state.velocity.y > -0.1);
        assert_eq!(bodies[0].state.velocity, vec2(0.0, 0.0));
    }

    #[test]
    fn test_disabled_equations_are_skipped() {
        let (mut bodies, mut eq) = resting_contact();
        eq.enabled = false;
        let mut solver = GaussSeidelSolver::default();
        let stats = solver.solve(1.0 / 60.0, &mut [&mut eq], &mut bodies);
        assert_eq!(stats, SolverStats::default());
        assert_eq!(bodies[1].state.velocity, vec2(0.0, -1.0));
    }

    #[test]
    fn test_zero_tolerance_uses_every_iteration() {
        let (mut bodies, mut eq) = resting_contact();
        let mut solver = GaussSeidelSolver::new(
            SolverConfig::default().with_iterations(7).with_tolerance(0.0),
        );
        let stats = solver.solve(1.0 / 60.0, &mut [&mut eq], &mut bodies);
        assert_eq!(stats.used_iterations, 7);
    }

    #[test]
    fn test_friction_prepass_sets_slip_force() {
        let (mut bodies, mut contact) = resting_contact();
        contact.as_contact_mut().unwrap().index = 0;
        let mut friction = Equation::friction(0, 1);
        {
            let f = friction.as_friction_mut().unwrap();
            f.t = vec2(1.0, 0.0);
            f.contact_point_a = vec2(0.0, 0.5);
            f.contact_point_b = vec2(0.0, -0.5);
            f.friction_coefficient = 0.5;
            f.contacts.push(0);
        }
        let mut solver = GaussSeidelSolver::new(
            SolverConfig::default()
                .with_friction_iterations(5)
                .with_tolerance(0.0),
        );
        let stats = solver.solve(1.0 / 60.0, &mut [&mut contact, &mut friction], &mut bodies);
        // The pre-pass may converge early; the main pass never does at zero tolerance.
        assert!(stats.used_iterations > 10 && stats.used_iterations <= 15);
        assert!(friction.slip_force() > 0.0);
        assert!(friction.min_force < 0.0);
        assert!(
            matches!(friction.kind, EquationKind::Friction(_)),
            "kind must survive the solve"
        );
    }

    #[test]
    fn test_islands_are_counted() {
        let mut bodies = vec![
            TestBody::fixed(vec2(0.0, 0.0)),
            TestBody::dynamic(vec2(0.0, 1.0), 1.0, 1.0),
            TestBody::dynamic(vec2(5.0, 1.0), 1.0, 1.0),
        ];
        bodies[1].state.velocity = vec2(0.0, -1.0);
        bodies[2].state.velocity = vec2(0.0, -1.0);
        let make = |b: usize| {
            let mut eq = Equation::contact(0, b, f64::MAX);
            let c = eq.as_contact_mut().unwrap();
            c.normal_a = vec2(0.0, 1.0);
            c.contact_point_a = vec2(0.0, 0.5);
            c.contact_point_b = vec2(0.0, -0.5);
            eq
        };
        let mut e1 = make(1);
        let mut e2 = make(2);
        let mut solver = GaussSeidelSolver::default();
        let mut groups = vec![vec![&mut e1], vec![&mut e2]];
        let stats = solver.solve_islands(1.0 / 60.0, &mut groups, &mut bodies);
        assert_eq!(stats.islands, 2);
        assert_eq!(stats.equations, 2);
        assert_relative_eq!(bodies[1].state.velocity.y, bodies[2].state.velocity.y, epsilon = 1e-12);
    }
}
