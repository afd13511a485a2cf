//! The view of a body the solver works through.

use planar_types::{BodyId, BodyState, SolverState};

/// Access to the parts of a rigid body the solver reads and writes.
///
/// Equations address bodies by their index into the slice passed to the
/// solver. The solver only ever touches the [`SolverState`] accumulators
/// during iteration and merges them into the real velocity at the end.
pub trait SolverBody {
    /// World handle of the body.
    fn id(&self) -> BodyId;

    /// Kinematic state.
    fn state(&self) -> &BodyState;

    /// Mutable kinematic state.
    fn state_mut(&mut self) -> &mut BodyState;

    /// Solver accumulators and inverse mass data.
    fn solver_state(&self) -> &SolverState;

    /// Mutable solver accumulators.
    fn solver_state_mut(&mut self) -> &mut SolverState;

    /// Refresh the inverse mass data the solver sees.
    ///
    /// Called once per solve before any equation is prepared.
    fn update_solve_mass_properties(&mut self);

    /// Clear the constraint velocity accumulators.
    fn reset_constraint_velocity(&mut self) {
        self.solver_state_mut().reset_constraint_velocity();
    }

    /// Add the accumulated constraint velocity to the real velocity.
    fn add_constraint_velocity(&mut self) {
        let solver = *self.solver_state();
        let state = self.state_mut();
        state.velocity += solver.vlambda;
        state.angular_velocity += solver.wlambda;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SolverBody;
    use planar_types::{BodyId, BodyState, SolverState, Vec2};

    /// Minimal body for exercising equations and constraints in isolation.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct TestBody {
        pub id: BodyId,
        pub state: BodyState,
        pub solver: SolverState,
        pub inv_mass: f64,
        pub inv_inertia: f64,
    }

    impl TestBody {
        pub(crate) fn dynamic(position: Vec2, mass: f64, inertia: f64) -> Self {
            Self {
                id: BodyId::default(),
                state: BodyState::at(position, 0.0),
                solver: SolverState::default(),
                inv_mass: 1.0 / mass,
                inv_inertia: 1.0 / inertia,
            }
        }

        pub(crate) fn with_id(mut self, id: u64) -> Self {
            self.id = BodyId::new(id);
            self
        }

        pub(crate) fn fixed(position: Vec2) -> Self {
            Self {
                state: BodyState::at(position, 0.0),
                ..Default::default()
            }
        }
    }

    impl SolverBody for TestBody {
        fn id(&self) -> BodyId {
            self.id
        }

        fn state(&self) -> &BodyState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut BodyState {
            &mut self.state
        }

        fn solver_state(&self) -> &SolverState {
            &self.solver
        }

        fn solver_state_mut(&mut self) -> &mut SolverState {
            &mut self.solver
        }

        fn update_solve_mass_properties(&mut self) {
            self.solver.inv_mass = self.inv_mass;
            self.solver.inv_inertia = self.inv_inertia;
        }
    }
}
