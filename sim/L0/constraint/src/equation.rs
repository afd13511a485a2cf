//! Scalar constraint rows.
//!
//! An [`Equation`] is one row of the velocity-level system the solver works
//! on. It couples two bodies through a 6-entry Jacobian `G`
//! (`[vx_a, vy_a, ω_a, vx_b, vy_b, ω_b]`) and is softened by the SPOOK
//! parameters derived from its stiffness `k` and relaxation `d`:
//!
//! ```text
//! a   = 4 / (h (1 + 4d))
//! b   = 4d / (1 + 4d)
//! eps = 4 / (h² k (1 + 4d))
//!
//! B   = -Gq·a - GW·b - GiMf·h
//! ```
//!
//! `Gq` is the position error of the row, `GW` its constraint-space velocity
//! and `GiMf` the constraint-space response to the bodies' external forces.
//! What `Gq` means, and how `G` is refreshed, depends on the [`EquationKind`].

use planar_types::math::{Vec2, cross_length, rotate};
use planar_types::{BodyId, ShapeId};
use smallvec::SmallVec;

use crate::SolverBody;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stiffness given to new equations.
pub const DEFAULT_STIFFNESS: f64 = 1e6;

/// Relaxation given to new equations.
pub const DEFAULT_RELAXATION: f64 = 4.0;

/// Body index of an equation that is not attached to anything.
pub const UNBOUND_BODY: usize = usize::MAX;

/// SPOOK coefficients for one stiffness/relaxation/timestep combination.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spook {
    /// Position error gain.
    pub a: f64,
    /// Velocity error gain.
    pub b: f64,
    /// Regularization.
    pub epsilon: f64,
}

impl Spook {
    /// Compute the coefficients.
    #[must_use]
    pub fn new(stiffness: f64, relaxation: f64, h: f64) -> Self {
        let denom = 1.0 + 4.0 * relaxation;
        Self {
            a: 4.0 / (h * denom),
            b: (4.0 * relaxation) / denom,
            epsilon: 4.0 / (h * h * stiffness * denom),
        }
    }
}

/// Data carried by a contact row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactData {
    /// Restitution applied on the first step of the contact.
    pub restitution: f64,
    /// Whether the two bodies were not touching on the previous step.
    pub first_impact: bool,
    /// Contact normal, pointing out of body A.
    pub normal_a: Vec2,
    /// Contact point on A, relative to A's position.
    pub contact_point_a: Vec2,
    /// Contact point on B, relative to B's position.
    pub contact_point_b: Vec2,
    /// Shape on body A.
    pub shape_a: ShapeId,
    /// Shape on body B.
    pub shape_b: ShapeId,
    /// Handle of body A.
    pub body_id_a: BodyId,
    /// Handle of body B.
    pub body_id_b: BodyId,
    /// Position of this row in the step's contact list.
    pub index: usize,
}

impl Default for ContactData {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            first_impact: false,
            normal_a: Vec2::zeros(),
            contact_point_a: Vec2::zeros(),
            contact_point_b: Vec2::zeros(),
            shape_a: ShapeId::default(),
            shape_b: ShapeId::default(),
            body_id_a: BodyId::default(),
            body_id_b: BodyId::default(),
            index: 0,
        }
    }
}

/// Data carried by a friction row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrictionData {
    /// Contact point on A, relative to A's position.
    pub contact_point_a: Vec2,
    /// Contact point on B, relative to B's position.
    pub contact_point_b: Vec2,
    /// Tangent direction.
    pub t: Vec2,
    /// Coulomb coefficient used when the slip force is recomputed from
    /// solved normal forces.
    pub friction_coefficient: f64,
    /// Indices of the contact rows this friction row belongs to.
    pub contacts: SmallVec<[usize; 4]>,
    /// Shape on body A.
    pub shape_a: ShapeId,
    /// Shape on body B.
    pub shape_b: ShapeId,
    /// Handle of body A.
    pub body_id_a: BodyId,
    /// Handle of body B.
    pub body_id_b: BodyId,
}

/// The geometric meaning of an equation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EquationKind {
    /// Non-penetration along a contact normal.
    Contact(ContactData),
    /// Tangential friction at a contact.
    Friction(FrictionData),
    /// Keeps `θb = θa + angle`.
    RotationalLock {
        /// Target offset angle.
        angle: f64,
    },
    /// Drives `ratio·ωb - ωa` towards `-relative_velocity`.
    RotationalVelocity {
        /// Gear ratio applied to body B.
        ratio: f64,
    },
    /// Keeps `ratio·θa - θb + angle = 0`.
    AngleLock {
        /// Angle offset.
        angle: f64,
        /// Gear ratio.
        ratio: f64,
    },
    /// A row whose Jacobian and position error are written by its owning
    /// constraint on every update.
    Joint {
        /// Current violation of the row.
        position_error: f64,
    },
}

/// One scalar constraint row between two bodies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Equation {
    /// Index of body A in the body slice given to the solver.
    pub body_a: usize,
    /// Index of body B in the body slice given to the solver.
    pub body_b: usize,
    /// Lower force bound.
    pub min_force: f64,
    /// Upper force bound.
    pub max_force: f64,
    /// Jacobian row.
    pub g: [f64; 6],
    /// Added to the position error.
    pub offset: f64,
    /// Added to the constraint-space velocity.
    pub relative_velocity: f64,
    /// Disabled rows are skipped by the solver.
    pub enabled: bool,
    /// Constraint force from the last solve (`lambda / h`).
    pub multiplier: f64,
    /// Kind-specific data.
    pub kind: EquationKind,

    stiffness: f64,
    relaxation: f64,
    spook: Spook,
    time_step: f64,
    needs_update: bool,

    // Per-solve scratch
    pub(crate) lambda: f64,
    pub(crate) rhs: f64,
    pub(crate) inv_c: f64,
    pub(crate) min_force_dt: f64,
    pub(crate) max_force_dt: f64,
}

impl Equation {
    /// Create an equation between two bodies.
    #[must_use]
    pub fn new(body_a: usize, body_b: usize, min_force: f64, max_force: f64, kind: EquationKind) -> Self {
        let mut g = [0.0; 6];
        match &kind {
            EquationKind::RotationalLock { .. } => {
                g[2] = 1.0;
                g[5] = -1.0;
            }
            EquationKind::RotationalVelocity { ratio } => {
                g[2] = -1.0;
                g[5] = *ratio;
            }
            EquationKind::AngleLock { ratio, .. } => {
                g[2] = *ratio;
                g[5] = -1.0;
            }
            _ => {}
        }
        Self {
            body_a,
            body_b,
            min_force,
            max_force,
            g,
            offset: 0.0,
            relative_velocity: 0.0,
            enabled: true,
            multiplier: 0.0,
            kind,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
            spook: Spook::new(DEFAULT_STIFFNESS, DEFAULT_RELAXATION, 1.0 / 60.0),
            time_step: 1.0 / 60.0,
            needs_update: true,
            lambda: 0.0,
            rhs: 0.0,
            inv_c: 0.0,
            min_force_dt: 0.0,
            max_force_dt: 0.0,
        }
    }

    /// A contact row with force bounds `[0, max_force]`.
    #[must_use]
    pub fn contact(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(body_a, body_b, 0.0, max_force, EquationKind::Contact(ContactData::default()))
    }

    /// A friction row with zero slip force.
    #[must_use]
    pub fn friction(body_a: usize, body_b: usize) -> Self {
        Self::new(body_a, body_b, 0.0, 0.0, EquationKind::Friction(FrictionData::default()))
    }

    /// A bilateral joint row.
    #[must_use]
    pub fn joint(body_a: usize, body_b: usize, max_force: f64) -> Self {
        Self::new(
            body_a,
            body_b,
            -max_force,
            max_force,
            EquationKind::Joint { position_error: 0.0 },
        )
    }

    /// Stiffness `k`.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Relaxation `d`.
    #[must_use]
    pub fn relaxation(&self) -> f64 {
        self.relaxation
    }

    /// Set the stiffness. SPOOK parameters are recomputed before the next solve.
    pub fn set_stiffness(&mut self, stiffness: f64) {
        self.stiffness = stiffness;
        self.needs_update = true;
    }

    /// Set the relaxation. SPOOK parameters are recomputed before the next solve.
    pub fn set_relaxation(&mut self, relaxation: f64) {
        self.relaxation = relaxation;
        self.needs_update = true;
    }

    /// Current SPOOK coefficients.
    #[must_use]
    pub fn spook(&self) -> Spook {
        self.spook
    }

    /// Whether the SPOOK parameters are stale.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Recompute the SPOOK parameters for the stored timestep.
    pub fn update(&mut self) {
        self.spook = Spook::new(self.stiffness, self.relaxation, self.time_step);
        self.needs_update = false;
    }

    /// Set symmetric force bounds `[-max_force, max_force]`.
    pub fn set_max_force(&mut self, max_force: f64) {
        self.min_force = -max_force;
        self.max_force = max_force;
    }

    /// Replace the magnitude of the force bounds, keeping one-sided rows one-sided.
    pub fn set_force_magnitude(&mut self, force: f64) {
        if self.min_force != 0.0 {
            self.min_force = -force;
        }
        if self.max_force != 0.0 {
            self.max_force = force;
        }
    }

    /// Set the friction bound, `[-slip_force, slip_force]`.
    pub fn set_slip_force(&mut self, slip_force: f64) {
        self.max_force = slip_force;
        self.min_force = -slip_force;
    }

    /// The friction bound.
    #[must_use]
    pub fn slip_force(&self) -> f64 {
        self.max_force
    }

    /// Contact data, if this is a contact row.
    #[must_use]
    pub fn as_contact(&self) -> Option<&ContactData> {
        match &self.kind {
            EquationKind::Contact(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable contact data, if this is a contact row.
    pub fn as_contact_mut(&mut self) -> Option<&mut ContactData> {
        match &mut self.kind {
            EquationKind::Contact(c) => Some(c),
            _ => None,
        }
    }

    /// Friction data, if this is a friction row.
    #[must_use]
    pub fn as_friction(&self) -> Option<&FrictionData> {
        match &self.kind {
            EquationKind::Friction(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable friction data, if this is a friction row.
    pub fn as_friction_mut(&mut self) -> Option<&mut FrictionData> {
        match &mut self.kind {
            EquationKind::Friction(f) => Some(f),
            _ => None,
        }
    }

    /// Check for a contact row.
    #[must_use]
    pub fn is_contact(&self) -> bool {
        matches!(self.kind, EquationKind::Contact(_))
    }

    /// Check for a friction row.
    #[must_use]
    pub fn is_friction(&self) -> bool {
        matches!(self.kind, EquationKind::Friction(_))
    }

    /// Detach from all bodies and clear every per-use field.
    ///
    /// Kind is kept; stiffness and relaxation return to their defaults.
    pub fn reset(&mut self) {
        let kind = match &self.kind {
            EquationKind::Contact(_) => EquationKind::Contact(ContactData::default()),
            EquationKind::Friction(_) => EquationKind::Friction(FrictionData::default()),
            other => other.clone(),
        };
        let min_force = if self.is_contact() { 0.0 } else { self.min_force };
        *self = Self::new(UNBOUND_BODY, UNBOUND_BODY, min_force, self.max_force, kind);
        if self.is_friction() {
            self.set_slip_force(0.0);
        }
    }

    /// Refresh the Jacobian of rows that derive it from their own data.
    pub fn update_jacobian(&mut self) {
        match &self.kind {
            EquationKind::Contact(c) => {
                let n = c.normal_a;
                self.g = [
                    -n.x,
                    -n.y,
                    -cross_length(&c.contact_point_a, &n),
                    n.x,
                    n.y,
                    cross_length(&c.contact_point_b, &n),
                ];
            }
            EquationKind::Friction(f) => {
                let t = f.t;
                self.g = [
                    -t.x,
                    -t.y,
                    -cross_length(&f.contact_point_a, &t),
                    t.x,
                    t.y,
                    cross_length(&f.contact_point_b, &t),
                ];
            }
            EquationKind::RotationalLock { .. } => {
                self.g = [0.0, 0.0, 1.0, 0.0, 0.0, -1.0];
            }
            EquationKind::RotationalVelocity { ratio } => {
                self.g = [0.0, 0.0, -1.0, 0.0, 0.0, *ratio];
            }
            EquationKind::AngleLock { ratio, .. } => {
                self.g = [0.0, 0.0, *ratio, 0.0, 0.0, -1.0];
            }
            EquationKind::Joint { .. } => {}
        }
    }

    // ========================================================================
    // Constraint-space quantities
    // ========================================================================

    fn gmult(&self, vi: &Vec2, wi: f64, vj: &Vec2, wj: f64) -> f64 {
        let g = &self.g;
        g[0] * vi.x + g[1] * vi.y + g[2] * wi + g[3] * vj.x + g[4] * vj.y + g[5] * wj
    }

    /// Position error `Gq`.
    pub fn compute_gq<B: SolverBody>(&self, bodies: &[B]) -> f64 {
        let a = bodies[self.body_a].state();
        let b = bodies[self.body_b].state();
        match &self.kind {
            EquationKind::Contact(c) => {
                let penetration = b.position + c.contact_point_b - a.position - c.contact_point_a;
                c.normal_a.dot(&penetration) + self.offset
            }
            EquationKind::Friction(_) | EquationKind::RotationalVelocity { .. } => 0.0,
            EquationKind::RotationalLock { angle } => {
                let world_a = rotate(&Vec2::x(), a.angle + angle);
                let world_b = rotate(&Vec2::y(), b.angle);
                world_a.dot(&world_b)
            }
            EquationKind::AngleLock { angle, ratio } => ratio * a.angle - b.angle + angle,
            EquationKind::Joint { position_error } => *position_error,
        }
    }

    /// Constraint-space velocity `GW`, including `relative_velocity`.
    pub fn compute_gw<B: SolverBody>(&self, bodies: &[B]) -> f64 {
        let a = bodies[self.body_a].state();
        let b = bodies[self.body_b].state();
        self.gmult(&a.velocity, a.angular_velocity, &b.velocity, b.angular_velocity)
            + self.relative_velocity
    }

    /// Constraint-space velocity of the solver accumulators.
    pub fn compute_gw_lambda<B: SolverBody>(&self, bodies: &[B]) -> f64 {
        let a = bodies[self.body_a].solver_state();
        let b = bodies[self.body_b].solver_state();
        self.gmult(&a.vlambda, a.wlambda, &b.vlambda, b.wlambda)
    }

    /// Constraint-space response to external forces, `G M⁻¹ f`.
    pub fn compute_gimf<B: SolverBody>(&self, bodies: &[B]) -> f64 {
        let (sa, ma) = (bodies[self.body_a].state(), bodies[self.body_a].solver_state());
        let (sb, mb) = (bodies[self.body_b].state(), bodies[self.body_b].solver_state());
        let imf_a = sa.force.component_mul(&ma.mass_multiplier) * ma.inv_mass;
        let imf_b = sb.force.component_mul(&mb.mass_multiplier) * mb.inv_mass;
        self.gmult(
            &imf_a,
            sa.angular_force * ma.inv_inertia,
            &imf_b,
            sb.angular_force * mb.inv_inertia,
        )
    }

    /// Effective inverse mass of the row, `G M⁻¹ Gᵀ`.
    pub fn compute_gimgt<B: SolverBody>(&self, bodies: &[B]) -> f64 {
        let a = bodies[self.body_a].solver_state();
        let b = bodies[self.body_b].solver_state();
        let g = &self.g;
        a.inv_inertia * g[2] * g[2]
            + b.inv_inertia * g[5] * g[5]
            + a.inv_mass * (g[0] * g[0] * a.mass_multiplier.x + g[1] * g[1] * a.mass_multiplier.y)
            + b.inv_mass * (g[3] * g[3] * b.mass_multiplier.x + g[4] * g[4] * b.mass_multiplier.y)
    }

    /// Right-hand side `B` of the row.
    ///
    /// Refreshes the Jacobian first.
    pub fn compute_b<B: SolverBody>(&mut self, bodies: &[B], h: f64) -> f64 {
        self.update_jacobian();
        let Spook { a, b, .. } = self.spook;
        let gimf = self.compute_gimf(bodies);
        match &self.kind {
            EquationKind::Contact(c) if c.first_impact && c.restitution != 0.0 => {
                // Positional correction is skipped on the bounce step.
                let gw = self.compute_gw(bodies);
                let gw = if b == 0.0 { 0.0 } else { (1.0 + c.restitution) * gw / b };
                -gw * b - h * gimf
            }
            EquationKind::Friction(_) | EquationKind::RotationalVelocity { .. } => {
                -self.compute_gw(bodies) * b - h * gimf
            }
            _ => {
                let gq = self.compute_gq(bodies);
                let gw = self.compute_gw(bodies);
                -gq * a - gw * b - h * gimf
            }
        }
    }

    /// `1 / (G M⁻¹ Gᵀ + eps)`, or zero when the row has no effective mass.
    pub fn compute_inv_c<B: SolverBody>(&self, bodies: &[B], epsilon: f64) -> f64 {
        let denom = self.compute_gimgt(bodies) + epsilon;
        if denom == 0.0 { 0.0 } else { 1.0 / denom }
    }

    /// Apply a change in lambda to both bodies' velocity accumulators.
    pub fn add_to_wlambda<B: SolverBody>(&self, bodies: &mut [B], delta_lambda: f64) {
        let g = &self.g;
        bodies[self.body_a]
            .solver_state_mut()
            .add_to_wlambda(&(Vec2::new(g[0], g[1]) * delta_lambda), g[2] * delta_lambda);
        bodies[self.body_b]
            .solver_state_mut()
            .add_to_wlambda(&(Vec2::new(g[3], g[4]) * delta_lambda), g[5] * delta_lambda);
    }

    /// Prepare the per-solve scratch for timestep `h`.
    pub(crate) fn prepare<B: SolverBody>(&mut self, bodies: &[B], h: f64) {
        if self.time_step != h || self.needs_update {
            self.time_step = h;
            self.update();
        }
        self.rhs = self.compute_b(bodies, h);
        self.inv_c = self.compute_inv_c(bodies, self.spook.epsilon);
        self.min_force_dt = self.min_force * h;
        self.max_force_dt = self.max_force * h;
        self.lambda = 0.0;
    }

    /// One projected Gauss-Seidel update. Returns the applied change in lambda.
    pub(crate) fn iterate<B: SolverBody>(&mut self, bodies: &mut [B]) -> f64 {
        let gw_lambda = self.compute_gw_lambda(bodies);
        let mut delta = self.inv_c * (self.rhs - gw_lambda - self.spook.epsilon * self.lambda);
        let next = self.lambda + delta;
        if next < self.min_force_dt {
            delta = self.min_force_dt - self.lambda;
        } else if next > self.max_force_dt {
            delta = self.max_force_dt - self.lambda;
        }
        self.lambda += delta;
        self.add_to_wlambda(bodies, delta);
        delta
    }

    /// Accumulated impulse of the current solve.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::body::test_support::TestBody;
    use approx::assert_relative_eq;
    use planar_types::math::vec2;

    #[test]
    fn test_spook_parameters() {
        let h = 1.0 / 60.0;
        let s = Spook::new(1e6, 4.0, h);
        assert_relative_eq!(s.a, 4.0 / (h * 17.0));
        assert_relative_eq!(s.b, 16.0 / 17.0);
        assert_relative_eq!(s.epsilon, 4.0 / (h * h * 1e6 * 17.0));
    }

    #[test]
    fn test_contact_jacobian_and_gq() {
        let bodies = [
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
            TestBody::dynamic(vec2(0.0, 1.5), 1.0, 1.0),
        ];
        let mut eq = Equation::contact(0, 1, f64::MAX);
        {
            let c = eq.as_contact_mut().unwrap();
            c.normal_a = vec2(0.0, 1.0);
            c.contact_point_a = vec2(0.0, 1.0);
            c.contact_point_b = vec2(0.0, -1.0);
        }
        eq.update_jacobian();
        assert_eq!(eq.g, [0.0, -1.0, 0.0, 0.0, 1.0, 0.0]);
        // Points overlap by half a unit.
        assert_relative_eq!(eq.compute_gq(&bodies), -0.5);
    }

    #[test]
    fn test_first_impact_ignores_penetration() {
        let mut bodies = [
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
            TestBody::dynamic(vec2(0.0, 1.5), 1.0, 1.0),
        ];
        bodies[1].state.velocity = vec2(0.0, -2.0);
        let mut eq = Equation::contact(0, 1, f64::MAX);
        {
            let c = eq.as_contact_mut().unwrap();
            c.normal_a = vec2(0.0, 1.0);
            c.contact_point_a = vec2(0.0, 1.0);
            c.contact_point_b = vec2(0.0, -1.0);
            c.first_impact = true;
            c.restitution = 1.0;
        }
        eq.update();
        let b = eq.compute_b(&bodies, 1.0 / 60.0);
        // B = -(1 + e)·GW with GW = -2.
        assert_relative_eq!(b, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inv_c_is_zero_between_fixed_bodies() {
        let bodies = [TestBody::fixed(vec2(0.0, 0.0)), TestBody::fixed(vec2(1.0, 0.0))];
        let eq = Equation::joint(0, 1, f64::MAX);
        assert_eq!(eq.compute_inv_c(&bodies, 0.0), 0.0);
    }

    #[test]
    fn test_rotational_lock_gq() {
        let mut bodies = [
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
        ];
        let eq = Equation::new(0, 1, -1.0, 1.0, EquationKind::RotationalLock { angle: 0.25 });
        bodies[1].state.angle = 0.25;
        assert_relative_eq!(eq.compute_gq(&bodies), 0.0, epsilon = 1e-12);
        assert_eq!(eq.g[2], 1.0);
        assert_eq!(eq.g[5], -1.0);
    }

    #[test]
    fn test_angle_lock_gq() {
        let mut bodies = [
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
            TestBody::dynamic(vec2(0.0, 0.0), 1.0, 1.0),
        ];
        bodies[0].state.angle = 1.0;
        bodies[1].state.angle = 2.0;
        let eq = Equation::new(0, 1, -1.0, 1.0, EquationKind::AngleLock { angle: 0.5, ratio: 2.0 });
        assert_relative_eq!(eq.compute_gq(&bodies), 0.5);
    }

    #[test]
    fn test_iterate_clamps_to_bounds() {
        let mut bodies = [
            TestBody::fixed(vec2(0.0, 0.0)),
            TestBody::dynamic(vec2(0.0, 1.5), 1.0, 1.0),
        ];
        for b in &mut bodies {
            b.update_solve_mass_properties();
        }
        bodies[1].state.velocity = vec2(0.0, 5.0);
        let mut eq = Equation::contact(0, 1, f64::MAX);
        {
            let c = eq.as_contact_mut().unwrap();
            c.normal_a = vec2(0.0, 1.0);
            c.contact_point_a = vec2(0.0, 1.0);
            c.contact_point_b = vec2(0.0, -0.5);
        }
        eq.prepare(&bodies, 1.0 / 60.0);
        // Separating contact: a contact can only push, so nothing is applied.
        let delta = eq.iterate(&mut bodies);
        assert_eq!(delta, 0.0);
        assert_eq!(eq.lambda(), 0.0);
    }

    #[test]
    fn test_reset_detaches() {
        let mut eq = Equation::friction(3, 4);
        eq.set_slip_force(2.0);
        eq.as_friction_mut().unwrap().contacts.push(7);
        eq.set_stiffness(10.0);
        eq.reset();
        assert_eq!(eq.body_a, UNBOUND_BODY);
        assert_eq!(eq.body_b, UNBOUND_BODY);
        assert_eq!(eq.slip_force(), 0.0);
        assert!(eq.as_friction().unwrap().contacts.is_empty());
        assert_eq!(eq.stiffness(), DEFAULT_STIFFNESS);
    }

    #[test]
    fn test_set_force_magnitude_keeps_sides() {
        let mut eq = Equation::new(0, 1, 0.0, 5.0, EquationKind::RotationalLock { angle: 0.0 });
        eq.set_force_magnitude(2.0);
        assert_eq!(eq.min_force, 0.0);
        assert_eq!(eq.max_force, 2.0);
    }
}
