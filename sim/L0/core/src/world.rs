//! The simulation world.
//!
//! A [`World`] owns bodies, constraints, springs and contact materials and
//! advances them with [`World::step`]. One step runs, in order:
//!
//! 1. gravity, spring and damping forces
//! 2. broadphase pair search, filtered by disabled pairs and joints that do
//!    not collide their bodies
//! 3. narrowphase contact generation, overlap tracking and contact events
//! 4. joint row refresh and the Gauss-Seidel solve, per island when island
//!    splitting is on
//! 5. integration, with continuous collision detection for fast bodies
//! 6. impact events and the sleep state machine
//!
//! Structural changes (adding or removing bodies, shapes, constraints,
//! springs or contact materials) are rejected while a step is running.
//!
//! # Example
//!
//! ```ignore
//! use planar_core::{Body, Shape, World};
//! use planar_types::WorldConfig;
//!
//! let mut world = World::new(WorldConfig::default())?;
//! world.add_body(Body::static_body().with_shape(Shape::plane()))?;
//! let ball = world.add_body(
//!     Body::dynamic(1.0)
//!         .with_position(vec2(0.0, 2.0))
//!         .with_shape(Shape::circle(0.5)),
//! )?;
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0)?;
//! }
//! ```

use std::fmt;

use hashbrown::{HashMap, HashSet};
use planar_constraint::{Constraint, Equation, GaussSeidelSolver, Islands, SolverStats};
use planar_types::math::{Vec2, to_local_frame};
use planar_types::{
    Aabb, BodyId, ConstraintId, ContactMaterial, ContactMaterialId, MaterialId, Result, ShapeId,
    SimError, SleepMode, SleepState, SpringId, WorldConfig, pair_key,
};
use tracing::{debug, trace, warn};

use crate::body::Body;
use crate::broad_phase::{self, BroadPhase};
use crate::events::{EventEmitter, ListenerId, WorldEvent, WorldEventKind};
use crate::narrow_phase::{Collider, Narrowphase};
use crate::overlap::OverlapKeeper;
use crate::ray::{Ray, RayCaster, RayMode, RaycastResult};
use crate::shape::{Shape, ShapeType};
use crate::spring::Spring;

fn body_pair(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Two distinct elements of a slice, the first mutably.
fn split_pair<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (low, high) = items.split_at_mut(b);
        Some((&mut low[a], &mut high[0]))
    } else {
        let (low, high) = items.split_at_mut(a);
        Some((&mut high[0], &mut low[b]))
    }
}

fn validate_timestep(dt: f64) -> Result<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidTimestep(dt))
    }
}

/// Whether `sleeper` should be woken by a contact with `other`.
fn should_wake(sleeper: &Body, other: &Body) -> bool {
    if !sleeper.allow_sleep || !sleeper.is_dynamic() || !sleeper.is_sleeping() {
        return false;
    }
    if other.sleep_state() != SleepState::Awake || other.is_static() {
        return false;
    }
    let speed_squared = other.velocity().norm_squared() + other.angular_velocity() * other.angular_velocity();
    let limit = other.sleep_speed_limit;
    speed_squared >= 2.0 * limit * limit
}

/// A 2D rigid-body world.
pub struct World {
    config: WorldConfig,
    bodies: Vec<Body>,
    body_indices: HashMap<BodyId, usize>,
    constraints: Vec<(ConstraintId, Box<dyn Constraint>)>,
    springs: Vec<(SpringId, Spring)>,
    contact_materials: HashMap<(MaterialId, MaterialId), ContactMaterial>,
    broadphase: Box<dyn BroadPhase>,
    narrowphase: Narrowphase,
    solver: GaussSeidelSolver,
    overlap_keeper: OverlapKeeper,
    events: EventEmitter,
    disabled_body_collisions: HashSet<(BodyId, BodyId)>,
    friction_gravity: f64,
    time: f64,
    accumulator: f64,
    stepping: bool,
    solver_stats: SolverStats,
    next_body_id: u64,
    next_constraint_id: u64,
    next_spring_id: u64,
    next_contact_material_id: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("bodies", &self.bodies.len())
            .field("constraints", &self.constraints.len())
            .field("springs", &self.springs.len())
            .field("contact_materials", &self.contact_materials.len())
            .field("time", &self.time)
            .field("stepping", &self.stepping)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::build(WorldConfig::default())
    }
}

impl World {
    /// Create an empty world.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        if config.sleep_mode == SleepMode::IslandSleeping && !config.island_split {
            warn!("island sleeping needs island splitting; bodies will not sleep");
        }
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        Self {
            broadphase: broad_phase::from_config(config.broadphase, config.bounding_volume, config.sap_axis),
            narrowphase: Narrowphase::new(),
            solver: GaussSeidelSolver::new(config.solver),
            friction_gravity: config.friction_gravity,
            config,
            bodies: Vec::new(),
            body_indices: HashMap::new(),
            constraints: Vec::new(),
            springs: Vec::new(),
            contact_materials: HashMap::new(),
            overlap_keeper: OverlapKeeper::new(),
            events: EventEmitter::new(),
            disabled_body_collisions: HashSet::new(),
            time: 0.0,
            accumulator: 0.0,
            stepping: false,
            solver_stats: SolverStats::default(),
            next_body_id: 1,
            next_constraint_id: 1,
            next_spring_id: 1,
            next_contact_material_id: 1,
        }
    }

    // ========================================================================
    // Configuration and state
    // ========================================================================

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// The broadphase is rebuilt when its kind, bounding volume or axis
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for an invalid configuration and
    /// [`SimError::WorldStepping`] during a step.
    pub fn set_config(&mut self, config: WorldConfig) -> Result<()> {
        self.ensure_not_stepping("change the configuration")?;
        config.validate()?;
        if config.broadphase != self.config.broadphase
            || config.bounding_volume != self.config.bounding_volume
            || config.sap_axis != self.config.sap_axis
        {
            self.broadphase = broad_phase::from_config(config.broadphase, config.bounding_volume, config.sap_axis);
            for index in 0..self.bodies.len() {
                self.broadphase.body_added(index);
            }
        }
        self.solver.set_config(config.solver);
        self.friction_gravity = config.friction_gravity;
        self.config = config;
        Ok(())
    }

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    /// Simulated time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Gravity used for friction bounds in the last step.
    #[must_use]
    pub fn friction_gravity(&self) -> f64 {
        self.friction_gravity
    }

    /// Whether a step is running.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    /// Solver statistics of the last step.
    #[must_use]
    pub fn solver_stats(&self) -> SolverStats {
        self.solver_stats
    }

    /// Contact rows of the last step.
    #[must_use]
    pub fn contact_equations(&self) -> &[Equation] {
        self.narrowphase.contact_equations()
    }

    /// Friction rows of the last step.
    #[must_use]
    pub fn friction_equations(&self) -> &[Equation] {
        self.narrowphase.friction_equations()
    }

    /// The narrowphase.
    #[must_use]
    pub fn narrowphase(&self) -> &Narrowphase {
        &self.narrowphase
    }

    /// Shape pairs that were overlapping at the end of the last step.
    #[must_use]
    pub fn overlap_keeper(&self) -> &OverlapKeeper {
        &self.overlap_keeper
    }

    /// Whether any non-static body is awake.
    #[must_use]
    pub fn has_active_bodies(&self) -> bool {
        self.bodies
            .iter()
            .any(|b| !b.is_static() && b.sleep_state() != SleepState::Sleeping)
    }

    fn ensure_not_stepping(&self, operation: &str) -> Result<()> {
        if self.stepping {
            Err(SimError::stepping(operation))
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Bodies and shapes
    // ========================================================================

    /// Add a body and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::WorldStepping`] during a step.
    pub fn add_body(&mut self, mut body: Body) -> Result<BodyId> {
        self.ensure_not_stepping("add a body")?;
        let id = BodyId::new(self.next_body_id);
        self.next_body_id += 1;
        body.id = id;
        body.update_aabb();
        body.snap_interpolation();

        let index = self.bodies.len();
        self.bodies.push(body);
        self.body_indices.insert(id, index);
        self.broadphase.body_added(index);
        debug!(body = %id, index, "body added");

        self.events.emit(&WorldEvent::AddBody { body: id });
        Ok(id)
    }

    /// Remove a body and return it.
    ///
    /// Constraints and springs attached to it stay registered but are
    /// skipped until the body is back or they are removed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] for an unknown id and
    /// [`SimError::WorldStepping`] during a step.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body> {
        self.ensure_not_stepping("remove a body")?;
        let index = self.body_index(id).ok_or(SimError::InvalidBodyId(id))?;
        let body = self.bodies.remove(index);
        self.reindex_bodies();
        self.broadphase.body_removed(index);
        self.overlap_keeper.remove_body(id);
        debug!(body = %id, "body removed");

        self.events.emit(&WorldEvent::RemoveBody { body: id });
        Ok(body)
    }

    fn reindex_bodies(&mut self) {
        self.body_indices = self
            .bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (body.id(), index))
            .collect();
    }

    /// Look up a body.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.body_index(id).map(|i| &self.bodies[i])
    }

    /// Look up a body mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.body_index(id).map(|i| &mut self.bodies[i])
    }

    /// Position of a body in [`bodies`](Self::bodies).
    #[must_use]
    pub fn body_index(&self, id: BodyId) -> Option<usize> {
        self.body_indices.get(&id).copied()
    }

    /// All bodies, in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Ids of all bodies, in insertion order.
    #[must_use]
    pub fn body_ids(&self) -> Vec<BodyId> {
        self.bodies.iter().map(Body::id).collect()
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Attach a shape to a body at a body-frame offset and angle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] for an unknown body and
    /// [`SimError::WorldStepping`] during a step.
    pub fn add_shape(&mut self, body: BodyId, shape: Shape, offset: Vec2, angle: f64) -> Result<ShapeId> {
        self.ensure_not_stepping("add a shape")?;
        let target = self.body_mut(body).ok_or(SimError::InvalidBodyId(body))?;
        Ok(target.add_shape(shape, offset, angle))
    }

    /// Detach a shape from a body.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] or [`SimError::InvalidShapeId`]
    /// for unknown ids and [`SimError::WorldStepping`] during a step.
    pub fn remove_shape(&mut self, body: BodyId, shape: ShapeId) -> Result<Shape> {
        self.ensure_not_stepping("remove a shape")?;
        let target = self.body_mut(body).ok_or(SimError::InvalidBodyId(body))?;
        target.remove_shape(shape)
    }

    // ========================================================================
    // Constraints, springs, materials
    // ========================================================================

    /// Add a constraint between two bodies of this world.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BodyNotInWorld`] if either body is unknown and
    /// [`SimError::WorldStepping`] during a step.
    pub fn add_constraint(&mut self, constraint: impl Constraint + 'static) -> Result<ConstraintId> {
        self.add_boxed_constraint(Box::new(constraint))
    }

    /// Add an already boxed constraint.
    ///
    /// # Errors
    ///
    /// See [`add_constraint`](Self::add_constraint).
    pub fn add_boxed_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<ConstraintId> {
        self.ensure_not_stepping("add a constraint")?;
        self.ensure_registered(constraint.body_a())?;
        self.ensure_registered(constraint.body_b())?;
        let id = ConstraintId::new(self.next_constraint_id);
        self.next_constraint_id += 1;
        self.constraints.push((id, constraint));
        Ok(id)
    }

    /// Remove a constraint and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraintId`] for an unknown id and
    /// [`SimError::WorldStepping`] during a step.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Box<dyn Constraint>> {
        self.ensure_not_stepping("remove a constraint")?;
        let index = self
            .constraints
            .iter()
            .position(|(cid, _)| *cid == id)
            .ok_or(SimError::InvalidConstraintId(id))?;
        Ok(self.constraints.remove(index).1)
    }

    /// Look up a constraint.
    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&(dyn Constraint + 'static)> {
        self.constraints
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c.as_ref())
    }

    /// Look up a constraint mutably.
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut (dyn Constraint + 'static)> {
        self.constraints
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c.as_mut())
    }

    /// Number of constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Add a spring between two bodies of this world.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BodyNotInWorld`] if either body is unknown and
    /// [`SimError::WorldStepping`] during a step.
    pub fn add_spring(&mut self, spring: Spring) -> Result<SpringId> {
        self.ensure_not_stepping("add a spring")?;
        self.ensure_registered(spring.body_a())?;
        self.ensure_registered(spring.body_b())?;
        let id = SpringId::new(self.next_spring_id);
        self.next_spring_id += 1;
        self.springs.push((id, spring));
        self.events.emit(&WorldEvent::AddSpring { spring: id });
        Ok(id)
    }

    /// Remove a spring and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidSpringId`] for an unknown id and
    /// [`SimError::WorldStepping`] during a step.
    pub fn remove_spring(&mut self, id: SpringId) -> Result<Spring> {
        self.ensure_not_stepping("remove a spring")?;
        let index = self
            .springs
            .iter()
            .position(|(sid, _)| *sid == id)
            .ok_or(SimError::InvalidSpringId(id))?;
        let (_, spring) = self.springs.remove(index);
        self.events.emit(&WorldEvent::RemoveSpring { spring: id });
        Ok(spring)
    }

    /// Look up a spring.
    #[must_use]
    pub fn spring(&self, id: SpringId) -> Option<&Spring> {
        self.springs.iter().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    /// Look up a spring mutably.
    pub fn spring_mut(&mut self, id: SpringId) -> Option<&mut Spring> {
        self.springs.iter_mut().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    /// Register parameters for a pair of materials.
    ///
    /// A later entry for the same pair replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for invalid parameters and
    /// [`SimError::WorldStepping`] during a step.
    pub fn add_contact_material(&mut self, mut material: ContactMaterial) -> Result<ContactMaterialId> {
        self.ensure_not_stepping("add a contact material")?;
        material.params.validate()?;
        let id = ContactMaterialId::new(self.next_contact_material_id);
        self.next_contact_material_id += 1;
        material.id = id;
        self.contact_materials.insert(material.key(), material);
        Ok(id)
    }

    /// Remove a contact material and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidContactMaterialId`] for an unknown id and
    /// [`SimError::WorldStepping`] during a step.
    pub fn remove_contact_material(&mut self, id: ContactMaterialId) -> Result<ContactMaterial> {
        self.ensure_not_stepping("remove a contact material")?;
        let key = self
            .contact_materials
            .iter()
            .find(|(_, m)| m.id == id)
            .map(|(key, _)| *key)
            .ok_or(SimError::InvalidContactMaterialId(id))?;
        self.contact_materials
            .remove(&key)
            .ok_or(SimError::InvalidContactMaterialId(id))
    }

    /// The contact material registered for a pair, in either order.
    #[must_use]
    pub fn contact_material(&self, a: MaterialId, b: MaterialId) -> Option<&ContactMaterial> {
        self.contact_materials.get(&pair_key(a, b))
    }

    fn ensure_registered(&self, body: BodyId) -> Result<()> {
        if self.body_indices.contains_key(&body) {
            Ok(())
        } else {
            Err(SimError::BodyNotInWorld { body })
        }
    }

    // ========================================================================
    // Collision filtering
    // ========================================================================

    /// Stop two bodies from colliding with each other.
    pub fn disable_body_collision(&mut self, a: BodyId, b: BodyId) {
        self.disabled_body_collisions.insert(body_pair(a, b));
    }

    /// Undo [`disable_body_collision`](Self::disable_body_collision).
    pub fn enable_body_collision(&mut self, a: BodyId, b: BodyId) {
        self.disabled_body_collisions.remove(&body_pair(a, b));
    }

    /// Whether collisions between two bodies are disabled.
    #[must_use]
    pub fn is_body_collision_disabled(&self, a: BodyId, b: BodyId) -> bool {
        self.disabled_body_collisions.contains(&body_pair(a, b))
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register an event listener.
    pub fn on<F>(&mut self, kind: WorldEventKind, callback: F) -> ListenerId
    where
        F: Fn(&WorldEvent<'_>, &mut EventEmitter) + 'static,
    {
        self.events.on(kind, callback)
    }

    /// Remove an event listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Whether any listener is registered for `kind`.
    #[must_use]
    pub fn has(&self, kind: WorldEventKind) -> bool {
        self.events.has(kind)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Cast a ray against every body.
    ///
    /// The ray's mode decides which hit ends up in `result`. Returns whether
    /// anything was hit.
    pub fn raycast(&self, result: &mut RaycastResult, ray: &Ray) -> bool {
        {
            let mut caster = RayCaster::new(ray, result);
            caster.intersect_bodies(&self.bodies);
        }
        result.has_hit()
    }

    /// Cast a ray and call `callback` for every hit, in body order.
    ///
    /// `result` holds the hit being reported; after the cast it holds the
    /// last one. Calling [`RaycastResult::stop`] from the callback ends the
    /// cast. Returns whether anything was hit.
    pub fn raycast_all(
        &self,
        result: &mut RaycastResult,
        ray: &Ray,
        mut callback: impl FnMut(&mut RaycastResult),
    ) -> bool {
        let ray = ray.clone().with_mode(RayMode::All);
        {
            let mut caster = RayCaster::with_callback(&ray, result, &mut callback);
            caster.intersect_bodies(&self.bodies);
        }
        result.has_hit()
    }

    /// Bodies among `candidates` with a shape containing `point`.
    ///
    /// Particles have no area; they count as hit when closer than
    /// `precision`.
    #[must_use]
    pub fn hit_test(&self, point: &Vec2, candidates: &[BodyId], precision: f64) -> Vec<BodyId> {
        let mut hits = Vec::new();
        for &id in candidates {
            let Some(body) = self.body(id) else {
                continue;
            };
            let hit = body.shapes().iter().any(|shape| {
                let (position, angle) = body.shape_world_pose(shape);
                if shape.shape_type() == ShapeType::Particle {
                    (position - point).norm_squared() < precision * precision
                } else {
                    shape.point_test(&to_local_frame(point, &position, angle))
                }
            });
            if hit {
                hits.push(id);
            }
        }
        hits
    }

    /// Bodies whose AABB overlaps `aabb`.
    pub fn aabb_query(&mut self, aabb: &Aabb) -> Vec<BodyId> {
        let mut indices = Vec::new();
        self.broadphase.aabb_query(&self.bodies, aabb, &mut indices);
        indices.into_iter().map(|i| self.bodies[i].id()).collect()
    }

    /// Whether any shapes of two bodies overlap right now.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBodyId`] for an unknown body.
    pub fn bodies_overlap(&mut self, a: BodyId, b: BodyId) -> Result<bool> {
        let ia = self.body_index(a).ok_or(SimError::InvalidBodyId(a))?;
        let ib = self.body_index(b).ok_or(SimError::InvalidBodyId(b))?;
        Ok(self.narrowphase.bodies_overlap(&self.bodies[ia], &self.bodies[ib], true))
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance the world by one fixed step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTimestep`] unless `dt` is positive and
    /// finite.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        validate_timestep(dt)?;
        self.internal_step(dt);
        self.time += dt;
        for body in &mut self.bodies {
            body.snap_interpolation();
        }
        Ok(())
    }

    /// Advance by as many fixed steps as fit into the elapsed time.
    ///
    /// Leftover time carries over to the next call. At most `max_sub_steps`
    /// steps run; a value of zero is treated as one. Afterwards every body's
    /// interpolated pose lies between its previous and current pose by the
    /// leftover fraction of a step. Returns the number of steps taken.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTimestep`] unless `dt` is positive and
    /// finite and `time_since_last_called` is finite and non-negative.
    pub fn step_with_time(&mut self, dt: f64, time_since_last_called: f64, max_sub_steps: usize) -> Result<usize> {
        validate_timestep(dt)?;
        if !(time_since_last_called >= 0.0) || !time_since_last_called.is_finite() {
            return Err(SimError::InvalidTimestep(time_since_last_called));
        }
        let max_sub_steps = if max_sub_steps == 0 {
            warn!("max_sub_steps of zero, taking one sub step");
            1
        } else {
            max_sub_steps
        };

        self.accumulator += time_since_last_called;
        let mut sub_steps = 0;
        while self.accumulator >= dt && sub_steps < max_sub_steps {
            self.internal_step(dt);
            self.time += dt;
            self.accumulator -= dt;
            sub_steps += 1;
        }

        let t = (self.accumulator % dt) / dt;
        for body in &mut self.bodies {
            body.interpolate(t);
        }
        Ok(sub_steps)
    }

    fn internal_step(&mut self, dt: f64) {
        self.stepping = true;

        if self.config.use_world_gravity_as_friction_gravity {
            let g = self.config.gravity.norm();
            if !(g <= 0.0 && self.config.use_friction_gravity_on_zero_gravity) {
                self.friction_gravity = g;
            }
        }

        self.apply_forces(dt);

        let pairs = self.broadphase_pairs();
        if self.events.has(WorldEventKind::PostBroadphase) {
            let ids: Vec<(BodyId, BodyId)> = pairs
                .iter()
                .map(|&(i, j)| (self.bodies[i].id(), self.bodies[j].id()))
                .collect();
            self.events.emit(&WorldEvent::PostBroadphase { pairs: &ids });
        }

        self.overlap_keeper.tick();
        self.narrowphase.reset();
        self.narrowphase.enable_friction_reduction = self.config.enable_friction_reduction;
        let wake = self.run_narrowphase(&pairs);
        for index in wake {
            self.bodies[index].wake_up_after_narrowphase = true;
        }
        for body in &mut self.bodies {
            if body.wake_up_after_narrowphase {
                body.wake_up();
                body.wake_up_after_narrowphase = false;
            }
        }

        if self.events.has(WorldEventKind::EndContact) {
            for record in self.overlap_keeper.ended_overlaps() {
                self.events.emit(&WorldEvent::EndContact {
                    shape_a: record.shape_a,
                    shape_b: record.shape_b,
                    body_a: record.body_a,
                    body_b: record.body_b,
                });
            }
        }

        if self.events.has(WorldEventKind::PreSolve) {
            self.events.emit(&WorldEvent::PreSolve {
                contact_equations: self.narrowphase.contact_equations(),
                friction_equations: self.narrowphase.friction_equations(),
            });
        }

        let islands = self.solve(dt);

        for index in 0..self.bodies.len() {
            let body = &mut self.bodies[index];
            if body.is_static() || body.is_sleeping() {
                body.previous_position = body.position();
                body.previous_angle = body.angle();
                continue;
            }
            body.integrate_velocity(dt);
            if !self.integrate_to_time_of_impact(index, dt) {
                self.bodies[index].integrate_position(dt);
            }
        }
        for body in &mut self.bodies {
            body.set_zero_force();
        }

        if self.config.emit_impact_event && self.events.has(WorldEventKind::Impact) {
            for eq in self.narrowphase.contact_equations() {
                if let Some(contact) = eq.as_contact().filter(|c| c.first_impact) {
                    self.events.emit(&WorldEvent::Impact {
                        body_a: contact.body_id_a,
                        body_b: contact.body_id_b,
                        shape_a: contact.shape_a,
                        shape_b: contact.shape_b,
                        contact: eq,
                    });
                }
            }
        }

        self.update_sleep(dt, islands.as_ref());

        self.stepping = false;
        trace!(
            time = self.time,
            pairs = pairs.len(),
            contacts = self.narrowphase.contact_equations().len(),
            frictions = self.narrowphase.friction_equations().len(),
            iterations = self.solver_stats.used_iterations,
            "world step"
        );
        self.events.emit(&WorldEvent::PostStep);
    }

    fn apply_forces(&mut self, dt: f64) {
        if self.config.apply_gravity {
            let gravity = self.config.gravity;
            for body in &mut self.bodies {
                if body.is_dynamic() && !body.is_sleeping() {
                    let force = gravity * (body.mass() * body.gravity_scale);
                    body.apply_force(&force, &Vec2::zeros());
                }
            }
        }

        if self.config.apply_spring_forces {
            for (_, spring) in &self.springs {
                let (Some(&ia), Some(&ib)) = (
                    self.body_indices.get(&spring.body_a()),
                    self.body_indices.get(&spring.body_b()),
                ) else {
                    continue;
                };
                if let Some((a, b)) = split_pair(&mut self.bodies, ia, ib) {
                    spring.apply_force(a, b);
                }
            }
        }

        if self.config.apply_damping {
            for body in &mut self.bodies {
                body.apply_damping(dt);
            }
        }
    }

    /// Candidate body pairs after pair filtering.
    fn broadphase_pairs(&mut self) -> Vec<(usize, usize)> {
        for body in &mut self.bodies {
            body.update_aabb();
        }

        let mut flat = Vec::new();
        self.broadphase.collision_pairs(&self.bodies, &mut flat);

        let no_collide: HashSet<(BodyId, BodyId)> = self
            .constraints
            .iter()
            .filter(|(_, c)| !c.collide_connected())
            .map(|(_, c)| body_pair(c.body_a(), c.body_b()))
            .collect();

        flat.chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .filter(|&(i, j)| {
                let key = body_pair(self.bodies[i].id(), self.bodies[j].id());
                !self.disabled_body_collisions.contains(&key) && !no_collide.contains(&key)
            })
            .collect()
    }

    /// Generate contacts for every candidate pair.
    ///
    /// Returns the indices of sleeping bodies that were hit hard enough to
    /// wake up.
    fn run_narrowphase(&mut self, pairs: &[(usize, usize)]) -> Vec<usize> {
        let Self {
            bodies,
            narrowphase,
            overlap_keeper,
            events,
            contact_materials,
            config,
            friction_gravity,
            ..
        } = self;
        let wants_begin = events.has(WorldEventKind::BeginContact);
        let mut wake = Vec::new();

        for &(i, j) in pairs {
            let (bi, bj) = (&bodies[i], &bodies[j]);
            let reduced_mass = if !bi.is_dynamic() {
                bj.mass()
            } else if !bj.is_dynamic() {
                bi.mass()
            } else {
                bi.mass() * bj.mass() / (bi.mass() + bj.mass())
            };

            for si in bi.shapes() {
                for sj in bj.shapes() {
                    if !si.filter_accepts(sj) {
                        continue;
                    }
                    let params = match (si.material, sj.material) {
                        (Some(ma), Some(mb)) => contact_materials
                            .get(&pair_key(ma, mb))
                            .map_or(config.default_contact_material, |m| m.params),
                        _ => config.default_contact_material,
                    };
                    narrowphase.set_contact_material(&params);
                    narrowphase.enable_friction = params.friction > 0.0;
                    narrowphase.slip_force = params.friction * *friction_gravity * reduced_mass;
                    narrowphase.enabled_equations = bi.collision_response()
                        && bj.collision_response()
                        && si.collision_response
                        && sj.collision_response;

                    let sensor = si.sensor || sj.sensor;
                    let frictions_before = narrowphase.friction_equations().len();
                    let num_contacts =
                        narrowphase.collide(&Collider::new(bi, i, si), &Collider::new(bj, j, sj), sensor);
                    if num_contacts == 0 {
                        continue;
                    }
                    let num_frictions = narrowphase.friction_equations().len() - frictions_before;

                    if should_wake(bi, bj) {
                        wake.push(i);
                    }
                    if should_wake(bj, bi) {
                        wake.push(j);
                    }

                    overlap_keeper.set_overlapping(bi.id(), si.id(), bj.id(), sj.id());
                    if wants_begin && overlap_keeper.is_new_overlap(si.id(), sj.id()) {
                        let contacts = narrowphase.contact_equations();
                        let contact_equations = if sensor {
                            &[][..]
                        } else {
                            &contacts[contacts.len().saturating_sub(num_contacts)..]
                        };
                        events.emit(&WorldEvent::BeginContact {
                            shape_a: si.id(),
                            shape_b: sj.id(),
                            body_a: bi.id(),
                            body_b: bj.id(),
                            contact_equations,
                        });
                    }

                    if num_frictions > 1 {
                        let (_, frictions) = narrowphase.equations_mut();
                        let start = frictions.len() - num_frictions;
                        for eq in &mut frictions[start..] {
                            eq.set_slip_force(eq.slip_force() / num_frictions as f64);
                        }
                    }
                }
            }
        }
        wake
    }

    /// Refresh joint rows and run the solver.
    ///
    /// Returns the island partition when island splitting is on.
    fn solve(&mut self, dt: f64) -> Option<Islands> {
        let mut bound = Vec::with_capacity(self.constraints.len());
        for (_, constraint) in &mut self.constraints {
            let indices = (
                self.body_indices.get(&constraint.body_a()).copied(),
                self.body_indices.get(&constraint.body_b()).copied(),
            );
            let (Some(ia), Some(ib)) = indices else {
                bound.push(false);
                continue;
            };
            constraint.bind(ia, ib);
            constraint.update(self.bodies[ia].body_state(), self.bodies[ib].body_state());
            bound.push(true);
        }

        let (contacts, frictions) = self.narrowphase.equations_mut();
        let mut rows: Vec<&mut Equation> = contacts.iter_mut().chain(frictions.iter_mut()).collect();
        for ((_, constraint), active) in self.constraints.iter_mut().zip(&bound) {
            if *active {
                rows.extend(constraint.equations_mut().iter_mut());
            }
        }

        let islands = self.config.island_split.then(|| {
            let is_dynamic: Vec<bool> = self.bodies.iter().map(Body::is_dynamic).collect();
            Islands::build(
                &is_dynamic,
                rows.iter().filter(|eq| eq.enabled).map(|eq| (eq.body_a, eq.body_b)),
            )
        });
        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.island_id = islands.as_ref().and_then(|isl| isl.island_of(index));
        }

        if self.config.solve_constraints {
            self.solver_stats = match &islands {
                Some(isl) => {
                    let mut groups: Vec<Vec<&mut Equation>> = (0..isl.num_islands()).map(|_| Vec::new()).collect();
                    for eq in rows {
                        if let Some(island) = isl.island_of_pair(eq.body_a, eq.body_b) {
                            groups[island].push(eq);
                        }
                    }
                    self.solver.solve_islands(dt, &mut groups, &mut self.bodies)
                }
                None => self.solver.solve(dt, &mut rows, &mut self.bodies),
            };
        } else {
            self.solver_stats = SolverStats::default();
        }
        islands
    }

    /// Move a fast body only as far as it can go without tunnelling.
    ///
    /// Casts a ray along the body's motion for this step. On a hit, bisects
    /// the motion for the latest pose where the body does not overlap the
    /// hit body and places it there. Returns whether the body was placed.
    fn integrate_to_time_of_impact(&mut self, index: usize, dt: f64) -> bool {
        let body = &self.bodies[index];
        let threshold = body.ccd_speed_threshold;
        if threshold < 0.0 {
            return false;
        }
        let speed_squared = body.velocity().norm_squared();
        if speed_squared <= 0.0 || speed_squared < threshold * threshold {
            return false;
        }

        let own_id = body.id();
        let start = body.position();
        let start_angle = body.angle();
        let iterations = body.ccd_iterations;
        let ray = Ray::new(start, start + body.velocity() * dt).with_mode(RayMode::All);

        let mut closest: Option<(f64, BodyId)> = None;
        {
            let disabled = &self.disabled_body_collisions;
            let mut result = RaycastResult::new();
            let mut on_hit = |hit: &mut RaycastResult| {
                let Some(hit_body) = hit.body else {
                    return;
                };
                if hit_body == own_id || disabled.contains(&body_pair(own_id, hit_body)) {
                    return;
                }
                if closest.is_none_or(|(fraction, _)| hit.fraction < fraction) {
                    closest = Some((hit.fraction, hit_body));
                }
            };
            let mut caster = RayCaster::with_callback(&ray, &mut result, &mut on_hit);
            caster.intersect_bodies(&self.bodies);
        }

        let Some((fraction, hit_id)) = closest else {
            return false;
        };
        let Some(hit_index) = self.body_index(hit_id) else {
            return false;
        };
        let Some((body, other)) = split_pair(&mut self.bodies, index, hit_index) else {
            return false;
        };

        let mut tmin = 0.0;
        let mut tmax = fraction;
        for _ in 0..iterations {
            let tmid = 0.5 * (tmin + tmax);
            body.place_at_fraction(&start, start_angle, dt, tmid);
            let overlapping =
                body.aabb().overlaps(&other.aabb()) && self.narrowphase.bodies_overlap(body, other, true);
            if overlapping {
                tmax = tmid;
            } else {
                tmin = tmid;
            }
        }
        body.place_at_fraction(&start, start_angle, dt, tmax);
        debug!(body = %own_id, hit = %hit_id, fraction = tmax, "continuous collision clamped motion");
        true
    }

    fn update_sleep(&mut self, dt: f64, islands: Option<&Islands>) {
        match self.config.sleep_mode {
            SleepMode::NoSleeping => {}
            SleepMode::BodySleeping => {
                for body in &mut self.bodies {
                    body.sleep_tick(false, dt);
                }
            }
            SleepMode::IslandSleeping => {
                let Some(islands) = islands else {
                    return;
                };
                for body in &mut self.bodies {
                    body.sleep_tick(true, dt);
                }
                for members in islands.iter() {
                    if members.iter().all(|&m| self.bodies[m].wants_to_sleep()) {
                        for &m in members {
                            self.bodies[m].sleep();
                        }
                    }
                }
            }
        }
    }

    /// Remove every body, constraint, spring and contact material and reset
    /// the clock. Listeners stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::WorldStepping`] during a step.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_not_stepping("clear the world")?;
        self.bodies.clear();
        self.body_indices.clear();
        self.constraints.clear();
        self.springs.clear();
        self.contact_materials.clear();
        self.disabled_body_collisions.clear();
        self.broadphase.clear();
        self.narrowphase.reset();
        self.overlap_keeper.clear();
        self.time = 0.0;
        self.accumulator = 0.0;
        self.solver_stats = SolverStats::default();
        Ok(())
    }
}
