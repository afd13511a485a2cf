//! Rigid bodies.
//!
//! A [`Body`] owns its shapes and carries everything the world needs to
//! move it: kinematic state, mass data, damping, sleep bookkeeping and CCD
//! settings. Mass and inertia are derived from the shapes and must be
//! refreshed through [`Body::update_mass_properties`] whenever shapes, mass
//! or the fixed-axis flags change; every setter on this type does that.

use tracing::debug;

use planar_constraint::SolverBody;
use planar_types::math::{
    Vec2, cross_length, to_global_frame, to_local_frame, vector_to_global_frame,
    vector_to_local_frame,
};
use planar_types::{Aabb, BodyId, BodyState, BodyType, Result, ShapeId, SimError, SleepState, SolverState};

use crate::shape::Shape;

/// A rigid body in a [`World`](crate::World).
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) id: BodyId,
    body_type: BodyType,
    state: BodyState,
    solver: SolverState,

    /// Position at the start of the last integration.
    pub previous_position: Vec2,
    /// Angle at the start of the last integration.
    pub previous_angle: f64,
    /// Position interpolated for rendering by `step_with_time`.
    pub interpolated_position: Vec2,
    /// Angle interpolated for rendering by `step_with_time`.
    pub interpolated_angle: f64,

    mass: f64,
    inv_mass: f64,
    inertia: f64,
    inv_inertia: f64,
    fixed_rotation: bool,
    fixed_x: bool,
    fixed_y: bool,

    shapes: Vec<Shape>,

    /// Linear damping, fraction of velocity lost per second.
    pub damping: f64,
    /// Angular damping, fraction of angular velocity lost per second.
    pub angular_damping: f64,
    /// Multiplier on world gravity.
    pub gravity_scale: f64,
    collision_response: bool,

    /// Whether the body may fall asleep.
    pub allow_sleep: bool,
    sleep_state: SleepState,
    /// Speed below which the body counts as idle.
    pub sleep_speed_limit: f64,
    /// Seconds of idling before the body falls asleep.
    pub sleep_time_limit: f64,
    pub(crate) idle_time: f64,
    pub(crate) wants_to_sleep: bool,
    pub(crate) wake_up_after_narrowphase: bool,
    pub(crate) island_id: Option<usize>,

    aabb: Aabb,
    aabb_needs_update: bool,
    bounding_radius: f64,

    /// Speed above which continuous collision detection kicks in, `-1` for off.
    pub ccd_speed_threshold: f64,
    /// Bisection steps used to locate the time of impact.
    pub ccd_iterations: usize,
}

impl Body {
    fn with_type(body_type: BodyType, mass: f64) -> Self {
        let mut body = Self {
            id: BodyId::default(),
            body_type,
            state: BodyState::default(),
            solver: SolverState::default(),
            previous_position: Vec2::zeros(),
            previous_angle: 0.0,
            interpolated_position: Vec2::zeros(),
            interpolated_angle: 0.0,
            mass,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            fixed_rotation: false,
            fixed_x: false,
            fixed_y: false,
            shapes: Vec::new(),
            damping: 0.1,
            angular_damping: 0.1,
            gravity_scale: 1.0,
            collision_response: true,
            allow_sleep: true,
            sleep_state: SleepState::Awake,
            sleep_speed_limit: 0.2,
            sleep_time_limit: 1.0,
            idle_time: 0.0,
            wants_to_sleep: false,
            wake_up_after_narrowphase: false,
            island_id: None,
            aabb: Aabb::default(),
            aabb_needs_update: true,
            bounding_radius: 0.0,
            ccd_speed_threshold: -1.0,
            ccd_iterations: 10,
        };
        body.update_mass_properties();
        body
    }

    /// A dynamic body of the given mass.
    #[must_use]
    pub fn dynamic(mass: f64) -> Self {
        Self::with_type(BodyType::Dynamic, mass)
    }

    /// A body that never moves.
    #[must_use]
    pub fn static_body() -> Self {
        Self::with_type(BodyType::Static, 0.0)
    }

    /// A body moved only by its velocity.
    #[must_use]
    pub fn kinematic() -> Self {
        Self::with_type(BodyType::Kinematic, 0.0)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self.previous_position = position;
        self.interpolated_position = position;
        self
    }

    /// Set the angle.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.set_angle(angle);
        self.previous_angle = angle;
        self.interpolated_angle = angle;
        self
    }

    /// Set the linear velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.state.velocity = velocity;
        self
    }

    /// Set the angular velocity.
    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.state.angular_velocity = angular_velocity;
        self
    }

    /// Set linear and angular damping.
    #[must_use]
    pub fn with_damping(mut self, damping: f64, angular_damping: f64) -> Self {
        self.damping = damping;
        self.angular_damping = angular_damping;
        self
    }

    /// Enable continuous collision detection above `speed_threshold`.
    #[must_use]
    pub fn with_ccd(mut self, speed_threshold: f64, iterations: usize) -> Self {
        self.ccd_speed_threshold = speed_threshold;
        self.ccd_iterations = iterations;
        self
    }

    /// Lock rotation.
    #[must_use]
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.set_fixed_rotation(fixed);
        self
    }

    /// Lock movement along the world axes.
    #[must_use]
    pub fn with_fixed_axes(mut self, fixed_x: bool, fixed_y: bool) -> Self {
        self.fixed_x = fixed_x;
        self.fixed_y = fixed_y;
        self.update_mass_properties();
        self
    }

    /// Set the gravity multiplier.
    #[must_use]
    pub fn with_gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Allow or forbid sleeping.
    #[must_use]
    pub fn with_allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    /// Set the idle speed and time before sleeping.
    #[must_use]
    pub fn with_sleep_limits(mut self, speed_limit: f64, time_limit: f64) -> Self {
        self.sleep_speed_limit = speed_limit;
        self.sleep_time_limit = time_limit;
        self
    }

    /// Set collision response.
    #[must_use]
    pub fn with_collision_response(mut self, response: bool) -> Self {
        self.collision_response = response;
        self
    }

    /// Attach a shape at the body origin.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.add_shape(shape, Vec2::zeros(), 0.0);
        self
    }

    /// Attach a shape at an offset.
    #[must_use]
    pub fn with_shape_at(mut self, shape: Shape, offset: Vec2, angle: f64) -> Self {
        self.add_shape(shape, offset, angle);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// World handle, assigned when the body is added.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Body type.
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Change the body type. Mass properties are refreshed.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        self.update_mass_properties();
    }

    /// Kinematic state.
    #[must_use]
    pub fn body_state(&self) -> &BodyState {
        &self.state
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    /// Move the body.
    pub fn set_position(&mut self, position: Vec2) {
        self.state.position = position;
        self.aabb_needs_update = true;
    }

    /// World angle.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    /// Rotate the body.
    pub fn set_angle(&mut self, angle: f64) {
        self.state.angle = angle;
        self.aabb_needs_update = true;
    }

    /// Linear velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.state.velocity
    }

    /// Set the linear velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.state.velocity = velocity;
    }

    /// Angular velocity.
    #[must_use]
    pub fn angular_velocity(&self) -> f64 {
        self.state.angular_velocity
    }

    /// Set the angular velocity.
    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.state.angular_velocity = angular_velocity;
    }

    /// Accumulated force.
    #[must_use]
    pub fn force(&self) -> Vec2 {
        self.state.force
    }

    /// Accumulated torque.
    #[must_use]
    pub fn angular_force(&self) -> f64 {
        self.state.angular_force
    }

    /// Mass.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Set the mass. Mass properties are refreshed.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.update_mass_properties();
    }

    /// Inverse mass, zero for static and kinematic bodies.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Moment of inertia.
    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Inverse moment of inertia.
    #[must_use]
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Whether rotation is locked.
    #[must_use]
    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Lock or unlock rotation. Mass properties are refreshed.
    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
    }

    /// Whether x movement is locked.
    #[must_use]
    pub fn fixed_x(&self) -> bool {
        self.fixed_x
    }

    /// Lock or unlock x movement.
    pub fn set_fixed_x(&mut self, fixed: bool) {
        self.fixed_x = fixed;
        self.update_mass_properties();
    }

    /// Whether y movement is locked.
    #[must_use]
    pub fn fixed_y(&self) -> bool {
        self.fixed_y
    }

    /// Lock or unlock y movement.
    pub fn set_fixed_y(&mut self, fixed: bool) {
        self.fixed_y = fixed;
        self.update_mass_properties();
    }

    /// Whether contacts with this body produce forces.
    #[must_use]
    pub fn collision_response(&self) -> bool {
        self.collision_response
    }

    /// Turn collision response on or off.
    pub fn set_collision_response(&mut self, response: bool) {
        self.collision_response = response;
    }

    /// Sleep state.
    #[must_use]
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    /// Seconds spent idling.
    #[must_use]
    pub fn idle_time(&self) -> f64 {
        self.idle_time
    }

    /// Set by the last sleep tick when the body would sleep but was told not to.
    #[must_use]
    pub fn wants_to_sleep(&self) -> bool {
        self.wants_to_sleep
    }

    /// Island of the last step, when islands were split.
    #[must_use]
    pub fn island_id(&self) -> Option<usize> {
        self.island_id
    }

    /// Attached shapes.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Attached shape by id.
    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    /// Bounding radius around the body origin.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Whether the body is dynamic.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.body_type.is_dynamic()
    }

    /// Whether the body is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.body_type.is_static()
    }

    /// Whether the body is sleeping.
    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleep_state == SleepState::Sleeping
    }

    // ========================================================================
    // Shapes and mass
    // ========================================================================

    /// Attach a shape at `offset` and `angle` in the body frame.
    pub fn add_shape(&mut self, mut shape: Shape, offset: Vec2, angle: f64) -> ShapeId {
        shape.position = offset;
        shape.angle = angle;
        let id = shape.id();
        self.shapes.push(shape);
        self.update_mass_properties();
        self.update_bounding_radius();
        self.aabb_needs_update = true;
        id
    }

    /// Detach a shape.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidShapeId`] if the shape is not on this body.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<Shape> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id() == id)
            .ok_or(SimError::InvalidShapeId(id))?;
        let shape = self.shapes.remove(index);
        self.update_mass_properties();
        self.update_bounding_radius();
        self.aabb_needs_update = true;
        Ok(shape)
    }

    /// Recompute mass, inertia and their inverses from the shapes.
    ///
    /// Mass is split evenly over the shapes; each contributes its own
    /// inertia plus the parallel axis term for its offset.
    pub fn update_mass_properties(&mut self) {
        if !self.body_type.is_dynamic() {
            self.mass = f64::MAX;
            self.inv_mass = 0.0;
            self.inertia = f64::MAX;
            self.inv_inertia = 0.0;
            return;
        }

        if self.fixed_rotation {
            self.inertia = f64::MAX;
            self.inv_inertia = 0.0;
        } else {
            let n = self.shapes.len();
            let mut inertia = 0.0;
            if n > 0 {
                let m = self.mass / n as f64;
                for shape in &self.shapes {
                    let r2 = shape.position().norm_squared();
                    inertia += m * shape.compute_moment_of_inertia() + m * r2;
                }
            }
            self.inertia = inertia.min(f64::MAX);
            self.inv_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
        }

        self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
        self.solver.mass_multiplier = Vec2::new(
            if self.fixed_x { 0.0 } else { 1.0 },
            if self.fixed_y { 0.0 } else { 1.0 },
        );
    }

    /// Total area of all shapes.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(Shape::area).sum()
    }

    /// Set the mass from a density and the total shape area.
    pub fn set_density(&mut self, density: f64) {
        self.mass = self.area() * density;
        self.update_mass_properties();
    }

    /// Recompute the bounding radius.
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = self
            .shapes
            .iter()
            .map(|s| s.position().norm() + s.bounding_radius())
            .fold(0.0, f64::max);
    }

    /// World pose of an attached shape.
    #[must_use]
    pub fn shape_world_pose(&self, shape: &Shape) -> (Vec2, f64) {
        (self.to_world_frame(&shape.position()), self.state.angle + shape.angle())
    }

    /// World AABB of all shapes, computed fresh if the cache is stale.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        if self.aabb_needs_update {
            self.compute_aabb()
        } else {
            self.aabb
        }
    }

    /// Refresh the cached AABB.
    pub fn update_aabb(&mut self) {
        self.aabb = self.compute_aabb();
        self.aabb_needs_update = false;
    }

    /// Whether the cached AABB is stale.
    #[must_use]
    pub fn aabb_needs_update(&self) -> bool {
        self.aabb_needs_update
    }

    fn compute_aabb(&self) -> Aabb {
        let mut boxes = self.shapes.iter().map(|shape| {
            let (position, angle) = self.shape_world_pose(shape);
            shape.compute_aabb(&position, angle)
        });
        let Some(mut aabb) = boxes.next() else {
            return Aabb::new(self.state.position, self.state.position);
        };
        for other in boxes {
            aabb.extend(&other);
        }
        aabb
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Express a world point in the body frame.
    #[must_use]
    pub fn to_local_frame(&self, world_point: &Vec2) -> Vec2 {
        to_local_frame(world_point, &self.state.position, self.state.angle)
    }

    /// Express a body-frame point in world coordinates.
    #[must_use]
    pub fn to_world_frame(&self, local_point: &Vec2) -> Vec2 {
        to_global_frame(local_point, &self.state.position, self.state.angle)
    }

    /// Rotate a world direction into the body frame.
    #[must_use]
    pub fn vector_to_local_frame(&self, world_vector: &Vec2) -> Vec2 {
        vector_to_local_frame(world_vector, self.state.angle)
    }

    /// Rotate a body-frame direction into world orientation.
    #[must_use]
    pub fn vector_to_world_frame(&self, local_vector: &Vec2) -> Vec2 {
        vector_to_global_frame(local_vector, self.state.angle)
    }

    /// Velocity of a point at world offset `relative_point` from the origin.
    #[must_use]
    pub fn velocity_at_point(&self, relative_point: &Vec2) -> Vec2 {
        self.state.velocity_at_point(relative_point)
    }

    // ========================================================================
    // Forces
    // ========================================================================

    /// Apply a world force at a world offset from the body origin.
    pub fn apply_force(&mut self, force: &Vec2, relative_point: &Vec2) {
        self.state.force += force;
        self.state.angular_force += cross_length(relative_point, force);
    }

    /// Add a torque.
    pub fn apply_torque(&mut self, torque: f64) {
        self.state.angular_force += torque;
    }

    /// Apply a body-frame force at a body-frame point.
    pub fn apply_force_local(&mut self, local_force: &Vec2, local_point: &Vec2) {
        let force = self.vector_to_world_frame(local_force);
        let point = self.vector_to_world_frame(local_point);
        self.apply_force(&force, &point);
    }

    /// Apply a world impulse at a world offset. Only dynamic bodies respond.
    pub fn apply_impulse(&mut self, impulse: &Vec2, relative_point: &Vec2) {
        if !self.body_type.is_dynamic() {
            return;
        }
        let dv = impulse.component_mul(&self.solver.mass_multiplier) * self.inv_mass;
        self.state.velocity += dv;
        self.state.angular_velocity += cross_length(relative_point, impulse) * self.inv_inertia;
    }

    /// Apply a body-frame impulse at a body-frame point.
    pub fn apply_impulse_local(&mut self, local_impulse: &Vec2, local_point: &Vec2) {
        let impulse = self.vector_to_world_frame(local_impulse);
        let point = self.vector_to_world_frame(local_point);
        self.apply_impulse(&impulse, &point);
    }

    /// Clear accumulated force and torque.
    pub fn set_zero_force(&mut self) {
        self.state.set_zero_force();
    }

    /// Scale velocities by `(1 - damping)^dt`. Only dynamic bodies are damped.
    pub fn apply_damping(&mut self, dt: f64) {
        if !self.body_type.is_dynamic() {
            return;
        }
        self.state.velocity *= (1.0 - self.damping).powf(dt);
        self.state.angular_velocity *= (1.0 - self.angular_damping).powf(dt);
    }

    /// Kinetic energy, `½mv² + ½Iω²`. Zero for non-dynamic bodies.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if !self.body_type.is_dynamic() {
            return 0.0;
        }
        let linear = 0.5 * self.mass * self.state.velocity.norm_squared();
        let angular = if self.fixed_rotation {
            0.0
        } else {
            0.5 * self.inertia * self.state.angular_velocity * self.state.angular_velocity
        };
        linear + angular
    }

    // ========================================================================
    // Sleep
    // ========================================================================

    /// Wake the body and reset its idle timer.
    pub fn wake_up(&mut self) {
        if self.sleep_state == SleepState::Sleeping {
            debug!(body = %self.id, "woke up");
        }
        self.sleep_state = SleepState::Awake;
        self.idle_time = 0.0;
    }

    /// Put the body to sleep, zeroing its velocities and forces.
    pub fn sleep(&mut self) {
        if self.sleep_state != SleepState::Sleeping {
            debug!(body = %self.id, "fell asleep");
        }
        self.sleep_state = SleepState::Sleeping;
        self.state.velocity = Vec2::zeros();
        self.state.angular_velocity = 0.0;
        self.state.set_zero_force();
    }

    /// Advance the sleep state machine by `dt`.
    ///
    /// A body slower than `sleep_speed_limit` accumulates idle time; once that
    /// exceeds `sleep_time_limit` it falls asleep, or only raises
    /// `wants_to_sleep` when `dont_sleep` is set. Only dynamic bodies that
    /// allow sleeping take part.
    pub fn sleep_tick(&mut self, dont_sleep: bool, dt: f64) {
        self.wants_to_sleep = false;
        if !self.allow_sleep || !self.body_type.is_dynamic() {
            return;
        }
        let speed_squared =
            self.state.velocity.norm_squared() + self.state.angular_velocity * self.state.angular_velocity;
        if speed_squared >= self.sleep_speed_limit * self.sleep_speed_limit {
            self.idle_time = 0.0;
            self.sleep_state = SleepState::Awake;
        } else {
            self.idle_time += dt;
            self.sleep_state = SleepState::Sleepy;
        }
        if self.idle_time > self.sleep_time_limit {
            if dont_sleep {
                self.wants_to_sleep = true;
            } else {
                self.sleep();
            }
        }
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Save the current pose and apply forces to the velocities.
    pub fn integrate_velocity(&mut self, dt: f64) {
        self.previous_position = self.state.position;
        self.previous_angle = self.state.angle;
        if !self.fixed_rotation {
            self.state.angular_velocity += self.state.angular_force * self.inv_inertia * dt;
        }
        let dv = self.state.force.component_mul(&self.solver.mass_multiplier) * (self.inv_mass * dt);
        self.state.velocity += dv;
    }

    /// Move the body along its velocities.
    pub fn integrate_position(&mut self, dt: f64) {
        self.state.position += self.state.velocity * dt;
        if !self.fixed_rotation {
            self.state.angle += self.state.angular_velocity * dt;
        }
        self.aabb_needs_update = true;
    }

    /// Semi-implicit Euler step without continuous collision detection.
    pub fn integrate(&mut self, dt: f64) {
        self.integrate_velocity(dt);
        self.integrate_position(dt);
    }

    /// Place the body at a pose along its current step, `fraction` in `[0, 1]`.
    pub(crate) fn place_at_fraction(&mut self, start: &Vec2, start_angle: f64, dt: f64, fraction: f64) {
        self.state.position = start + self.state.velocity * (dt * fraction);
        if !self.fixed_rotation {
            self.state.angle = start_angle + self.state.angular_velocity * dt * fraction;
        }
        self.aabb_needs_update = true;
    }

    /// Interpolate the render pose between the previous and current pose.
    pub(crate) fn interpolate(&mut self, t: f64) {
        self.interpolated_position = self.previous_position + (self.state.position - self.previous_position) * t;
        self.interpolated_angle = self.previous_angle + (self.state.angle - self.previous_angle) * t;
    }

    /// Copy the current pose into the render pose.
    pub(crate) fn snap_interpolation(&mut self) {
        self.interpolated_position = self.state.position;
        self.interpolated_angle = self.state.angle;
    }
}

impl SolverBody for Body {
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
        if self.sleep_state == SleepState::Sleeping || self.body_type.is_kinematic() {
            self.solver.inv_mass = 0.0;
            self.solver.inv_inertia = 0.0;
        } else {
            self.solver.inv_mass = self.inv_mass;
            self.solver.inv_inertia = self.inv_inertia;
        }
    }
}
