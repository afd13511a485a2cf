//! Narrow-phase collision detection.
//!
//! The narrow phase takes one pair of shapes and turns their overlap into
//! contact and friction rows for the solver. Shape kinds are ordered (see
//! [`ShapeType`]); [`Narrowphase::collide`] swaps the pair so the lower kind
//! comes first and matches on the two kinds to pick a routine.
//!
//! # Friction reduction
//!
//! With `enable_friction_reduction` on, routines that can produce several
//! contacts emit one friction row per shape pair, placed at the average of
//! the contact points. Routines built from smaller ones (capsules are two
//! circles and a rectangle) switch friction off for the parts and add the
//! averaged row at the end.
//!
//! # Pooling
//!
//! Rows come from [`EquationPool`]s. [`Narrowphase::reset`] hands the rows of
//! the previous step back and remembers which body pairs were touching, so
//! that new contacts know whether this is their first impact.

mod pool;
mod routines;

pub use pool::EquationPool;

use hashbrown::HashSet;
use smallvec::SmallVec;
use planar_constraint::{Equation, UNBOUND_BODY};
use planar_types::math::{Vec2, normalize_or_zero, rotate90cw};
use planar_types::{BodyId, ContactMaterialParams};

use crate::body::Body;
use crate::shape::{Shape, ShapeKind, ShapeType};

fn body_pair(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// One shape of one body, placed in the world.
///
/// The pose is normally the shape's world pose, but routines that split a
/// shape into parts place the parts with [`Collider::at`].
#[derive(Debug, Clone, Copy)]
pub struct Collider<'a> {
    /// Owning body.
    pub body: &'a Body,
    /// Index of the body in the world's body list.
    pub index: usize,
    /// The shape.
    pub shape: &'a Shape,
    /// World position.
    pub position: Vec2,
    /// World angle.
    pub angle: f64,
}

impl<'a> Collider<'a> {
    /// A shape at its current world pose.
    #[must_use]
    pub fn new(body: &'a Body, index: usize, shape: &'a Shape) -> Self {
        let (position, angle) = body.shape_world_pose(shape);
        Self {
            body,
            index,
            shape,
            position,
            angle,
        }
    }

    /// The same shape at another pose.
    #[must_use]
    pub fn at(self, position: Vec2, angle: f64) -> Self {
        Self {
            position,
            angle,
            ..self
        }
    }
}

/// Contact generation between shape pairs.
#[derive(Debug, Clone)]
pub struct Narrowphase {
    contact_equations: Vec<Equation>,
    friction_equations: Vec<Equation>,
    /// Emit friction rows.
    pub enable_friction: bool,
    /// Emit one averaged friction row per shape pair.
    pub enable_friction_reduction: bool,
    /// Whether new rows take part in the solve.
    pub enabled_equations: bool,
    /// Friction bound given to new friction rows.
    pub slip_force: f64,
    material: ContactMaterialParams,
    colliding_bodies_last_step: HashSet<(BodyId, BodyId)>,
    contact_pool: EquationPool,
    friction_pool: EquationPool,
}

impl Default for Narrowphase {
    fn default() -> Self {
        Self::new()
    }
}

impl Narrowphase {
    /// Create an empty narrow phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contact_equations: Vec::new(),
            friction_equations: Vec::new(),
            enable_friction: true,
            enable_friction_reduction: true,
            enabled_equations: true,
            slip_force: 10.0,
            material: ContactMaterialParams::default(),
            colliding_bodies_last_step: HashSet::new(),
            contact_pool: EquationPool::contacts(),
            friction_pool: EquationPool::frictions(),
        }
    }

    /// Contact rows generated this step.
    #[must_use]
    pub fn contact_equations(&self) -> &[Equation] {
        &self.contact_equations
    }

    /// Friction rows generated this step.
    #[must_use]
    pub fn friction_equations(&self) -> &[Equation] {
        &self.friction_equations
    }

    /// Mutable contact and friction rows.
    pub fn equations_mut(&mut self) -> (&mut [Equation], &mut [Equation]) {
        (&mut self.contact_equations, &mut self.friction_equations)
    }

    /// Parameters applied to new rows.
    #[must_use]
    pub fn contact_material(&self) -> &ContactMaterialParams {
        &self.material
    }

    /// Set the parameters applied to new rows.
    pub fn set_contact_material(&mut self, params: &ContactMaterialParams) {
        self.material = *params;
    }

    /// Release this step's rows and remember which bodies were touching.
    pub fn reset(&mut self) {
        self.colliding_bodies_last_step.clear();
        for eq in &self.contact_equations {
            if let Some(c) = eq.as_contact() {
                self.colliding_bodies_last_step
                    .insert(body_pair(c.body_id_a, c.body_id_b));
            }
        }
        self.contact_pool.release_all(self.contact_equations.drain(..));
        self.friction_pool.release_all(self.friction_equations.drain(..));
    }

    /// Check whether two bodies had contacts in the previous step.
    #[must_use]
    pub fn collided_last_step(&self, a: BodyId, b: BodyId) -> bool {
        self.colliding_bodies_last_step.contains(&body_pair(a, b))
    }

    // ========================================================================
    // Row construction
    // ========================================================================

    /// Take a contact row from the pool, set up for the given shapes.
    ///
    /// The normal and contact points are left at zero.
    pub fn create_contact_equation(&mut self, a: &Collider<'_>, b: &Collider<'_>) -> Equation {
        let first_impact = !self.collided_last_step(a.body.id(), b.body.id());
        let mut eq = self.contact_pool.get();
        eq.body_a = a.index;
        eq.body_b = b.index;
        eq.enabled = self.enabled_equations;
        eq.offset = self.material.contact_skin_size;
        eq.set_stiffness(self.material.stiffness);
        eq.set_relaxation(self.material.relaxation);
        if let Some(c) = eq.as_contact_mut() {
            c.shape_a = a.shape.id();
            c.shape_b = b.shape.id();
            c.body_id_a = a.body.id();
            c.body_id_b = b.body.id();
            c.first_impact = first_impact;
            c.restitution = self.material.restitution;
        }
        eq
    }

    fn blank_friction(&mut self, body_a: usize, body_b: usize) -> Equation {
        let mut eq = self.friction_pool.get();
        eq.body_a = body_a;
        eq.body_b = body_b;
        eq.enabled = self.enabled_equations;
        eq.relative_velocity = self.material.surface_velocity;
        eq.set_stiffness(self.material.friction_stiffness);
        eq.set_relaxation(self.material.friction_relaxation);
        eq.set_slip_force(self.slip_force);
        if let Some(f) = eq.as_friction_mut() {
            f.friction_coefficient = self.material.friction;
            f.contacts.clear();
        }
        eq
    }

    /// Take a friction row from the pool, set up for the given shapes.
    pub fn create_friction_equation(&mut self, a: &Collider<'_>, b: &Collider<'_>) -> Equation {
        let mut eq = self.blank_friction(a.index, b.index);
        if let Some(f) = eq.as_friction_mut() {
            f.shape_a = a.shape.id();
            f.shape_b = b.shape.id();
            f.body_id_a = a.body.id();
            f.body_id_b = b.body.id();
        }
        eq
    }

    /// A friction row sharing the bodies and point of a contact row.
    pub fn create_friction_from_contact(&mut self, contact: &Equation) -> Equation {
        let mut eq = self.blank_friction(contact.body_a, contact.body_b);
        if let (Some(c), Some(f)) = (contact.as_contact(), eq.as_friction_mut()) {
            f.shape_a = c.shape_a;
            f.shape_b = c.shape_b;
            f.body_id_a = c.body_id_a;
            f.body_id_b = c.body_id_b;
            f.contact_point_a = c.contact_point_a;
            f.contact_point_b = c.contact_point_b;
            f.t = rotate90cw(&c.normal_a);
            f.contacts.push(c.index);
        }
        eq
    }

    /// One friction row for the last `num_contacts` contact rows.
    ///
    /// Contact points are averaged and normals summed in the frame of the
    /// last row's body A; rows with the bodies the other way round count
    /// with flipped normal and swapped points. Returns `None` when there is
    /// nothing to average.
    pub fn create_friction_from_average(&mut self, num_contacts: usize) -> Option<Equation> {
        let len = self.contact_equations.len();
        if num_contacts == 0 || num_contacts > len {
            return None;
        }
        let last = &self.contact_equations[len - 1];
        let (reference_body, other_body) = (last.body_a, last.body_b);
        let ids = last.as_contact().map(|c| (c.shape_a, c.shape_b, c.body_id_a, c.body_id_b));
        let mut eq = self.blank_friction(reference_body, other_body);

        let mut t = Vec2::zeros();
        let mut point_a = Vec2::zeros();
        let mut point_b = Vec2::zeros();
        let mut indices = SmallVec::<[usize; 4]>::new();
        for contact in self.contact_equations[len - num_contacts..].iter().rev() {
            let Some(c) = contact.as_contact() else {
                continue;
            };
            if contact.body_a == reference_body {
                t += c.normal_a;
                point_a += c.contact_point_a;
                point_b += c.contact_point_b;
            } else {
                t -= c.normal_a;
                point_a += c.contact_point_b;
                point_b += c.contact_point_a;
            }
            indices.push(c.index);
        }
        let inv = 1.0 / num_contacts as f64;

        if let Some(f) = eq.as_friction_mut() {
            if let Some((shape_a, shape_b, body_id_a, body_id_b)) = ids {
                f.shape_a = shape_a;
                f.shape_b = shape_b;
                f.body_id_a = body_id_a;
                f.body_id_b = body_id_b;
            }
            f.contact_point_a = point_a * inv;
            f.contact_point_b = point_b * inv;
            f.t = rotate90cw(&normalize_or_zero(&t));
            f.contacts = indices;
        }
        Some(eq)
    }

    // ========================================================================
    // Internal helpers used by the routines
    // ========================================================================

    /// Push a contact with the given world normal and world contact points.
    ///
    /// Returns the index of the new row.
    pub(crate) fn push_contact(
        &mut self,
        a: &Collider<'_>,
        b: &Collider<'_>,
        normal: Vec2,
        world_point_a: Vec2,
        world_point_b: Vec2,
    ) -> usize {
        let mut eq = self.create_contact_equation(a, b);
        let index = self.contact_equations.len();
        if let Some(c) = eq.as_contact_mut() {
            c.normal_a = normal;
            c.contact_point_a = world_point_a - a.body.position();
            c.contact_point_b = world_point_b - b.body.position();
            c.index = index;
        }
        self.contact_equations.push(eq);
        index
    }

    /// Push a friction row for the contact at `index`.
    pub(crate) fn push_friction_from_contact(&mut self, index: usize) {
        let contact = self.contact_equations[index].clone();
        let eq = self.create_friction_from_contact(&contact);
        self.friction_equations.push(eq);
    }

    /// Friction for one contact of a single-contact routine.
    pub(crate) fn single_contact_friction(&mut self, index: usize) {
        if self.enable_friction {
            self.push_friction_from_contact(index);
        }
    }

    /// Friction for one contact of a multi-contact routine.
    pub(crate) fn manifold_contact_friction(&mut self, index: usize) {
        if self.enable_friction && !self.enable_friction_reduction {
            self.push_friction_from_contact(index);
        }
    }

    /// Averaged friction at the end of a multi-contact routine.
    pub(crate) fn finish_manifold(&mut self, num_contacts: usize) {
        if self.enable_friction_reduction && self.enable_friction && num_contacts > 0 {
            if let Some(eq) = self.create_friction_from_average(num_contacts) {
                self.friction_equations.push(eq);
            }
        }
    }

    /// Run `f` with friction off when friction reduction is on.
    pub(crate) fn without_friction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if !self.enable_friction_reduction {
            return f(self);
        }
        let before = self.enable_friction;
        self.enable_friction = false;
        let result = f(self);
        self.enable_friction = before;
        result
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Check whether a pair of kinds has an entry in the dispatch table.
    ///
    /// Entries that never produce contacts (`convex_line`, `line_box`,
    /// `line_capsule`, `line_line`) count as present.
    #[must_use]
    pub fn has_routine(a: ShapeType, b: ShapeType) -> bool {
        use ShapeType::{Box, Capsule, Circle, Convex, Heightfield, Line, Particle, Plane};
        let (a, b) = if b < a { (b, a) } else { (a, b) };
        matches!(
            (a, b),
            (Circle, _)
                | (Particle, Plane | Convex | Box | Capsule)
                | (Plane, Convex | Box | Line | Capsule)
                | (Convex | Box, Convex | Box | Line | Capsule | Heightfield)
                | (Line, Line | Box | Capsule)
                | (Capsule, Capsule)
        )
    }

    /// Collide two shapes.
    ///
    /// Returns the number of contacts generated. With `just_test` set,
    /// returns 1 as soon as an overlap is found and generates nothing.
    /// Pairs without a routine return 0.
    pub fn collide(&mut self, a: &Collider<'_>, b: &Collider<'_>, just_test: bool) -> usize {
        let (a, b) = if b.shape.shape_type() < a.shape.shape_type() {
            (b, a)
        } else {
            (a, b)
        };
        match (a.shape.kind(), b.shape.kind()) {
            (ShapeKind::Circle(ca), ShapeKind::Circle(cb)) => {
                self.circle_circle(a, ca.radius(), b, cb.radius(), just_test)
            }
            (ShapeKind::Circle(c), ShapeKind::Particle) => self.circle_particle(a, c.radius(), b, just_test),
            (ShapeKind::Circle(c), ShapeKind::Plane) => self.circle_plane(a, c.radius(), b, just_test),
            (ShapeKind::Circle(c), ShapeKind::Convex(poly)) => {
                self.circle_convex(a, c.radius(), b, poly, just_test)
            }
            (ShapeKind::Circle(c), ShapeKind::Box(bx)) => {
                self.circle_convex(a, c.radius(), b, bx.polygon(), just_test)
            }
            (ShapeKind::Circle(c), ShapeKind::Line(line)) => {
                self.circle_line(a, c.radius(), b, line.length(), 0.0, just_test)
            }
            (ShapeKind::Circle(c), ShapeKind::Capsule(cap)) => self.circle_capsule(a, c.radius(), b, cap, just_test),
            (ShapeKind::Circle(c), ShapeKind::Heightfield(hf)) => {
                self.circle_heightfield(a, c.radius(), b, hf, just_test)
            }
            (ShapeKind::Particle, ShapeKind::Plane) => self.particle_plane(a, b, just_test),
            (ShapeKind::Particle, ShapeKind::Convex(poly)) => self.particle_convex(a, b, poly, just_test),
            (ShapeKind::Particle, ShapeKind::Box(bx)) => self.particle_convex(a, b, bx.polygon(), just_test),
            (ShapeKind::Particle, ShapeKind::Capsule(cap)) => self.particle_capsule(a, b, cap, just_test),
            (ShapeKind::Plane, ShapeKind::Convex(poly)) => self.plane_convex(a, b, poly, just_test),
            (ShapeKind::Plane, ShapeKind::Box(bx)) => self.plane_convex(a, b, bx.polygon(), just_test),
            (ShapeKind::Plane, ShapeKind::Line(line)) => self.plane_line(a, b, line.length(), just_test),
            (ShapeKind::Plane, ShapeKind::Capsule(cap)) => self.plane_capsule(a, b, cap, just_test),
            (ShapeKind::Convex(_) | ShapeKind::Box(_), _) => match a.shape.kind().as_convex() {
                Some(poly) => self.convex_against(a, poly, b, just_test),
                None => 0,
            },
            (ShapeKind::Line(_), ShapeKind::Line(_)) => Self::line_line(),
            (ShapeKind::Line(_), ShapeKind::Box(_)) => Self::line_box(),
            (ShapeKind::Line(_), ShapeKind::Capsule(_)) => Self::line_capsule(),
            (ShapeKind::Capsule(ca), ShapeKind::Capsule(cb)) => self.capsule_capsule(a, ca, b, cb, just_test),
            _ => 0,
        }
    }

    /// Check whether any pair of shapes of two bodies overlaps.
    ///
    /// With `check_masks` set, shape pairs rejected by their collision
    /// groups are skipped.
    pub fn bodies_overlap(&mut self, a: &Body, b: &Body, check_masks: bool) -> bool {
        for shape_a in a.shapes() {
            let ca = Collider::new(a, UNBOUND_BODY, shape_a);
            for shape_b in b.shapes() {
                if check_masks && !shape_a.filter_accepts(shape_b) {
                    continue;
                }
                let cb = Collider::new(b, UNBOUND_BODY, shape_b);
                if self.collide(&ca, &cb, true) > 0 {
                    return true;
                }
            }
        }
        false
    }
}
