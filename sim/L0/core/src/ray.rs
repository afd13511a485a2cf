//! Ray casting against shapes and bodies.
//!
//! A [`Ray`] is a segment from `from` to `to`. Shapes test themselves
//! against it and report hits through a [`RayCaster`], which applies the
//! ray's [`RayMode`] before writing into a [`RaycastResult`]:
//!
//! - `Closest` keeps the hit with the smallest fraction
//! - `Any` keeps the first hit and stops
//! - `All` overwrites the result on every hit and hands it to a callback
//!
//! Fractions are measured along the segment, so `0` is `from` and `1` is
//! `to`.

use planar_types::math::{Vec2, lerp, normalize_or_zero};
use planar_types::{Aabb, BodyId, ShapeId};

use crate::body::Body;
use crate::shape::Shape;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How hits are collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RayMode {
    /// Keep the hit closest to `from`.
    Closest,
    /// Stop at the first hit found.
    #[default]
    Any,
    /// Report every hit.
    All,
}

/// A ray segment with filtering options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Start point.
    pub from: Vec2,
    /// End point.
    pub to: Vec2,
    /// Hit collection mode.
    pub mode: RayMode,
    /// Skip bodies and shapes that have collision response turned off.
    pub check_collision_response: bool,
    /// Ignore hits on faces whose normal points along the ray.
    pub skip_backfaces: bool,
    /// Collision group bits of the ray.
    pub collision_group: u32,
    /// Groups the ray can hit.
    pub collision_mask: u32,
    direction: Vec2,
    length: f64,
}

impl Ray {
    /// Create a ray in `Any` mode.
    #[must_use]
    pub fn new(from: Vec2, to: Vec2) -> Self {
        let mut ray = Self {
            from,
            to,
            mode: RayMode::Any,
            check_collision_response: true,
            skip_backfaces: false,
            collision_group: u32::MAX,
            collision_mask: u32::MAX,
            direction: Vec2::zeros(),
            length: 0.0,
        };
        ray.update();
        ray
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip back faces.
    #[must_use]
    pub fn with_skip_backfaces(mut self, skip: bool) -> Self {
        self.skip_backfaces = skip;
        self
    }

    /// Control whether non-responding bodies and shapes are hit.
    #[must_use]
    pub fn with_check_collision_response(mut self, check: bool) -> Self {
        self.check_collision_response = check;
        self
    }

    /// Set the collision filter.
    #[must_use]
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    /// Recompute the direction and length after `from` or `to` changed.
    pub fn update(&mut self) {
        let d = self.to - self.from;
        self.length = d.norm();
        self.direction = normalize_or_zero(&d);
    }

    /// Unit direction from `from` to `to`.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Bounding box of the segment.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.from.inf(&self.to), self.from.sup(&self.to))
    }

    /// Point at `fraction` along the segment.
    #[must_use]
    pub fn point_at(&self, fraction: f64) -> Vec2 {
        lerp(&self.from, &self.to, fraction)
    }

    /// Squared distance from `position` to the infinite line through the ray.
    #[must_use]
    pub fn distance_from_intersection_squared(&self, position: &Vec2) -> f64 {
        let along = (position - self.from).dot(&self.direction);
        let closest = self.from + self.direction * along;
        (position - closest).norm_squared()
    }
}

/// Outcome of a ray cast.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RaycastResult {
    /// World normal of the hit surface.
    pub normal: Vec2,
    /// Shape that was hit.
    pub shape: Option<ShapeId>,
    /// Body that was hit.
    pub body: Option<BodyId>,
    /// Hit fraction along the ray, `-1` when nothing was hit.
    pub fraction: f64,
    /// Polygon edge that was hit, if the shape has edges.
    pub face_index: Option<usize>,
    is_stopped: bool,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            normal: Vec2::zeros(),
            shape: None,
            body: None,
            fraction: -1.0,
            face_index: None,
            is_stopped: false,
        }
    }
}

impl RaycastResult {
    /// An empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the result so it can be reused.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check if anything was hit.
    #[must_use]
    pub fn has_hit(&self) -> bool {
        self.fraction >= 0.0
    }

    /// Distance from the ray start to the hit.
    #[must_use]
    pub fn hit_distance(&self, ray: &Ray) -> f64 {
        (ray.to - ray.from).norm() * self.fraction
    }

    /// World position of the hit.
    #[must_use]
    pub fn hit_point(&self, ray: &Ray) -> Vec2 {
        lerp(&ray.from, &ray.to, self.fraction)
    }

    /// Stop the cast; usually called from an `All`-mode callback.
    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    /// Whether [`stop`](Self::stop) was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.is_stopped
    }

    /// Check if the cast should end now.
    #[must_use]
    pub fn should_stop(&self, ray: &Ray) -> bool {
        self.is_stopped || (self.has_hit() && ray.mode == RayMode::Any)
    }

    /// Store a hit.
    pub fn set(
        &mut self,
        normal: Vec2,
        shape: Option<ShapeId>,
        body: Option<BodyId>,
        fraction: f64,
        face_index: Option<usize>,
    ) {
        self.normal = normal;
        self.shape = shape;
        self.body = body;
        self.fraction = fraction;
        self.face_index = face_index;
    }
}

/// Callback invoked for every hit of an `All`-mode ray.
pub type RayCallback<'a> = &'a mut dyn FnMut(&mut RaycastResult);

/// One ray cast in progress.
///
/// Tracks the body and shape under test so that shapes only need to report
/// a fraction and a normal.
pub struct RayCaster<'a> {
    ray: &'a Ray,
    result: &'a mut RaycastResult,
    callback: Option<RayCallback<'a>>,
    body: Option<BodyId>,
    shape: Option<ShapeId>,
}

impl std::fmt::Debug for RayCaster<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayCaster")
            .field("ray", self.ray)
            .field("result", &self.result)
            .field("body", &self.body)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl<'a> RayCaster<'a> {
    /// Start a cast writing into `result`.
    pub fn new(ray: &'a Ray, result: &'a mut RaycastResult) -> Self {
        Self {
            ray,
            result,
            callback: None,
            body: None,
            shape: None,
        }
    }

    /// Start a cast that calls `callback` on every `All`-mode hit.
    pub fn with_callback(ray: &'a Ray, result: &'a mut RaycastResult, callback: RayCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::new(ray, result)
        }
    }

    /// The ray being cast.
    #[must_use]
    pub fn ray(&self) -> &Ray {
        self.ray
    }

    /// Start and end of the ray.
    #[must_use]
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.ray.from, self.ray.to)
    }

    /// The result so far.
    #[must_use]
    pub fn result(&self) -> &RaycastResult {
        self.result
    }

    /// Check if the cast should end now.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.result.should_stop(self.ray)
    }

    /// Report a hit on the current shape.
    pub fn report(&mut self, fraction: f64, normal: Vec2, face_index: Option<usize>) {
        if self.ray.skip_backfaces && normal.dot(&self.ray.direction) > 0.0 {
            return;
        }
        match self.ray.mode {
            RayMode::All => {
                self.result.set(normal, self.shape, self.body, fraction, face_index);
                if let Some(callback) = self.callback.as_deref_mut() {
                    callback(self.result);
                }
            }
            RayMode::Closest => {
                if !self.result.has_hit() || fraction < self.result.fraction {
                    self.result.set(normal, self.shape, self.body, fraction, face_index);
                }
            }
            RayMode::Any => {
                self.result.set(normal, self.shape, self.body, fraction, face_index);
            }
        }
    }

    /// Test one shape placed at a world position and angle.
    pub fn intersect_shape(&mut self, body: BodyId, shape: &Shape, position: &Vec2, angle: f64) {
        let radius = shape.bounding_radius();
        if self.ray.distance_from_intersection_squared(position) > radius * radius {
            return;
        }
        self.body = Some(body);
        self.shape = Some(shape.id());
        shape.raycast(self, position, angle);
        self.body = None;
        self.shape = None;
    }

    /// Test every eligible shape of a body.
    pub fn intersect_body(&mut self, body: &Body) {
        let check_response = self.ray.check_collision_response;
        if check_response && !body.collision_response() {
            return;
        }
        for shape in body.shapes() {
            if check_response && !shape.collision_response {
                continue;
            }
            if self.ray.collision_group & shape.collision_mask == 0
                || shape.collision_group & self.ray.collision_mask == 0
            {
                continue;
            }
            let position = body.to_world_frame(&shape.position());
            let angle = body.angle() + shape.angle();
            self.intersect_shape(body.id(), shape, &position, angle);
            if self.should_stop() {
                break;
            }
        }
    }

    /// Test a set of bodies whose AABB the ray touches.
    pub fn intersect_bodies<'b>(&mut self, bodies: impl IntoIterator<Item = &'b Body>) {
        for body in bodies {
            if self.should_stop() {
                break;
            }
            let aabb = body.aabb();
            let direction = self.ray.direction;
            if aabb.overlaps_ray(&self.ray.from, &direction, self.ray.length) >= 0.0
                || aabb.contains_point(&self.ray.from)
            {
                self.intersect_body(body);
            }
        }
    }
}
