//! Collision shapes.
//!
//! A [`Shape`] pairs a geometric [`ShapeKind`] with its offset inside the
//! owning body and the collision filtering flags. Shapes are moved into a
//! [`Body`](crate::Body) and never shared.
//!
//! | Kind | Inertia (unit mass) | Area |
//! |------|---------------------|------|
//! | Circle | `r²/2` | `πr²` |
//! | Particle | 0 | 0 |
//! | Plane | `f64::MAX` | `f64::MAX` |
//! | Convex | polygon formula | fan triangulation |
//! | Line | `l²/12` | 0 |
//! | Box | `(w²+h²)/12` | `w·h` |
//! | Capsule | rectangle + two half discs | `2rl + πr²` |
//! | Heightfield | `f64::MAX` | trapezoids |

mod capsule;
mod circle;
mod convex;
mod heightfield;
mod line;
pub mod plane;

use std::sync::atomic::{AtomicU64, Ordering};

pub use capsule::Capsule;
pub use circle::Circle;
pub use convex::{BoxShape, Convex};
pub use heightfield::{Heightfield, TILE_DEPTH};
pub use line::Line;
pub use plane::PLANE_EXTENT;

pub(crate) use circle::segment_circle_fractions;

use planar_types::math::Vec2;
use planar_types::{Aabb, MaterialId, Result, ShapeId};

use crate::ray::RayCaster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Shape kinds in narrowphase dispatch order.
///
/// Pair routines always take the lower kind first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeType {
    /// Disc.
    Circle,
    /// Point.
    Particle,
    /// Half-space.
    Plane,
    /// Convex polygon.
    Convex,
    /// Segment.
    Line,
    /// Rectangle.
    Box,
    /// Stadium.
    Capsule,
    /// Terrain.
    Heightfield,
}

/// Geometry of a shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    /// Disc.
    Circle(Circle),
    /// Point with no extent.
    Particle,
    /// Half-space below the local x-axis.
    Plane,
    /// Convex polygon.
    Convex(Convex),
    /// Segment along local x.
    Line(Line),
    /// Rectangle.
    Box(BoxShape),
    /// Stadium along local x.
    Capsule(Capsule),
    /// Terrain.
    Heightfield(Heightfield),
}

impl ShapeKind {
    /// Dispatch tag.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Circle(_) => ShapeType::Circle,
            Self::Particle => ShapeType::Particle,
            Self::Plane => ShapeType::Plane,
            Self::Convex(_) => ShapeType::Convex,
            Self::Line(_) => ShapeType::Line,
            Self::Box(_) => ShapeType::Box,
            Self::Capsule(_) => ShapeType::Capsule,
            Self::Heightfield(_) => ShapeType::Heightfield,
        }
    }

    /// The polygon of convex and box shapes.
    #[must_use]
    pub fn as_convex(&self) -> Option<&Convex> {
        match self {
            Self::Convex(c) => Some(c),
            Self::Box(b) => Some(b.polygon()),
            _ => None,
        }
    }
}

/// A collision shape attached to a body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    pub(crate) position: Vec2,
    pub(crate) angle: f64,
    /// Group bits this shape belongs to.
    pub collision_group: u32,
    /// Groups this shape collides with.
    pub collision_mask: u32,
    /// Produce contact forces. When off, contacts are still reported.
    pub collision_response: bool,
    /// Report overlaps without generating contacts.
    pub sensor: bool,
    /// Surface material.
    pub material: Option<MaterialId>,
    bounding_radius: f64,
    area: f64,
}

impl Shape {
    /// Wrap a kind with default flags and a fresh id.
    #[must_use]
    pub fn new(kind: ShapeKind) -> Self {
        let mut shape = Self {
            id: ShapeId::new(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            position: Vec2::zeros(),
            angle: 0.0,
            collision_group: 1,
            collision_mask: u32::MAX,
            collision_response: true,
            sensor: false,
            material: None,
            bounding_radius: 0.0,
            area: 0.0,
        };
        shape.update_bounding_radius();
        shape.update_area();
        shape
    }

    /// Circle of the given radius.
    #[must_use]
    pub fn circle(radius: f64) -> Self {
        Self::new(ShapeKind::Circle(Circle::new(radius)))
    }

    /// A point.
    #[must_use]
    pub fn particle() -> Self {
        Self::new(ShapeKind::Particle)
    }

    /// Infinite plane.
    #[must_use]
    pub fn plane() -> Self {
        Self::new(ShapeKind::Plane)
    }

    /// Line segment.
    #[must_use]
    pub fn line(length: f64) -> Self {
        Self::new(ShapeKind::Line(Line::new(length)))
    }

    /// Rectangle.
    #[must_use]
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Box(BoxShape::new(width, height)))
    }

    /// Convex polygon from counter-clockwise vertices.
    ///
    /// # Errors
    ///
    /// See [`Convex::new`].
    pub fn convex(vertices: Vec<Vec2>) -> Result<Self> {
        Ok(Self::new(ShapeKind::Convex(Convex::new(vertices)?)))
    }

    /// Capsule.
    #[must_use]
    pub fn capsule(length: f64, radius: f64) -> Self {
        Self::new(ShapeKind::Capsule(Capsule::new(length, radius)))
    }

    /// Heightfield.
    ///
    /// # Errors
    ///
    /// See [`Heightfield::new`].
    pub fn heightfield(heights: Vec<f64>, element_width: f64) -> Result<Self> {
        Ok(Self::new(ShapeKind::Heightfield(Heightfield::new(heights, element_width)?)))
    }

    /// Set the collision group.
    #[must_use]
    pub fn with_collision_group(mut self, group: u32) -> Self {
        self.collision_group = group;
        self
    }

    /// Set the collision mask.
    #[must_use]
    pub fn with_collision_mask(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Make this shape a sensor.
    #[must_use]
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set collision response.
    #[must_use]
    pub fn with_collision_response(mut self, response: bool) -> Self {
        self.collision_response = response;
        self
    }

    /// Set the material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Shape handle.
    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Geometry.
    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Dispatch tag.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Offset in the body frame.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Angle in the body frame.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Radius of the circle around the shape origin enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Check if both shapes let each other through their group filters.
    #[must_use]
    pub fn filter_accepts(&self, other: &Self) -> bool {
        self.collision_group & other.collision_mask != 0 && other.collision_group & self.collision_mask != 0
    }

    /// Moment of inertia for unit mass about the shape origin.
    #[must_use]
    pub fn compute_moment_of_inertia(&self) -> f64 {
        match &self.kind {
            ShapeKind::Circle(c) => c.moment_of_inertia(),
            ShapeKind::Particle => 0.0,
            ShapeKind::Plane | ShapeKind::Heightfield(_) => f64::MAX,
            ShapeKind::Convex(c) => c.moment_of_inertia(),
            ShapeKind::Line(l) => l.moment_of_inertia(),
            ShapeKind::Box(b) => b.moment_of_inertia(),
            ShapeKind::Capsule(c) => c.moment_of_inertia(),
        }
    }

    /// World AABB for the shape placed at `position` and `angle`.
    #[must_use]
    pub fn compute_aabb(&self, position: &Vec2, angle: f64) -> Aabb {
        match &self.kind {
            ShapeKind::Circle(c) => c.aabb(position),
            ShapeKind::Particle => Aabb::new(*position, *position),
            ShapeKind::Plane => plane::plane_aabb(position, angle),
            ShapeKind::Convex(c) => c.aabb(position, angle),
            ShapeKind::Line(l) => l.aabb(position, angle),
            ShapeKind::Box(b) => b.polygon().aabb(position, angle),
            ShapeKind::Capsule(c) => c.aabb(position, angle),
            ShapeKind::Heightfield(h) => h.aabb(position),
        }
    }

    /// Recompute the bounding radius.
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = match &self.kind {
            ShapeKind::Circle(c) => c.radius(),
            ShapeKind::Particle => 0.0,
            ShapeKind::Plane | ShapeKind::Heightfield(_) => f64::MAX,
            ShapeKind::Convex(c) => c.bounding_radius(),
            ShapeKind::Line(l) => l.length() / 2.0,
            ShapeKind::Box(b) => b.polygon().bounding_radius(),
            ShapeKind::Capsule(c) => c.bounding_radius(),
        };
    }

    /// Recompute the area.
    pub fn update_area(&mut self) {
        self.area = match &self.kind {
            ShapeKind::Circle(c) => c.area(),
            ShapeKind::Particle | ShapeKind::Line(_) => 0.0,
            ShapeKind::Plane => f64::MAX,
            ShapeKind::Convex(c) => c.area(),
            ShapeKind::Box(b) => b.area(),
            ShapeKind::Capsule(c) => c.area(),
            ShapeKind::Heightfield(h) => h.area(),
        };
    }

    /// Check if a point in the shape frame is inside the shape.
    #[must_use]
    pub fn point_test(&self, local_point: &Vec2) -> bool {
        match &self.kind {
            ShapeKind::Circle(c) => c.point_test(local_point),
            ShapeKind::Particle | ShapeKind::Line(_) => false,
            ShapeKind::Plane => local_point.y <= 0.0,
            ShapeKind::Convex(c) => c.point_test(local_point),
            ShapeKind::Box(b) => b.polygon().point_test(local_point),
            ShapeKind::Capsule(c) => c.point_test(local_point),
            ShapeKind::Heightfield(h) => h.point_test(local_point),
        }
    }

    /// Intersect the shape placed at `position` and `angle` with a ray.
    pub fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2, angle: f64) {
        match &self.kind {
            ShapeKind::Circle(c) => c.raycast(caster, position),
            ShapeKind::Particle => {}
            ShapeKind::Plane => plane::raycast(caster, position, angle),
            ShapeKind::Convex(c) => c.raycast(caster, position, angle),
            ShapeKind::Line(l) => l.raycast(caster, position, angle),
            ShapeKind::Box(b) => b.polygon().raycast(caster, position, angle),
            ShapeKind::Capsule(c) => c.raycast(caster, position, angle),
            ShapeKind::Heightfield(h) => h.raycast(caster, position),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planar_types::math::vec2;

    #[test]
    fn test_ids_are_unique() {
        let a = Shape::circle(1.0);
        let b = Shape::circle(1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_dispatch_order() {
        assert!(ShapeType::Circle < ShapeType::Particle);
        assert!(ShapeType::Plane < ShapeType::Convex);
        assert!(ShapeType::Box < ShapeType::Capsule);
        assert!(ShapeType::Capsule < ShapeType::Heightfield);
        assert_eq!(Shape::rectangle(1.0, 1.0).shape_type(), ShapeType::Box);
    }

    #[test]
    fn test_box_inertia_and_area() {
        let s = Shape::rectangle(3.0, 4.0);
        assert_relative_eq!(s.compute_moment_of_inertia(), (9.0 + 16.0) / 12.0);
        assert_relative_eq!(s.area(), 12.0);
        assert_relative_eq!(s.bounding_radius(), 2.5);
        assert!(s.kind().as_convex().is_some());
    }

    #[test]
    fn test_infinite_shapes() {
        let plane = Shape::plane();
        assert_eq!(plane.compute_moment_of_inertia(), f64::MAX);
        assert_eq!(plane.area(), f64::MAX);
        assert!(plane.point_test(&vec2(3.0, -0.1)));
        assert!(!plane.point_test(&vec2(3.0, 0.1)));

        let hf = Shape::heightfield(vec![0.0, 0.0], 1.0).unwrap();
        assert_eq!(hf.bounding_radius(), f64::MAX);
    }

    #[test]
    fn test_particle_is_degenerate() {
        let p = Shape::particle();
        assert_eq!(p.compute_moment_of_inertia(), 0.0);
        assert_eq!(p.area(), 0.0);
        assert!(!p.point_test(&Vec2::zeros()));
        let aabb = p.compute_aabb(&vec2(1.0, 2.0), 0.3);
        assert_eq!(aabb.lower_bound, aabb.upper_bound);
    }

    #[test]
    fn test_filter() {
        let a = Shape::circle(1.0).with_collision_group(0b01).with_collision_mask(0b10);
        let b = Shape::circle(1.0).with_collision_group(0b10).with_collision_mask(0b01);
        let c = Shape::circle(1.0).with_collision_group(0b10).with_collision_mask(0b10);
        assert!(a.filter_accepts(&b));
        assert!(!a.filter_accepts(&c));
    }

    #[test]
    fn test_convex_constructor_propagates_winding_error() {
        let cw = vec![vec2(0.0, 0.0), vec2(0.0, 1.0), vec2(1.0, 0.0)];
        assert!(Shape::convex(cw).is_err());
    }
}
