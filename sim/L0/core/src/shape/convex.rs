//! Convex polygons and boxes.
//!
//! Vertices are stored counter-clockwise in the shape frame. Every edge `i`
//! runs from vertex `i` to vertex `i + 1` and has an outward unit normal
//! (the edge direction rotated 90° clockwise). Mass properties come from a
//! fan triangulation around vertex 0.

use std::f64::consts::FRAC_PI_2;

use planar_types::math::{
    Vec2, centroid, cross_length, get_line_segments_intersection_fraction, normalize_or_zero, rotate,
    rotate90cw, to_local_frame, vec2,
};
use planar_types::{Aabb, Result, SimError};

use crate::ray::RayCaster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A convex polygon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Convex {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    triangles: Vec<[usize; 3]>,
    center_of_mass: Vec2,
    area: f64,
    bounding_radius: f64,
}

impl Convex {
    /// Build a polygon from counter-clockwise vertices.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateShape`] for fewer than 3 vertices and
    /// [`SimError::ClockwiseWinding`] when the signed area is negative.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(SimError::degenerate(format!(
                "convex needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        let convex = Self::from_vertices(vertices);
        if convex.area < 0.0 {
            return Err(SimError::ClockwiseWinding {
                signed_area: convex.area,
            });
        }
        Ok(convex)
    }

    /// Axis-aligned rectangle centred on the origin.
    #[must_use]
    pub fn rectangle(width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::from_vertices(vec![vec2(-hw, -hh), vec2(hw, -hh), vec2(hw, hh), vec2(-hw, hh)])
    }

    pub(crate) fn from_vertices(vertices: Vec<Vec2>) -> Self {
        let mut convex = Self {
            vertices,
            normals: Vec::new(),
            triangles: Vec::new(),
            center_of_mass: Vec2::zeros(),
            area: 0.0,
            bounding_radius: 0.0,
        };
        convex.update_normals();
        convex.update_triangles();
        convex.update_center_of_mass();
        convex.update_area();
        convex.update_bounding_radius();
        convex
    }

    /// Vertices in the shape frame.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward edge normals; `normals()[i]` belongs to edge `i → i+1`.
    #[must_use]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Fan triangulation as vertex index triples.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Centre of mass in the shape frame.
    #[must_use]
    pub fn center_of_mass(&self) -> Vec2 {
        self.center_of_mass
    }

    /// Signed area (positive for counter-clockwise vertices).
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Distance from the origin to the farthest vertex.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Recompute the edge normals.
    pub fn update_normals(&mut self) {
        let n = self.vertices.len();
        self.normals = (0..n)
            .map(|i| {
                let edge = self.vertices[(i + 1) % n] - self.vertices[i];
                rotate90cw(&normalize_or_zero(&edge))
            })
            .collect();
    }

    /// Recompute the fan triangulation.
    pub fn update_triangles(&mut self) {
        let n = self.vertices.len();
        self.triangles = (1..n.saturating_sub(1)).map(|i| [0, i, i + 1]).collect();
    }

    /// Recompute the centre of mass; the origin when the area is zero.
    pub fn update_center_of_mass(&mut self) {
        let mut weighted = Vec2::zeros();
        let mut total = 0.0;
        for [a, b, c] in &self.triangles {
            let (a, b, c) = (&self.vertices[*a], &self.vertices[*b], &self.vertices[*c]);
            let m = Self::triangle_area(a, b, c);
            weighted += centroid(a, b, c) * m;
            total += m;
        }
        self.center_of_mass = if total == 0.0 {
            Vec2::zeros()
        } else {
            weighted / total
        };
    }

    /// Recompute the signed area.
    pub fn update_area(&mut self) {
        self.area = self
            .triangles
            .iter()
            .map(|[a, b, c]| Self::triangle_area(&self.vertices[*a], &self.vertices[*b], &self.vertices[*c]))
            .sum();
    }

    /// Recompute the bounding radius.
    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = self.vertices.iter().map(Vec2::norm).fold(0.0, f64::max);
    }

    /// Signed area of a triangle, positive when counter-clockwise.
    #[must_use]
    pub fn triangle_area(a: &Vec2, b: &Vec2, c: &Vec2) -> f64 {
        cross_length(&(b - a), &(c - a)) / 2.0
    }

    /// Moment of inertia for unit mass about the shape origin.
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        let n = self.vertices.len();
        let mut numer = 0.0;
        let mut denom = 0.0;
        for i in 0..n {
            let p0 = &self.vertices[(i + n - 1) % n];
            let p1 = &self.vertices[i];
            let a = cross_length(p0, p1).abs();
            let b = p1.dot(p1) + p1.dot(p0) + p0.dot(p0);
            denom += a;
            numer += a * b;
        }
        if denom == 0.0 {
            return 0.0;
        }
        numer / (6.0 * denom)
    }

    /// World AABB.
    #[must_use]
    pub fn aabb(&self, position: &Vec2, angle: f64) -> Aabb {
        Aabb::from_points(&self.vertices, position, angle, 0.0)
    }

    /// Check if a local point is inside or on the boundary.
    #[must_use]
    pub fn point_test(&self, local_point: &Vec2) -> bool {
        let n = self.vertices.len();
        let mut last_cross: Option<f64> = None;
        for i in 0..=n {
            let r0 = self.vertices[i % n] - local_point;
            let r1 = self.vertices[(i + 1) % n] - local_point;
            let cross = cross_length(&r0, &r1);
            if let Some(last) = last_cross
                && cross * last < 0.0
            {
                return false;
            }
            last_cross = Some(cross);
        }
        true
    }

    pub(crate) fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2, angle: f64) {
        let (from, to) = caster.endpoints();
        let start = to_local_frame(&from, position, angle);
        let end = to_local_frame(&to, position, angle);
        let n = self.vertices.len();
        for i in 0..n {
            if caster.should_stop() {
                return;
            }
            let q1 = self.vertices[i];
            let q2 = self.vertices[(i + 1) % n];
            let fraction = get_line_segments_intersection_fraction(&start, &end, &q1, &q2);
            if fraction >= 0.0 {
                let normal = normalize_or_zero(&rotate(&(q2 - q1), angle - FRAC_PI_2));
                caster.report(fraction, normal, Some(i));
            }
        }
    }
}

/// A rectangle, stored as a four-vertex [`Convex`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxShape {
    width: f64,
    height: f64,
    polygon: Convex,
}

impl BoxShape {
    /// Create a box centred on the shape origin.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            polygon: Convex::rectangle(width, height),
        }
    }

    /// Width along local x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height along local y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The underlying polygon.
    #[must_use]
    pub fn polygon(&self) -> &Convex {
        &self.polygon
    }

    /// Moment of inertia for unit mass.
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        (self.width * self.width + self.height * self.height) / 12.0
    }

    /// Area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}
