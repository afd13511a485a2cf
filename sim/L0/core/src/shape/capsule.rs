//! Capsule shape: a segment along local x swept by a radius.

use std::f64::consts::PI;

use planar_types::Aabb;
use planar_types::math::{Vec2, get_line_segments_intersection_fraction, lerp, normalize_or_zero, rotate, to_global_frame, vec2};

use crate::ray::RayCaster;
use crate::shape::circle::segment_circle_fractions;
use crate::shape::convex::Convex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A stadium of the given segment length and radius.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capsule {
    length: f64,
    radius: f64,
    middle: Convex,
}

impl Capsule {
    /// Create a capsule.
    #[must_use]
    pub fn new(length: f64, radius: f64) -> Self {
        Self {
            length,
            radius,
            middle: Convex::rectangle(length, 2.0 * radius),
        }
    }

    /// Length of the core segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The rectangle between the two end circles.
    #[must_use]
    pub fn middle(&self) -> &Convex {
        &self.middle
    }

    /// World positions of the two end circle centres.
    #[must_use]
    pub fn end_points(&self, position: &Vec2, angle: f64) -> [Vec2; 2] {
        let half = self.length / 2.0;
        [
            to_global_frame(&vec2(-half, 0.0), position, angle),
            to_global_frame(&vec2(half, 0.0), position, angle),
        ]
    }

    /// Area.
    #[must_use]
    pub fn area(&self) -> f64 {
        2.0 * self.radius * self.length + PI * self.radius * self.radius
    }

    /// Moment of inertia for unit mass.
    ///
    /// Rectangle plus two half discs moved out by the parallel axis theorem,
    /// divided by the area.
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        let (l, r) = (self.length, self.radius);
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let box_i = l * (2.0 * r).powi(3) / 12.0;
        let semi_area = PI * r * r / 2.0;
        let semi_i = (PI / 4.0 - 8.0 / (9.0 * PI)) * r.powi(4);
        let semi_centroid = 4.0 * r / (3.0 * PI);
        let d = l / 2.0 + semi_centroid;
        (box_i + 2.0 * (semi_i + semi_area * d * d)) / area
    }

    /// Bounding radius.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.radius + self.length / 2.0
    }

    /// World AABB.
    #[must_use]
    pub fn aabb(&self, position: &Vec2, angle: f64) -> Aabb {
        let end = rotate(&vec2(self.length / 2.0, 0.0), angle);
        let r = self.radius;
        let upper = vec2(end.x.abs() + r, end.y.abs() + r);
        Aabb::new(position - upper, position + upper)
    }

    /// Check if a local point is inside.
    #[must_use]
    pub fn point_test(&self, local_point: &Vec2) -> bool {
        let half = self.length / 2.0;
        let r2 = self.radius * self.radius;
        (local_point.x.abs() <= half && local_point.y.abs() <= self.radius)
            || (local_point - vec2(half, 0.0)).norm_squared() <= r2
            || (local_point - vec2(-half, 0.0)).norm_squared() <= r2
    }

    pub(crate) fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2, angle: f64) {
        let (from, to) = caster.endpoints();
        let half = self.length / 2.0;
        let r = self.radius;

        // Straight sides
        for side in [-1.0, 1.0] {
            let l0 = to_global_frame(&vec2(-half, side * r), position, angle);
            let l1 = to_global_frame(&vec2(half, side * r), position, angle);
            let fraction = get_line_segments_intersection_fraction(&from, &to, &l0, &l1);
            if fraction >= 0.0 {
                let normal = rotate(&vec2(0.0, side), angle);
                caster.report(fraction, normal, None);
                if caster.should_stop() {
                    return;
                }
            }
        }

        // End caps; hits inside the straight part were handled above.
        let diagonal_squared = r * r + half * half;
        for center in self.end_points(position, angle) {
            for fraction in segment_circle_fractions(&from, &to, &center, r).into_iter().flatten() {
                let point = lerp(&from, &to, fraction);
                if (point - position).norm_squared() > diagonal_squared {
                    caster.report(fraction, normalize_or_zero(&(point - center)), None);
                    if caster.should_stop() {
                        return;
                    }
                }
            }
        }
    }
}
