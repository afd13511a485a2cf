//! Line segment shape.

use planar_types::Aabb;
use planar_types::math::{Vec2, get_line_segments_intersection_fraction, rotate, to_global_frame, vec2};

use crate::ray::RayCaster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A segment of the given length centred on the shape origin, along local x.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Line {
    length: f64,
}

impl Line {
    /// Create a line.
    #[must_use]
    pub fn new(length: f64) -> Self {
        Self { length }
    }

    /// Length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// World positions of both ends.
    #[must_use]
    pub fn end_points(&self, position: &Vec2, angle: f64) -> [Vec2; 2] {
        let half = self.length / 2.0;
        [
            to_global_frame(&vec2(-half, 0.0), position, angle),
            to_global_frame(&vec2(half, 0.0), position, angle),
        ]
    }

    /// Moment of inertia for unit mass.
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        self.length * self.length / 12.0
    }

    /// World AABB.
    #[must_use]
    pub fn aabb(&self, position: &Vec2, angle: f64) -> Aabb {
        let half = self.length / 2.0;
        Aabb::from_points(&[vec2(-half, 0.0), vec2(half, 0.0)], position, angle, 0.0)
    }

    pub(crate) fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2, angle: f64) {
        let (from, to) = caster.endpoints();
        let [l0, l1] = self.end_points(position, angle);
        let fraction = get_line_segments_intersection_fraction(&from, &to, &l0, &l1);
        if fraction < 0.0 {
            return;
        }
        let mut normal = rotate(&vec2(0.0, 1.0), angle);
        if normal.dot(&caster.ray().direction()) > 0.0 {
            normal = -normal;
        }
        caster.report(fraction, normal, None);
    }
}
