//! Circle shape.

use std::f64::consts::PI;

use planar_types::Aabb;
use planar_types::math::{Vec2, lerp, normalize_or_zero};

use crate::ray::RayCaster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A disc centred on the shape origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    radius: f64,
}

impl Circle {
    /// Create a circle.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Moment of inertia for unit mass.
    #[must_use]
    pub fn moment_of_inertia(&self) -> f64 {
        self.radius * self.radius / 2.0
    }

    /// Area.
    #[must_use]
    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    /// World AABB at `position`.
    #[must_use]
    pub fn aabb(&self, position: &Vec2) -> Aabb {
        Aabb::from_center(*position, Vec2::new(self.radius, self.radius))
    }

    /// Check if a local point is inside.
    #[must_use]
    pub fn point_test(&self, local_point: &Vec2) -> bool {
        local_point.norm_squared() <= self.radius * self.radius
    }

    pub(crate) fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2) {
        let (from, to) = caster.endpoints();
        for fraction in segment_circle_fractions(&from, &to, position, self.radius)
            .into_iter()
            .flatten()
        {
            let point = lerp(&from, &to, fraction);
            caster.report(fraction, normalize_or_zero(&(point - position)), None);
            if caster.should_stop() {
                return;
            }
        }
    }
}

/// Fractions in `[0, 1]` where the segment crosses a circle, entry first.
///
/// A tangent segment yields a single fraction; a zero-length segment none.
pub(crate) fn segment_circle_fractions(from: &Vec2, to: &Vec2, center: &Vec2, radius: f64) -> [Option<f64>; 2] {
    let d = to - from;
    let f = from - center;
    let a = d.norm_squared();
    if a == 0.0 {
        return [None, None];
    }
    let b = 2.0 * d.dot(&f);
    let c = f.norm_squared() - radius * radius;
    let delta = b * b - 4.0 * a * c;
    if delta < 0.0 {
        return [None, None];
    }
    let in_range = |t: f64| (0.0..=1.0).contains(&t).then_some(t);
    let root = delta.sqrt();
    let inv_2a = 1.0 / (2.0 * a);
    let entry = in_range((-b - root) * inv_2a);
    let exit = if root > 0.0 {
        in_range((-b + root) * inv_2a)
    } else {
        None
    };
    [entry, exit]
}
