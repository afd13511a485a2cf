//! Infinite half-space.
//!
//! The surface runs along the local x-axis with the normal along local +y.
//! Everything below the surface is solid.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use planar_types::Aabb;
use planar_types::math::{Vec2, rotate, vec2};

use crate::ray::RayCaster;

/// Half extent of the box reported for planes.
pub const PLANE_EXTENT: f64 = 1e7;

/// World normal of a plane at `angle`.
#[must_use]
pub fn plane_normal(angle: f64) -> Vec2 {
    rotate(&vec2(0.0, 1.0), angle)
}

/// Bounding box of a plane at the given pose.
///
/// Axis-aligned planes clamp the side facing away from the solid at the
/// plane position; every other angle yields the full extent.
#[must_use]
#[allow(clippy::float_cmp)] // only exact axis-aligned angles are clamped
pub fn plane_aabb(position: &Vec2, angle: f64) -> Aabb {
    let a = angle.rem_euclid(TAU);
    let mut lower = vec2(-PLANE_EXTENT, -PLANE_EXTENT);
    let mut upper = vec2(PLANE_EXTENT, PLANE_EXTENT);
    if a == 0.0 {
        upper.y = position.y;
    } else if a == FRAC_PI_2 {
        lower.x = position.x;
    } else if a == PI {
        lower.y = position.y;
    } else if a == 3.0 * FRAC_PI_2 {
        upper.x = position.x;
    }
    Aabb::new(lower, upper)
}

pub(crate) fn raycast(caster: &mut RayCaster<'_>, position: &Vec2, angle: f64) {
    let (from, to) = caster.endpoints();
    let normal = plane_normal(angle);
    let from_depth = (from - position).dot(&normal);
    let to_depth = (to - position).dot(&normal);
    if from_depth * to_depth > 0.0 {
        return;
    }
    if (to - from).norm_squared() < from_depth * from_depth {
        return;
    }
    let ray = caster.ray();
    let n_dot_dir = normal.dot(&ray.direction());
    if n_dot_dir == 0.0 || ray.length() == 0.0 {
        return;
    }
    let fraction = -from_depth / n_dot_dir / ray.length();
    caster.report(fraction, normal, None);
}
