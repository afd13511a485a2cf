//! 2D vector kernel.
//!
//! Thin helpers over [`nalgebra::Vector2`]. Everything takes and returns values
//! on the stack; there is no shared scratch state, so any of these may be
//! called from anywhere without coordination.
//!
//! Angles are in radians, counter-clockwise positive. Frames are described
//! by a position and an angle, the same pair every body and shape carries.

use nalgebra::Vector2;

/// The 2D vector type used throughout the engine.
pub type Vec2 = Vector2<f64>;

/// Shorthand constructor.
#[must_use]
#[inline]
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Z component of the 3D cross product of `a` and `b`.
#[must_use]
#[inline]
pub fn cross_length(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a 2D vector with a z-axis scalar, `v × (0, 0, z)`.
#[must_use]
#[inline]
pub fn cross_vz(v: &Vec2, z: f64) -> Vec2 {
    Vec2::new(v.y * z, -v.x * z)
}

/// Cross product of a z-axis scalar with a 2D vector, `(0, 0, z) × v`.
#[must_use]
#[inline]
pub fn cross_zv(z: f64, v: &Vec2) -> Vec2 {
    Vec2::new(-v.y * z, v.x * z)
}

/// Rotate a vector counter-clockwise by `angle`.
#[must_use]
#[inline]
pub fn rotate(v: &Vec2, angle: f64) -> Vec2 {
    if angle == 0.0 {
        return *v;
    }
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Rotate a vector 90 degrees clockwise.
///
/// For an edge of a counter-clockwise polygon this yields the outward normal.
#[must_use]
#[inline]
pub fn rotate90cw(v: &Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Express a world point in the frame at (`position`, `angle`).
#[must_use]
#[inline]
pub fn to_local_frame(world_point: &Vec2, position: &Vec2, angle: f64) -> Vec2 {
    rotate(&(world_point - position), -angle)
}

/// Express a frame-local point in world coordinates.
#[must_use]
#[inline]
pub fn to_global_frame(local_point: &Vec2, position: &Vec2, angle: f64) -> Vec2 {
    rotate(local_point, angle) + position
}

/// Rotate a world direction into a frame with the given angle.
#[must_use]
#[inline]
pub fn vector_to_local_frame(world_vector: &Vec2, angle: f64) -> Vec2 {
    rotate(world_vector, -angle)
}

/// Rotate a frame-local direction into world orientation.
#[must_use]
#[inline]
pub fn vector_to_global_frame(local_vector: &Vec2, angle: f64) -> Vec2 {
    rotate(local_vector, angle)
}

/// Centroid of a triangle.
#[must_use]
#[inline]
pub fn centroid(a: &Vec2, b: &Vec2, c: &Vec2) -> Vec2 {
    (a + b + c) / 3.0
}

/// Normalize a vector, leaving the zero vector unchanged.
#[must_use]
#[inline]
pub fn normalize_or_zero(v: &Vec2) -> Vec2 {
    let len_sq = v.norm_squared();
    if len_sq > 0.0 {
        v / len_sq.sqrt()
    } else {
        Vec2::zeros()
    }
}

/// Linear interpolation between `a` (t = 0) and `b` (t = 1).
#[must_use]
#[inline]
pub fn lerp(a: &Vec2, b: &Vec2, t: f64) -> Vec2 {
    a + (b - a) * t
}

/// Reflect `v` about a unit `normal`.
#[must_use]
#[inline]
pub fn reflect(v: &Vec2, normal: &Vec2) -> Vec2 {
    v - normal * (2.0 * v.dot(normal))
}

/// Fraction along segment `p0 → p1` at which it crosses segment `p2 → p3`.
///
/// Returns `-1.0` when the segments do not intersect or are parallel.
#[must_use]
pub fn get_line_segments_intersection_fraction(p0: &Vec2, p1: &Vec2, p2: &Vec2, p3: &Vec2) -> f64 {
    let s1 = p1 - p0;
    let s2 = p3 - p2;
    let denom = -s2.x * s1.y + s1.x * s2.y;
    if denom == 0.0 {
        return -1.0;
    }
    let s = (-s1.y * (p0.x - p2.x) + s1.x * (p0.y - p2.y)) / denom;
    let t = (s2.x * (p0.y - p2.y) - s2.y * (p0.x - p2.x)) / denom;
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        t
    } else {
        -1.0
    }
}

/// Intersection point of segments `p0 → p1` and `p2 → p3`, if any.
#[must_use]
pub fn get_line_segments_intersection(p0: &Vec2, p1: &Vec2, p2: &Vec2, p3: &Vec2) -> Option<Vec2> {
    let t = get_line_segments_intersection_fraction(p0, p1, p2, p3);
    if t < 0.0 {
        None
    } else {
        Some(lerp(p0, p1, t))
    }
}
