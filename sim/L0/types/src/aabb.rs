//! Axis-aligned bounding boxes.

use crate::math::{Vec2, rotate};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coordinate axis selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// The x axis.
    #[default]
    X,
    /// The y axis.
    Y,
}

impl Axis {
    /// Component index of this axis in a [`Vec2`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub lower_bound: Vec2,
    /// Maximum corner of the bounding box.
    pub upper_bound: Vec2,
}

impl Aabb {
    /// Create a new AABB from minimum and maximum corners.
    #[must_use]
    pub const fn new(lower_bound: Vec2, upper_bound: Vec2) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }

    /// Create an AABB centered at a point with the given half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            lower_bound: center - half_extents,
            upper_bound: center + half_extents,
        }
    }

    /// Bound a set of frame-local points placed in the frame (`position`, `angle`).
    ///
    /// `skin` grows the result on every side. An empty point set yields a
    /// degenerate box at `position`.
    #[must_use]
    pub fn from_points(points: &[Vec2], position: &Vec2, angle: f64, skin: f64) -> Self {
        let mut iter = points.iter().map(|p| rotate(p, angle));
        let Some(first) = iter.next() else {
            return Self::new(*position, *position);
        };
        let mut lower = first;
        let mut upper = first;
        for p in iter {
            lower = lower.inf(&p);
            upper = upper.sup(&p);
        }
        let skin = Vec2::new(skin, skin);
        Self {
            lower_bound: lower + position - skin,
            upper_bound: upper + position + skin,
        }
    }

    /// Grow this box to also enclose `other`.
    pub fn extend(&mut self, other: &Self) {
        self.lower_bound = self.lower_bound.inf(&other.lower_bound);
        self.upper_bound = self.upper_bound.sup(&other.upper_bound);
    }

    /// Check if this AABB overlaps with another AABB.
    ///
    /// Touching boxes count as overlapping.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower_bound.x <= other.upper_bound.x
            && self.upper_bound.x >= other.lower_bound.x
            && self.lower_bound.y <= other.upper_bound.y
            && self.upper_bound.y >= other.lower_bound.y
    }

    /// Check whether a point lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, point: &Vec2) -> bool {
        self.lower_bound.x <= point.x
            && point.x <= self.upper_bound.x
            && self.lower_bound.y <= point.y
            && point.y <= self.upper_bound.y
    }

    /// Slab test against a ray.
    ///
    /// `direction` must be the unit direction of the ray and `length` its
    /// length. Returns the entry fraction along the ray, or `-1.0` when the
    /// ray misses the box or the box lies entirely behind the origin.
    #[must_use]
    pub fn overlaps_ray(&self, from: &Vec2, direction: &Vec2, length: f64) -> f64 {
        let inv_x = 1.0 / direction.x;
        let inv_y = 1.0 / direction.y;

        let t1 = (self.lower_bound.x - from.x) * inv_x;
        let t2 = (self.upper_bound.x - from.x) * inv_x;
        let t3 = (self.lower_bound.y - from.y) * inv_y;
        let t4 = (self.upper_bound.y - from.y) * inv_y;

        let tmin = t1.min(t2).max(t3.min(t4));
        let tmax = t1.max(t2).min(t3.max(t4));

        if tmax < 0.0 || tmin > tmax || length <= 0.0 {
            return -1.0;
        }
        tmin / length
    }

    /// Expand this AABB by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec2::new(margin, margin);
        Self {
            lower_bound: self.lower_bound - m,
            upper_bound: self.upper_bound + m,
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.lower_bound + self.upper_bound) * 0.5
    }

    /// Half the size of the box along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        (self.upper_bound - self.lower_bound) * 0.5
    }

    /// Get the extent (size) along a specific axis.
    #[must_use]
    pub fn extent(&self, axis: Axis) -> f64 {
        self.max_on_axis(axis) - self.min_on_axis(axis)
    }

    /// Get the minimum value along a specific axis.
    #[must_use]
    pub fn min_on_axis(&self, axis: Axis) -> f64 {
        self.lower_bound[axis.index()]
    }

    /// Get the maximum value along a specific axis.
    #[must_use]
    pub fn max_on_axis(&self, axis: Axis) -> f64 {
        self.upper_bound[axis.index()]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec2::zeros(), Vec2::zeros())
    }
}
