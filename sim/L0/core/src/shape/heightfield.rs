//! Heightfield terrain.
//!
//! Samples are spaced `element_width` apart along local x starting at the
//! shape origin. The solid lies below the polyline. Heightfields ignore the
//! shape angle.

use std::f64::consts::FRAC_PI_2;

use planar_types::math::{Vec2, get_line_segments_intersection_fraction, normalize_or_zero, rotate, vec2};
use planar_types::{Aabb, Result, SimError};

use crate::ray::RayCaster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Depth of the solid below the lowest sample, used by collision tiles and
/// the bounding box.
pub const TILE_DEPTH: f64 = 100.0;

/// Height samples with uniform spacing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Heightfield {
    heights: Vec<f64>,
    element_width: f64,
    min_value: f64,
    max_value: f64,
}

impl Heightfield {
    /// Create a heightfield.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateShape`] for fewer than two samples or a
    /// non-positive element width.
    pub fn new(heights: Vec<f64>, element_width: f64) -> Result<Self> {
        if heights.len() < 2 {
            return Err(SimError::degenerate("heightfield needs at least 2 samples"));
        }
        if !(element_width > 0.0) {
            return Err(SimError::degenerate(format!(
                "heightfield element width must be positive, got {element_width}"
            )));
        }
        let mut field = Self {
            heights,
            element_width,
            min_value: 0.0,
            max_value: 0.0,
        };
        field.update_max_min_values();
        Ok(field)
    }

    /// Height samples.
    #[must_use]
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Spacing between samples.
    #[must_use]
    pub fn element_width(&self) -> f64 {
        self.element_width
    }

    /// Lowest sample.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Highest sample.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.heights.len() - 1
    }

    /// Refresh the cached extremes after editing samples.
    pub fn update_max_min_values(&mut self) {
        self.min_value = self.heights.iter().copied().fold(f64::INFINITY, f64::min);
        self.max_value = self.heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    }

    /// Replace one sample.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `index` is out of range.
    pub fn set_height(&mut self, index: usize, height: f64) -> Result<()> {
        let slot = self
            .heights
            .get_mut(index)
            .ok_or_else(|| SimError::invalid_config(format!("height index {index} out of range")))?;
        *slot = height;
        self.update_max_min_values();
        Ok(())
    }

    /// Ends of segment `i` in the shape frame.
    #[must_use]
    pub fn line_segment(&self, i: usize) -> (Vec2, Vec2) {
        let w = self.element_width;
        (
            vec2(i as f64 * w, self.heights[i]),
            vec2((i + 1) as f64 * w, self.heights[i + 1]),
        )
    }

    /// Segment index under local `x`, possibly outside the field.
    #[must_use]
    pub fn segment_index(&self, x: f64) -> isize {
        (x / self.element_width).floor() as isize
    }

    /// Segment index under local `x`, clamped to a valid segment.
    #[must_use]
    pub fn clamped_segment_index(&self, x: f64) -> usize {
        let last = self.segment_count() as isize - 1;
        self.segment_index(x).clamp(0, last.max(0)) as usize
    }

    /// Interpolated surface height at local `x`, clamped to the field.
    #[must_use]
    pub fn height_at(&self, x: f64) -> f64 {
        let i = self.clamped_segment_index(x);
        let (a, b) = self.line_segment(i);
        let t = ((x - a.x) / (b.x - a.x)).clamp(0.0, 1.0);
        a.y + (b.y - a.y) * t
    }

    /// Area between the surface and `y = 0`.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.heights
            .windows(2)
            .map(|h| self.element_width * (h[0] + h[1]) / 2.0)
            .sum()
    }

    /// World AABB. The angle is ignored.
    #[must_use]
    pub fn aabb(&self, position: &Vec2) -> Aabb {
        let width = self.segment_count() as f64 * self.element_width;
        Aabb::new(
            position + vec2(0.0, self.min_value - TILE_DEPTH),
            position + vec2(width, self.max_value),
        )
    }

    /// Check if a local point lies below the surface.
    #[must_use]
    pub fn point_test(&self, local_point: &Vec2) -> bool {
        let width = self.segment_count() as f64 * self.element_width;
        (0.0..=width).contains(&local_point.x) && local_point.y <= self.height_at(local_point.x)
    }

    pub(crate) fn raycast(&self, caster: &mut RayCaster<'_>, position: &Vec2) {
        let (from, to) = caster.endpoints();
        let local_from = from - position;
        let local_to = to - position;
        let mut i0 = self.clamped_segment_index(local_from.x);
        let mut i1 = self.clamped_segment_index(local_to.x);
        if i0 > i1 {
            std::mem::swap(&mut i0, &mut i1);
        }
        for i in i0..=i1 {
            let (l0, l1) = self.line_segment(i);
            let fraction = get_line_segments_intersection_fraction(&local_from, &local_to, &l0, &l1);
            if fraction >= 0.0 {
                let normal = normalize_or_zero(&rotate(&(l1 - l0), FRAC_PI_2));
                caster.report(fraction, normal, Some(i));
                if caster.should_stop() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::ray::{Ray, RaycastResult};
    use approx::assert_relative_eq;

    fn field() -> Heightfield {
        Heightfield::new(vec![0.0, 1.0, 0.0, 2.0], 1.0).unwrap()
    }

    #[test]
    fn test_rejects_degenerate_fields() {
        assert!(Heightfield::new(vec![1.0], 1.0).is_err());
        assert!(Heightfield::new(vec![1.0, 2.0], 0.0).is_err());
        assert!(Heightfield::new(vec![1.0, 2.0], f64::NAN).is_err());
    }

    #[test]
    fn test_extremes_and_area() {
        let hf = field();
        assert_eq!(hf.min_value(), 0.0);
        assert_eq!(hf.max_value(), 2.0);
        assert_relative_eq!(hf.area(), 0.5 + 0.5 + 1.0);
    }

    #[test]
    fn test_segment_indices() {
        let hf = field();
        assert_eq!(hf.segment_index(-0.5), -1);
        assert_eq!(hf.clamped_segment_index(-0.5), 0);
        assert_eq!(hf.clamped_segment_index(1.5), 1);
        assert_eq!(hf.clamped_segment_index(10.0), 2);
        assert_eq!(hf.line_segment(2), (vec2(2.0, 0.0), vec2(3.0, 2.0)));
    }

    #[test]
    fn test_height_and_point_test() {
        let hf = field();
        assert_relative_eq!(hf.height_at(0.5), 0.5);
        assert!(hf.point_test(&vec2(0.5, 0.4)));
        assert!(!hf.point_test(&vec2(0.5, 0.6)));
        assert!(!hf.point_test(&vec2(-0.5, -5.0)));
    }

    #[test]
    fn test_aabb() {
        let hf = field();
        let aabb = hf.aabb(&vec2(10.0, 0.0));
        assert_eq!(aabb.lower_bound, vec2(10.0, -TILE_DEPTH));
        assert_eq!(aabb.upper_bound, vec2(13.0, 2.0));
    }

    #[test]
    fn test_raycast_hits_surface() {
        let hf = field();
        let ray = Ray::new(vec2(0.5, 5.0), vec2(0.5, -5.0)).with_mode(crate::ray::RayMode::Closest);
        let mut result = RaycastResult::new();
        let mut caster = RayCaster::new(&ray, &mut result);
        hf.raycast(&mut caster, &Vec2::zeros());
        assert_relative_eq!(result.fraction, 0.45, epsilon = 1e-12);
        assert_eq!(result.face_index, Some(0));
        assert!(result.normal.y > 0.0);
    }
}
