//! Broad-phase collision detection.
//!
//! The broad phase turns the body list into a short list of candidate
//! pairs for the narrow phase. Pairs are written flat into a `Vec<usize>` of
//! body indices, `(out[2i], out[2i + 1])` forming one pair.
//!
//! Two algorithms are provided:
//!
//! - [`NaiveBroadPhase`] tests every pair, which is fine for small scenes
//! - [`SweepAndPrune`] keeps the bodies sorted along one axis by insertion
//!   sort and sweeps the sorted list. Frame-to-frame the order barely
//!   changes, so the sort is close to linear.
//!
//! Both filter pairs with [`can_collide`] and then run the configured
//! [`BoundingVolume`] check. Surviving pairs may still not touch; the narrow
//! phase has the final word.

use std::fmt;

use planar_types::{Aabb, Axis, BoundingVolume, BroadphaseKind, SleepState};

use crate::body::Body;

/// Candidate pair search over a body slice.
///
/// Indices refer to the body slice passed in. The world reports every
/// insertion and removal so implementations that keep per-body state can
/// follow along.
pub trait BroadPhase: fmt::Debug {
    /// Append candidate pairs to `out` as consecutive index pairs.
    fn collision_pairs(&mut self, bodies: &[Body], out: &mut Vec<usize>);

    /// Append the indices of bodies whose AABB overlaps `aabb`.
    fn aabb_query(&mut self, bodies: &[Body], aabb: &Aabb, out: &mut Vec<usize>) {
        out.extend(
            bodies
                .iter()
                .enumerate()
                .filter(|(_, body)| aabb.overlaps(&body.aabb()))
                .map(|(i, _)| i),
        );
    }

    /// A body was pushed at `index`.
    fn body_added(&mut self, _index: usize) {}

    /// The body at `index` was removed and later bodies moved down by one.
    fn body_removed(&mut self, _index: usize) {}

    /// Forget every body.
    fn clear(&mut self) {}

    /// The bounding volume used by the overlap check.
    fn bounding_volume(&self) -> BoundingVolume;
}

/// Create the broad phase selected in the world configuration.
#[must_use]
pub fn from_config(kind: BroadphaseKind, bounding_volume: BoundingVolume, axis: Axis) -> Box<dyn BroadPhase> {
    match kind {
        BroadphaseKind::Naive => Box::new(NaiveBroadPhase::new().with_bounding_volume(bounding_volume)),
        BroadphaseKind::SweepAndPrune => Box::new(
            SweepAndPrune::new()
                .with_axis(axis)
                .with_bounding_volume(bounding_volume),
        ),
    }
}

/// Check whether two bodies may generate contacts at all.
///
/// Rejects pairs where neither body can move: two static or kinematic
/// bodies in any combination, two sleeping bodies, and a sleeping body
/// against a static one.
#[must_use]
pub fn can_collide(a: &Body, b: &Body) -> bool {
    let (ta, tb) = (a.body_type(), b.body_type());
    if !ta.is_dynamic() && !tb.is_dynamic() {
        return false;
    }
    let sleeping_a = a.sleep_state() == SleepState::Sleeping;
    let sleeping_b = b.sleep_state() == SleepState::Sleeping;
    if sleeping_a && sleeping_b {
        return false;
    }
    if (sleeping_a && tb.is_static()) || (sleeping_b && ta.is_static()) {
        return false;
    }
    true
}

/// Bounding circle overlap, using each body's bounding radius.
#[must_use]
pub fn bounding_radius_check(a: &Body, b: &Body) -> bool {
    let d2 = (b.position() - a.position()).norm_squared();
    let r = a.bounding_radius() + b.bounding_radius();
    d2 <= r * r
}

/// AABB overlap.
#[must_use]
pub fn aabb_check(a: &Body, b: &Body) -> bool {
    a.aabb().overlaps(&b.aabb())
}

/// Run the selected bounding volume check.
#[must_use]
pub fn bounding_volume_check(a: &Body, b: &Body, volume: BoundingVolume) -> bool {
    match volume {
        BoundingVolume::Aabb => aabb_check(a, b),
        BoundingVolume::BoundingCircle => bounding_radius_check(a, b),
    }
}

// ============================================================================
// Naive
// ============================================================================

/// All-pairs broad phase.
#[derive(Debug, Clone, Default)]
pub struct NaiveBroadPhase {
    bounding_volume: BoundingVolume,
}

impl NaiveBroadPhase {
    /// Create a naive broad phase using AABBs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the bounding volume.
    #[must_use]
    pub fn with_bounding_volume(mut self, volume: BoundingVolume) -> Self {
        self.bounding_volume = volume;
        self
    }
}

impl BroadPhase for NaiveBroadPhase {
    fn collision_pairs(&mut self, bodies: &[Body], out: &mut Vec<usize>) {
        for i in 0..bodies.len() {
            let bi = &bodies[i];
            for (j, bj) in bodies.iter().enumerate().take(i) {
                if can_collide(bi, bj) && bounding_volume_check(bi, bj, self.bounding_volume) {
                    out.push(i);
                    out.push(j);
                }
            }
        }
    }

    fn bounding_volume(&self) -> BoundingVolume {
        self.bounding_volume
    }
}

// ============================================================================
// Sweep and prune
// ============================================================================

/// Single-axis sweep and prune.
///
/// The sorted axis list survives across steps, so the insertion sort only
/// has to repair the few bodies that swapped places since the last call.
#[derive(Debug, Clone, Default)]
pub struct SweepAndPrune {
    axis_list: Vec<usize>,
    axis: Axis,
    bounding_volume: BoundingVolume,
}

impl SweepAndPrune {
    /// Create a sweep and prune along x.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the sweep axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Select the bounding volume.
    #[must_use]
    pub fn with_bounding_volume(mut self, volume: BoundingVolume) -> Self {
        self.bounding_volume = volume;
        self
    }

    /// Sweep axis.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Change the sweep axis. The list is re-sorted on the next query.
    pub fn set_axis(&mut self, axis: Axis) {
        self.axis = axis;
    }

    /// Body indices in sweep order.
    #[must_use]
    pub fn axis_list(&self) -> &[usize] {
        &self.axis_list
    }

    /// Insertion sort of `list` by AABB lower bound along `axis`.
    fn sort_list(list: &mut [usize], aabbs: &[Aabb], axis: Axis) {
        for i in 1..list.len() {
            let v = list[i];
            let key = aabbs[v].min_on_axis(axis);
            let mut j = i;
            while j > 0 && aabbs[list[j - 1]].min_on_axis(axis) > key {
                list[j] = list[j - 1];
                j -= 1;
            }
            list[j] = v;
        }
    }

    /// Keep the list in sync with a body slice of a different length.
    fn sync(&mut self, len: usize) {
        if self.axis_list.len() != len {
            self.axis_list.retain(|&i| i < len);
            for i in 0..len {
                if !self.axis_list.contains(&i) {
                    self.axis_list.push(i);
                }
            }
        }
    }
}

impl BroadPhase for SweepAndPrune {
    fn collision_pairs(&mut self, bodies: &[Body], out: &mut Vec<usize>) {
        self.sync(bodies.len());
        let aabbs: Vec<Aabb> = bodies.iter().map(Body::aabb).collect();
        Self::sort_list(&mut self.axis_list, &aabbs, self.axis);

        let n = self.axis_list.len();
        for i in 0..n {
            let ia = self.axis_list[i];
            let upper = aabbs[ia].max_on_axis(self.axis);
            for j in (i + 1)..n {
                let ib = self.axis_list[j];
                if aabbs[ib].min_on_axis(self.axis) > upper {
                    break;
                }
                let (a, b) = (&bodies[ia], &bodies[ib]);
                if can_collide(a, b) && bounding_volume_check(a, b, self.bounding_volume) {
                    out.push(ia);
                    out.push(ib);
                }
            }
        }
    }

    fn body_added(&mut self, index: usize) {
        self.axis_list.push(index);
    }

    fn body_removed(&mut self, index: usize) {
        self.axis_list.retain(|&i| i != index);
        for i in &mut self.axis_list {
            if *i > index {
                *i -= 1;
            }
        }
    }

    fn clear(&mut self) {
        self.axis_list.clear();
    }

    fn bounding_volume(&self) -> BoundingVolume {
        self.bounding_volume
    }
}
