//! Shape-pair overlap bookkeeping across steps.
//!
//! The world marks every shape pair that produced contacts during a step.
//! Comparing this step's set with the previous one yields the pairs that
//! started touching and the pairs that stopped.

use hashbrown::HashSet;
use planar_types::{BodyId, ShapeId};

/// One overlapping shape pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapRecord {
    /// Body owning `shape_a`.
    pub body_a: BodyId,
    /// First shape.
    pub shape_a: ShapeId,
    /// Body owning `shape_b`.
    pub body_b: BodyId,
    /// Second shape.
    pub shape_b: ShapeId,
}

impl OverlapRecord {
    fn key(&self) -> (ShapeId, ShapeId) {
        shape_key(self.shape_a, self.shape_b)
    }

    /// Check whether the record involves both bodies, in either order.
    #[must_use]
    pub fn involves_bodies(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }
}

fn shape_key(a: ShapeId, b: ShapeId) -> (ShapeId, ShapeId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Overlapping shape pairs of the current and the previous step.
///
/// Records keep the order in which they were marked, so iteration is the
/// same from run to run.
#[derive(Debug, Clone, Default)]
pub struct OverlapKeeper {
    current: Vec<OverlapRecord>,
    current_keys: HashSet<(ShapeId, ShapeId)>,
    previous: Vec<OverlapRecord>,
    previous_keys: HashSet<(ShapeId, ShapeId)>,
}

impl OverlapKeeper {
    /// Create an empty keeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new step: the current overlaps become the previous ones.
    pub fn tick(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        std::mem::swap(&mut self.previous_keys, &mut self.current_keys);
        self.current.clear();
        self.current_keys.clear();
    }

    /// Mark a shape pair as overlapping in the current step.
    ///
    /// Marking the same pair twice is a no-op.
    pub fn set_overlapping(&mut self, body_a: BodyId, shape_a: ShapeId, body_b: BodyId, shape_b: ShapeId) {
        let record = OverlapRecord {
            body_a,
            shape_a,
            body_b,
            shape_b,
        };
        if self.current_keys.insert(record.key()) {
            self.current.push(record);
        }
    }

    /// Check whether a pair overlaps now but did not in the previous step.
    #[must_use]
    pub fn is_new_overlap(&self, shape_a: ShapeId, shape_b: ShapeId) -> bool {
        let key = shape_key(shape_a, shape_b);
        self.current_keys.contains(&key) && !self.previous_keys.contains(&key)
    }

    /// Pairs that started overlapping this step.
    #[must_use]
    pub fn new_overlaps(&self) -> Vec<OverlapRecord> {
        self.current
            .iter()
            .filter(|r| !self.previous_keys.contains(&r.key()))
            .copied()
            .collect()
    }

    /// Pairs that overlapped in the previous step but no longer do.
    #[must_use]
    pub fn ended_overlaps(&self) -> Vec<OverlapRecord> {
        self.previous
            .iter()
            .filter(|r| !self.current_keys.contains(&r.key()))
            .copied()
            .collect()
    }

    /// Check whether any shapes of two bodies overlap in the current step.
    #[must_use]
    pub fn bodies_are_overlapping(&self, a: BodyId, b: BodyId) -> bool {
        self.current.iter().any(|r| r.involves_bodies(a, b))
    }

    /// Overlaps of the current step.
    #[must_use]
    pub fn overlaps(&self) -> &[OverlapRecord] {
        &self.current
    }

    /// Forget every record involving a body.
    ///
    /// Used when a body leaves the world so no end event refers to it.
    pub fn remove_body(&mut self, body: BodyId) {
        self.current.retain(|r| r.body_a != body && r.body_b != body);
        self.previous.retain(|r| r.body_a != body && r.body_b != body);
        self.current_keys = self.current.iter().map(OverlapRecord::key).collect();
        self.previous_keys = self.previous.iter().map(OverlapRecord::key).collect();
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.current.clear();
        self.current_keys.clear();
        self.previous.clear();
        self.previous_keys.clear();
    }
}
