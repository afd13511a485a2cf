//! Recycling of contact and friction rows between steps.

use planar_constraint::Equation;

/// A free list of equations of one kind.
///
/// Released rows are reset before they are stored, so a pooled row never
/// points at a body or shape of an earlier step.
#[derive(Debug, Clone)]
pub struct EquationPool {
    objects: Vec<Equation>,
    create: fn() -> Equation,
}

fn new_contact() -> Equation {
    Equation::contact(planar_constraint::UNBOUND_BODY, planar_constraint::UNBOUND_BODY, f64::MAX)
}

fn new_friction() -> Equation {
    Equation::friction(planar_constraint::UNBOUND_BODY, planar_constraint::UNBOUND_BODY)
}

impl EquationPool {
    /// Pool of contact rows.
    #[must_use]
    pub fn contacts() -> Self {
        Self {
            objects: Vec::new(),
            create: new_contact,
        }
    }

    /// Pool of friction rows.
    #[must_use]
    pub fn frictions() -> Self {
        Self {
            objects: Vec::new(),
            create: new_friction,
        }
    }

    /// Take a row, creating one if the pool is empty.
    pub fn get(&mut self) -> Equation {
        self.objects.pop().unwrap_or_else(self.create)
    }

    /// Return a row to the pool.
    pub fn release(&mut self, mut equation: Equation) {
        equation.reset();
        self.objects.push(equation);
    }

    /// Return many rows at once.
    pub fn release_all(&mut self, equations: impl IntoIterator<Item = Equation>) {
        for equation in equations {
            self.release(equation);
        }
    }

    /// Grow or shrink the pool to `size` rows.
    pub fn resize(&mut self, size: usize) {
        self.objects.truncate(size);
        while self.objects.len() < size {
            self.objects.push((self.create)());
        }
    }

    /// Rows waiting to be reused.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use planar_constraint::UNBOUND_BODY;
    use planar_types::{BodyId, ShapeId};

    #[test]
    fn test_released_rows_are_reset() {
        let mut pool = EquationPool::contacts();
        let mut eq = pool.get();
        eq.body_a = 3;
        eq.body_b = 4;
        eq.offset = 0.5;
        {
            let c = eq.as_contact_mut().unwrap();
            c.shape_a = ShapeId::new(9);
            c.body_id_a = BodyId::new(2);
            c.first_impact = true;
        }
        pool.release(eq);
        assert_eq!(pool.len(), 1);

        let eq = pool.get();
        assert!(pool.is_empty());
        assert_eq!(eq.body_a, UNBOUND_BODY);
        assert_eq!(eq.body_b, UNBOUND_BODY);
        assert_eq!(eq.offset, 0.0);
        let c = eq.as_contact().unwrap();
        assert_eq!(c.shape_a, ShapeId::default());
        assert_eq!(c.body_id_a, BodyId::default());
        assert!(!c.first_impact);
    }

    #[test]
    fn test_friction_pool_resets_slip_force() {
        let mut pool = EquationPool::frictions();
        let mut eq = pool.get();
        eq.set_slip_force(5.0);
        pool.release(eq);
        let eq = pool.get();
        assert!(eq.is_friction());
        assert_eq!(eq.slip_force(), 0.0);
    }

    #[test]
    fn test_resize() {
        let mut pool = EquationPool::contacts();
        pool.resize(4);
        assert_eq!(pool.len(), 4);
        pool.resize(1);
        assert_eq!(pool.len(), 1);
    }
}
