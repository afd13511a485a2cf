//! Surface materials and pairwise contact parameters.
//!
//! A [`Material`] is nothing more than an identity attached to shapes. How
//! two materials interact is described by a [`ContactMaterial`], which the
//! world looks up (order-independently) for every colliding shape pair and
//! falls back to its default parameters when no entry exists.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{ContactMaterialId, MaterialId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token for a surface material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// The material's id.
    pub id: MaterialId,
}

impl Material {
    /// Create a material with the next auto-incremented id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: MaterialId::new(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Create a material with an explicit id.
    #[must_use]
    pub const fn with_id(id: MaterialId) -> Self {
        Self { id }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

/// Contact response parameters for a pair of materials.
///
/// Stiffness and relaxation are translated into SPOOK solver coefficients
/// for every contact equation; the friction variants do the same for the
/// tangential rows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactMaterialParams {
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Restitution applied on the first step of a contact.
    pub restitution: f64,
    /// Stiffness of the normal contact rows.
    pub stiffness: f64,
    /// Relaxation (number of steps to resolve) of the normal contact rows.
    pub relaxation: f64,
    /// Stiffness of the friction rows.
    pub friction_stiffness: f64,
    /// Relaxation of the friction rows.
    pub friction_relaxation: f64,
    /// Tangential surface velocity, e.g. for conveyor belts.
    pub surface_velocity: f64,
    /// Penetration allowed before the contact pushes back.
    pub contact_skin_size: f64,
}

impl Default for ContactMaterialParams {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
            stiffness: 1e6,
            relaxation: 4.0,
            friction_stiffness: 1e6,
            friction_relaxation: 4.0,
            surface_velocity: 0.0,
            contact_skin_size: 0.005,
        }
    }
}

impl ContactMaterialParams {
    /// Frictionless contacts.
    #[must_use]
    pub fn frictionless() -> Self {
        Self {
            friction: 0.0,
            ..Default::default()
        }
    }

    /// Fully elastic, frictionless contacts.
    #[must_use]
    pub fn bouncy() -> Self {
        Self {
            friction: 0.0,
            restitution: 1.0,
            ..Default::default()
        }
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Set the restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set normal stiffness and relaxation.
    #[must_use]
    pub fn with_stiffness(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self
    }

    /// Set friction stiffness and relaxation.
    #[must_use]
    pub fn with_friction_stiffness(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.friction_stiffness = stiffness;
        self.friction_relaxation = relaxation;
        self
    }

    /// Set the surface velocity.
    #[must_use]
    pub fn with_surface_velocity(mut self, surface_velocity: f64) -> Self {
        self.surface_velocity = surface_velocity;
        self
    }

    /// Set the contact skin size.
    #[must_use]
    pub fn with_contact_skin_size(mut self, skin: f64) -> Self {
        self.contact_skin_size = skin;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.friction >= 0.0) {
            return Err(crate::SimError::invalid_config("friction must be >= 0"));
        }
        if !(self.restitution >= 0.0) {
            return Err(crate::SimError::invalid_config("restitution must be >= 0"));
        }
        if !(self.stiffness > 0.0) || !(self.friction_stiffness > 0.0) {
            return Err(crate::SimError::invalid_config("stiffness must be > 0"));
        }
        if !(self.relaxation > 0.0) || !(self.friction_relaxation > 0.0) {
            return Err(crate::SimError::invalid_config("relaxation must be > 0"));
        }
        Ok(())
    }
}

/// Interaction parameters for one (unordered) pair of materials.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactMaterial {
    /// Assigned by the world when the entry is registered.
    pub id: ContactMaterialId,
    /// First material of the pair.
    pub material_a: MaterialId,
    /// Second material of the pair.
    pub material_b: MaterialId,
    /// Contact parameters.
    pub params: ContactMaterialParams,
}

impl ContactMaterial {
    /// Create a contact material for a pair.
    #[must_use]
    pub fn new(material_a: MaterialId, material_b: MaterialId, params: ContactMaterialParams) -> Self {
        Self {
            id: ContactMaterialId::default(),
            material_a,
            material_b,
            params,
        }
    }

    /// Order-independent key for lookup tables.
    #[must_use]
    pub fn key(&self) -> (MaterialId, MaterialId) {
        pair_key(self.material_a, self.material_b)
    }

    /// Whether this entry applies to the given pair, in either order.
    #[must_use]
    pub fn matches(&self, a: MaterialId, b: MaterialId) -> bool {
        self.key() == pair_key(a, b)
    }
}

/// Order a material pair so that `(a, b)` and `(b, a)` share a key.
#[must_use]
pub fn pair_key(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
    if a <= b { (a, b) } else { (b, a) }
}
