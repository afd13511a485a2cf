//! Handle types for world-owned objects.
//!
//! Every handle is a `u64` newtype. The world hands out body, constraint,
//! spring and contact-material ids from monotonic counters, so a handle is
//! never reused within one world. Shape and material ids are drawn from
//! process-wide counters when the value is created.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new ID.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw ID value.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a body in a world.
    BodyId,
    "Body"
);
define_id!(
    /// Unique identifier for a shape.
    ShapeId,
    "Shape"
);
define_id!(
    /// Unique identifier for a constraint in a world.
    ConstraintId,
    "Constraint"
);
define_id!(
    /// Unique identifier for a spring in a world.
    SpringId,
    "Spring"
);
define_id!(
    /// Identity token of a surface material.
    MaterialId,
    "Material"
);
define_id!(
    /// Unique identifier for a registered contact material.
    ContactMaterialId,
    "ContactMaterial"
);
