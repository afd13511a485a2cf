//! Error types for simulation operations.

use thiserror::Error;

use crate::{BodyId, ConstraintId, ContactMaterialId, ShapeId, SpringId};

/// Errors that can occur while building or stepping a world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A structural mutation was attempted while the world was stepping.
    #[error("cannot {operation} while the world is stepping")]
    WorldStepping {
        /// The rejected operation, e.g. "add body".
        operation: String,
    },

    /// Invalid body ID referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(BodyId),

    /// Invalid shape ID referenced.
    #[error("invalid shape ID: {0}")]
    InvalidShapeId(ShapeId),

    /// Invalid constraint ID referenced.
    #[error("invalid constraint ID: {0}")]
    InvalidConstraintId(ConstraintId),

    /// Invalid spring ID referenced.
    #[error("invalid spring ID: {0}")]
    InvalidSpringId(SpringId),

    /// Invalid contact material ID referenced.
    #[error("invalid contact material ID: {0}")]
    InvalidContactMaterialId(ContactMaterialId),

    /// A constraint or spring references a body that is not in the world.
    #[error("{body} is not registered with the world")]
    BodyNotInWorld {
        /// The missing body.
        body: BodyId,
    },

    /// Convex polygon vertices were given in clockwise order.
    #[error("convex vertices must be counter-clockwise (signed area {signed_area})")]
    ClockwiseWinding {
        /// Signed area computed from the given vertices.
        signed_area: f64,
    },

    /// Shape parameters describe a degenerate shape.
    #[error("degenerate shape: {reason}")]
    DegenerateShape {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl SimError {
    /// Create a stepping-guard error for the named operation.
    #[must_use]
    pub fn stepping(operation: impl Into<String>) -> Self {
        Self::WorldStepping {
            operation: operation.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a degenerate shape error.
    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateShape {
            reason: reason.into(),
        }
    }

    /// Check if this error came from the stepping guard.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        matches!(self, Self::WorldStepping { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidTimestep(_))
    }

    /// Check if this error refers to an unknown handle.
    #[must_use]
    pub fn is_invalid_id(&self) -> bool {
        matches!(
            self,
            Self::InvalidBodyId(_)
                | Self::InvalidShapeId(_)
                | Self::InvalidConstraintId(_)
                | Self::InvalidSpringId(_)
                | Self::InvalidContactMaterialId(_)
        )
    }
}
