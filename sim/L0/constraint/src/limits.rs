//! Joint limits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optional lower and upper bounds on a joint coordinate.
///
/// The coordinate is whatever the owning constraint measures: anchor
/// distance, relative angle, or slide position. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl JointLimits {
    /// Create two-sided limits. The bounds are swapped if given out of order.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// No limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set or clear the lower bound.
    #[must_use]
    pub fn with_lower(mut self, lower: Option<f64>) -> Self {
        self.lower = lower;
        self
    }

    /// Set or clear the upper bound.
    #[must_use]
    pub fn with_upper(mut self, upper: Option<f64>) -> Self {
        self.upper = upper;
        self
    }

    /// Lower bound, if enabled.
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    /// Upper bound, if enabled.
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    /// Set or clear the lower bound.
    pub fn set_lower(&mut self, lower: Option<f64>) {
        self.lower = lower;
    }

    /// Set or clear the upper bound.
    pub fn set_upper(&mut self, upper: Option<f64>) {
        self.upper = upper;
    }

    /// Check if either bound is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    /// Check if a coordinate is within the enabled bounds.
    #[must_use]
    pub fn contains(&self, position: f64) -> bool {
        matches!(self.state(position), LimitState::Free)
    }

    /// Classify a coordinate against the bounds.
    ///
    /// The upper bound is checked first; a coordinate can only violate one
    /// side of a well-ordered pair.
    #[must_use]
    pub fn state(&self, position: f64) -> LimitState {
        match (self.lower, self.upper) {
            (_, Some(upper)) if position > upper => LimitState::AtUpper(position - upper),
            (Some(lower), _) if position < lower => LimitState::AtLower(lower - position),
            _ => LimitState::Free,
        }
    }
}

/// Where a joint coordinate sits relative to its limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitState {
    /// Within the limits.
    Free,
    /// Below the lower limit by the given amount.
    AtLower(f64),
    /// Above the upper limit by the given amount.
    AtUpper(f64),
}

impl LimitState {
    /// Check if a limit is violated.
    #[must_use]
    pub fn is_violated(&self) -> bool {
        !matches!(self, Self::Free)
    }
}
