//! Error types for simulation operations.

use thiserror::Error;

/// Errors that can occur during simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Geometry handed to the collision pipeline is unusable.
    ///
    /// Raised for open or non-convex polytope inputs, degenerate face
    /// loops, and feature-pair walks that cannot make progress (for
    /// example when the same polytope is passed for both sides).
    #[error("invalid geometry: {reason}")]
    InvalidGeometry {
        /// Description of what is wrong with the geometry.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Invalid rigid body parameters (mass, inertia, non-finite state).
    #[error("invalid body: {reason}")]
    InvalidBody {
        /// Description of what is wrong with the body.
        reason: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// A collider referenced a body index outside the supplied slice.
    #[error("collider references body index {index} but only {len} bodies were supplied")]
    BodyIndexOutOfRange {
        /// The out-of-range index.
        index: usize,
        /// Number of bodies supplied to the step.
        len: usize,
    },

    /// The closest-feature walk exceeded its iteration cap.
    ///
    /// For convex, closed, distinct polytopes the walk always terminates;
    /// hitting the cap means the inputs violate that contract.
    #[error("closest-feature walk failed to terminate after {iterations} transitions")]
    ConvergenceFailure {
        /// Number of state transitions attempted.
        iterations: usize,
    },
}

impl SimError {
    /// Create an invalid geometry error.
    #[must_use]
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid body error.
    #[must_use]
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            reason: reason.into(),
        }
    }

    /// Check if this is a geometry error.
    #[must_use]
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGeometry { .. } | Self::ConvergenceFailure { .. }
        )
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::invalid_geometry("edge 3 has one neighbor face");
        assert!(err.to_string().contains("edge 3"));

        let err = SimError::InvalidTimestep(-0.5);
        assert!(err.to_string().contains("-0.5"));

        let err = SimError::BodyIndexOutOfRange { index: 7, len: 2 };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_error_predicates() {
        let err = SimError::invalid_geometry("open mesh");
        assert!(err.is_geometry_error());
        assert!(!err.is_config_error());

        let err = SimError::ConvergenceFailure { iterations: 512 };
        assert!(err.is_geometry_error());

        let err = SimError::invalid_config("bad value");
        assert!(err.is_config_error());
        assert!(!err.is_geometry_error());
    }
}
