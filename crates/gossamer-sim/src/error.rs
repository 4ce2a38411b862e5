use thiserror::Error;

/// Diagnostic raised by the stability guard when the explicit integration
/// scheme blows up. Carries the flat index of the first offending particle
/// so the failure can be traced back to a grid location.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Divergence {
    #[error("NaN detected in force at particle {index}")]
    NanForce { index: usize },
    #[error("NaN detected in position at particle {index}")]
    NanPosition { index: usize },
    #[error("force magnitude {magnitude} at particle {index} exceeds limit {limit}")]
    ForceMagnitude {
        index: usize,
        magnitude: f32,
        limit: f32,
    },
}

/// Rejected at configuration time, before any stepping. The hot step
/// functions assume validated input and never re-check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative (got {value})")]
    Negative { name: &'static str, value: f32 },
    #[error("grid resolution {0} is too small (need at least {1} cells per side)")]
    ResolutionTooSmall(usize, usize),
}

impl ConfigError {
    /// Checks a scalar parameter that must be strictly positive.
    pub fn ensure_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::NonPositive { name, value })
        }
    }

    /// Checks a scalar parameter that may be zero but not negative or NaN.
    pub fn ensure_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::Negative { name, value })
        }
    }
}
