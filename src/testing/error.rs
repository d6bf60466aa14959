use thiserror::Error;

/// Errors raised by the equivalence tests, the power estimator and their helpers.
///
/// Every variant is produced while validating the inputs, before any test
/// statistic is computed, so a failed call never yields a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TostError {
    /// A sample (or group size) is too small to estimate a variance.
    #[error("{argument} needs at least 2 observations, got {len}")]
    InvalidSampleSize { argument: &'static str, len: usize },

    /// Paired samples must have one observation per unit in each sample.
    #[error("paired samples must have equal length, got {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A standard error or spread parameter is zero, negative or not finite.
    #[error("{argument} must be positive and finite, got {value}")]
    DegenerateVariance { argument: &'static str, value: f64 },

    /// Degrees of freedom must be positive and finite.
    #[error("degrees of freedom must be positive and finite, got {0}")]
    InvalidDegreesOfFreedom(f64),

    /// A location statistic (mean difference, reference, effect size) is not finite.
    #[error("{argument} must be finite, got {value}")]
    NonFinite { argument: &'static str, value: f64 },

    #[error("equivalence margins must be finite with lower < upper, got ({lower}, {upper})")]
    InvalidMargins { lower: f64, upper: f64 },

    #[error("alpha must lie in the open interval (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("target power must lie in the open interval (0, 1), got {0}")]
    InvalidPower(f64),

    /// Sample-size planning did not reach the requested power within the search limit.
    #[error("target power not reached with {max_n} observations per group (power {power:.4})")]
    SampleSizeLimit { max_n: usize, power: f64 },

    #[error("distribution error: {0}")]
    Distribution(String),
}

/// Check that `alpha` is a usable significance level.
pub(crate) fn validate_alpha(alpha: f64) -> Result<(), TostError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(TostError::InvalidAlpha(alpha))
    }
}

/// Check that `value` is a finite, strictly positive spread (standard error, sigma).
pub(crate) fn validate_positive(argument: &'static str, value: f64) -> Result<(), TostError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TostError::DegenerateVariance { argument, value })
    }
}

pub(crate) fn validate_finite(argument: &'static str, value: f64) -> Result<(), TostError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TostError::NonFinite { argument, value })
    }
}

pub(crate) fn validate_sample_size(argument: &'static str, len: usize) -> Result<(), TostError> {
    if len < 2 {
        Err(TostError::InvalidSampleSize { argument, len })
    } else {
        Ok(())
    }
}
