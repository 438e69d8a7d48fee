//! Error taxonomy for the analysis core.
//!
//! Validation problems are rejected at the boundary of each entry point,
//! before any iteration starts. Numerical failures abort the specific fit
//! attempt. Non-fatal conditions (iteration caps) are reported as flags on
//! the result types, not as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed input: missing or unordered periods, non-finite values,
    /// mismatched series lengths.
    #[error("invalid input: {0}")]
    Input(String),

    /// Structurally valid input that cannot support the requested
    /// computation, e.g. fewer observations than model parameters or a
    /// non-positive degrees-of-freedom lookup.
    #[error("degenerate input: {0}")]
    Degenerate(String),

    /// The OLS design matrix is rank deficient (collinear predictors).
    #[error("singular design matrix: {0}")]
    Singular(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
