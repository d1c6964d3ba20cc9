//! Errors for radial windows and redshift partitioning.
//!
//! This module defines `ShellError`, raised when a sampled function of
//! redshift (a window or a distribution) is malformed, and the alias
//! `ShellResult<T>`. A window that does not overlap the distribution is not
//! an error; its weight is zero.

/// Validation failures for sampled radial functions.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellError {
    /// Fewer than two samples, so no quadrature interval exists.
    TooFewSamples { len: usize },

    /// Abscissae and values have different lengths.
    LengthMismatch { expected: usize, actual: usize },

    /// Redshift samples must be strictly increasing.
    NotIncreasing { index: usize, value: f64 },

    /// NaN/±inf in redshift samples or function values.
    NonFinite { index: usize, value: f64 },

    /// Window and distribution values must be non-negative.
    NegativeValue { index: usize, value: f64 },

    /// Tophat bounds must satisfy `zmin < zmax`.
    InvalidRange { zmin: f64, zmax: f64 },
}

pub type ShellResult<T> = Result<T, ShellError>;

impl std::error::Error for ShellError {}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::TooFewSamples { len } => {
                write!(f, "Shell Error: need at least 2 samples, got {len}")
            }
            ShellError::LengthMismatch { expected, actual } => {
                write!(f, "Shell Error: length mismatch (expected {expected}, got {actual})")
            }
            ShellError::NotIncreasing { index, value } => write!(
                f,
                "Shell Error: redshifts must be strictly increasing (index {index}, z = {value})"
            ),
            ShellError::NonFinite { index, value } => {
                write!(f, "Shell Error: non-finite sample at index {index} ({value})")
            }
            ShellError::NegativeValue { index, value } => {
                write!(f, "Shell Error: negative value at index {index} ({value})")
            }
            ShellError::InvalidRange { zmin, zmax } => {
                write!(f, "Shell Error: invalid redshift range [{zmin}, {zmax}]")
            }
        }
    }
}
