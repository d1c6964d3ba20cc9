//! Errors for spectrum collections, spectrum transforms, field generation,
//! rescaling, and lognormal synthesis.
//!
//! This module defines [`FieldError`], the error type shared by everything in
//! `fields`, and the alias [`FieldResult`].
//!
//! ## Conventions
//! - **Shell indices are 0-based** and ordered by increasing distance.
//! - Configuration errors (mismatched `ncorr`, `lmax`, shell counts, factor
//!   lengths) are reported before any work is done.
//! - Domain errors identify the offending shell pair and multipole so the
//!   input spectrum can be inspected.
//! - Degenerate inputs (zero source spectrum when rescaling) are not errors;
//!   they produce zero output and never reach this type.
use crate::sphere::errors::SphereError;

/// Result alias for field operations that may produce [`FieldError`].
pub type FieldResult<T> = Result<T, FieldError>;

/// Unified error type for the correlated field pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    // ---- Configuration ----
    /// Shell index outside `0..nshells`.
    ShellOutOfRange { shell: usize, nshells: usize },

    /// Correlation band of a collection disagrees with the caller's.
    NcorrMismatch { expected: usize, actual: usize },

    /// Band limit of a collection or spectrum disagrees with the caller's.
    LmaxMismatch { expected: usize, actual: usize },

    /// Per-shell parameter sequence has the wrong number of shells.
    ShellCountMismatch { expected: usize, actual: usize },

    /// A banded collection was built from the wrong number of entries.
    EntryCountMismatch { expected: usize, actual: usize },

    /// Two spectra that must be aligned per multipole have different lengths.
    SpectrumLengthMismatch { expected: usize, actual: usize },

    /// Lognormal shift must be finite and strictly positive.
    InvalidShift { shell: usize, value: f64 },

    /// Bias factor must be finite.
    InvalidBias { shell: usize, value: f64 },

    /// Explicit field variance must be finite and non-negative.
    InvalidVariance { value: f64 },

    /// A spectrum value is NaN/±inf.
    NonFiniteSpectrum { i: usize, j: usize, l: usize, value: f64 },

    // ---- Domain ----
    /// `1 + C_l / (s_i s_j) ≤ 0`: the requested correlation is incompatible
    /// with the lognormal shift.
    LogDomain { i: usize, j: usize, l: usize, value: f64 },

    /// Covariance block at `(shell, l)` is not positive semi-definite beyond
    /// round-off; `value` is the offending eigenvalue or residual variance.
    NotPositiveSemiDefinite { shell: usize, l: usize, value: f64 },

    /// Rescaling target spectrum is negative where the source is positive.
    NegativeTargetSpectrum { l: usize, value: f64 },

    // ---- Sphere ----
    /// Failure in the spherical transforms or coefficient containers.
    Sphere(SphereError),
}

impl From<SphereError> for FieldError {
    fn from(err: SphereError) -> Self {
        FieldError::Sphere(err)
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldError::Sphere(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            FieldError::ShellOutOfRange { shell, nshells } => {
                write!(f, "Field Error: shell {shell} out of range for {nshells} shells")
            }
            FieldError::NcorrMismatch { expected, actual } => {
                write!(f, "Field Error: ncorr mismatch (expected {expected}, got {actual})")
            }
            FieldError::LmaxMismatch { expected, actual } => {
                write!(f, "Field Error: lmax mismatch (expected {expected}, got {actual})")
            }
            FieldError::ShellCountMismatch { expected, actual } => write!(
                f,
                "Field Error: per-shell sequence has {actual} values, expected {expected}"
            ),
            FieldError::EntryCountMismatch { expected, actual } => write!(
                f,
                "Field Error: banded collection needs {expected} entries, got {actual}"
            ),
            FieldError::SpectrumLengthMismatch { expected, actual } => write!(
                f,
                "Field Error: spectrum length mismatch (expected {expected}, got {actual})"
            ),
            FieldError::InvalidShift { shell, value } => write!(
                f,
                "Field Error: lognormal shift for shell {shell} must be finite and > 0 \
                 (got {value})"
            ),
            FieldError::InvalidBias { shell, value } => {
                write!(f, "Field Error: bias for shell {shell} must be finite (got {value})")
            }
            FieldError::InvalidVariance { value } => write!(
                f,
                "Field Error: field variance must be finite and >= 0 (got {value})"
            ),
            FieldError::NonFiniteSpectrum { i, j, l, value } => write!(
                f,
                "Field Error: non-finite spectrum value {value} at shells ({i}, {j}), l = {l}"
            ),

            // ---- Domain ----
            FieldError::LogDomain { i, j, l, value } => write!(
                f,
                "Field Error: lognormal mapping undefined at shells ({i}, {j}), l = {l}: \
                 log argument {value} <= 0"
            ),
            FieldError::NotPositiveSemiDefinite { shell, l, value } => write!(
                f,
                "Field Error: covariance for shell {shell} at l = {l} is not positive \
                 semi-definite ({value})"
            ),
            FieldError::NegativeTargetSpectrum { l, value } => {
                write!(f, "Field Error: target spectrum is negative at l = {l} ({value})")
            }

            // ---- Sphere ----
            FieldError::Sphere(err) => write!(f, "Field Error: {err}"),
        }
    }
}
