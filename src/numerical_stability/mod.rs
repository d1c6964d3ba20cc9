//! numerical_stability — shared tolerances and small dense linear algebra.
//!
//! Purpose
//! -------
//! Centralize the numerical tolerances and covariance-block solves used by
//! the correlated field generator, so every module applies the same
//! round-off policy when a covariance is singular or slightly indefinite.
//!
//! Key behaviors
//! -------------
//! - Copy `ndarray` covariance blocks into `nalgebra::DMatrix` storage
//!   (`fill_dmatrix`).
//! - Solve symmetric positive-semi-definite systems (`psd_solve`) with a
//!   Cholesky fast path and an eigen pseudoinverse fallback.
//! - Expose the relative tolerances [`EIGEN_EPS`] and [`PSD_TOL`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite `f64` matrices; shape validation happens upstream.
//! - Tolerances are relative to the largest absolute diagonal entry of the
//!   block being solved, so they are invariant under rescaling of spectra.
//!
//! Conventions
//! -----------
//! - Pure numerical helpers: no logging, no I/O, no global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`linalg`] cover positive-definite, singular, zero, and
//!   indefinite blocks.

pub mod linalg;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::linalg::{EIGEN_EPS, Indefinite, PSD_TOL, fill_dmatrix, psd_solve};

pub mod prelude {
    pub use super::linalg::{EIGEN_EPS, PSD_TOL, psd_solve};
}
