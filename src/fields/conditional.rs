//! Per-multipole conditional Gaussian for the sequential field generator.
//!
//! Purpose
//! -------
//! Given the covariance block of one shell and its `k` predecessors at a
//! single multipole, compute the regression weights `w` and residual
//! variance `σ²` such that
//!
//! ```text
//! a_i = Σ_{r=1}^{k} w_r a_{i−r} + ε,     ε ~ N(0, σ²),
//! ```
//!
//! reproduces the block exactly when the predecessors already follow it.
//!
//! Key behaviors
//! -------------
//! - Solve `C_pp w = c_p` over the predecessor sub-block with
//!   [`psd_solve`], which uses Cholesky and falls back to the pseudoinverse
//!   for (near) singular blocks such as perfectly correlated shells.
//! - `σ² = C_ii − c_pᵀ w`; round-off negatives within `PSD_TOL` are clamped
//!   to zero, larger negatives are reported as
//!   [`FieldError::NotPositiveSemiDefinite`].
//!
//! Conventions
//! -----------
//! - Blocks are in lag order: row/column `r` is shell `i − r`, so row 0 is
//!   the shell being generated.
//! - Pure function of its inputs, safe to evaluate for different `l`
//!   concurrently.
use crate::{
    fields::errors::{FieldError, FieldResult},
    numerical_stability::linalg::{PSD_TOL, fill_dmatrix, psd_solve},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView2, s};

/// ConditionalNormal — regression weights and residual variance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalNormal {
    /// `weights[r − 1]` multiplies the coefficient of shell `i − r`.
    pub weights: Array1<f64>,
    /// Residual variance, never negative.
    pub variance: f64,
    /// Whether a slightly negative variance was clamped to zero.
    pub clamped: bool,
}

/// conditional_normal — condition shell `i` on its predecessors at one `l`.
///
/// Parameters
/// ----------
/// - `block`: `ArrayView2<f64>`
///   Symmetric `(k+1)×(k+1)` covariance in lag order.
/// - `shell`, `l`: `usize`
///   Identify the block in error reports only.
///
/// Errors
/// ------
/// - `FieldError::NotPositiveSemiDefinite` if the predecessor block has an
///   eigenvalue, or the residual variance is, below `−PSD_TOL · scale`.
pub fn conditional_normal(
    block: ArrayView2<f64>, shell: usize, l: usize,
) -> FieldResult<ConditionalNormal> {
    let k = block.nrows().saturating_sub(1);
    let scale = block.diag().iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    if scale == 0.0 {
        return Ok(ConditionalNormal { weights: Array1::zeros(k), variance: 0.0, clamped: false });
    }

    let mut weights = Array1::<f64>::zeros(k);
    let mut explained = 0.0;
    if k > 0 {
        let past = block.slice(s![1.., 1..]);
        let cross = block.slice(s![1.., 0]);
        let mut past_nalg = DMatrix::<f64>::zeros(k, k);
        fill_dmatrix(past, &mut past_nalg);
        let rhs = DVector::from_iterator(k, cross.iter().copied());
        let w = psd_solve(past_nalg, &rhs).map_err(|e| FieldError::NotPositiveSemiDefinite {
            shell,
            l,
            value: e.eigenvalue,
        })?;
        for (dst, src) in weights.iter_mut().zip(w.iter()) {
            *dst = *src;
        }
        explained = w.dot(&rhs);
    }

    let variance = block[[0, 0]] - explained;
    if variance < -PSD_TOL * scale {
        return Err(FieldError::NotPositiveSemiDefinite { shell, l, value: variance });
    }
    if variance < 0.0 {
        return Ok(ConditionalNormal { weights, variance: 0.0, clamped: true });
    }
    Ok(ConditionalNormal { weights, variance, clamped: false })
}
