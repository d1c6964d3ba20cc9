//! Small dense linear algebra for covariance blocks.
//!
//! Provides the tolerances and the positive-semi-definite solve used by the
//! per-multipole conditional sampler. Covariance blocks are assembled in
//! `ndarray` form and copied into `nalgebra::DMatrix` for factorization.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: relative eigenvalue cutoff for pseudoinverse columns.
//! - [`PSD_TOL`]: relative slack before a negative eigenvalue or residual
//!   variance is reported as an indefinite covariance.
//! - [`fill_dmatrix`]: copy a square `ndarray` matrix into a `DMatrix`.
//! - [`psd_solve`]: solve `C x = b` for symmetric positive-semi-definite `C`,
//!   Cholesky first, eigen pseudoinverse when the block is (near) singular.
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView2;

/// Relative eigenvalue cutoff for pseudoinverse columns.
///
/// Eigenvalues `λ ≤ EIGEN_EPS · scale`, where `scale` is the largest
/// absolute diagonal entry, are treated as exact zeros. Directions with no
/// variance carry no information about the conditioned value, so they are
/// dropped instead of amplified.
pub const EIGEN_EPS: f64 = 1e-10;

/// Relative tolerance for round-off in positive-semi-definite checks.
///
/// A negative eigenvalue or residual variance with magnitude at most
/// `PSD_TOL · scale` is round-off and is clamped to zero; anything larger
/// marks the covariance as invalid.
pub const PSD_TOL: f64 = 1e-8;

/// Indefinite — a covariance block with an eigenvalue below `-PSD_TOL · scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indefinite {
    /// The most negative eigenvalue found.
    pub eigenvalue: f64,
}

/// fill_dmatrix — copy a square `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// Walks the lower triangle column by column and mirrors off-diagonal
/// entries from their own positions, so any asymmetry in `src` is
/// preserved. Shapes must agree; mismatches are programmer errors.
pub fn fill_dmatrix(src: ArrayView2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                dst[(i, i)] = src[[i, i]];
            } else {
                dst[(i, j)] = src[[i, j]];
                dst[(j, i)] = src[[j, i]];
            }
        }
    }
}

/// psd_solve — solve `C x = b` for a symmetric positive-semi-definite `C`.
///
/// Purpose
/// -------
/// Return regression weights for a small covariance block. Well-conditioned
/// blocks go through a Cholesky factorization; singular or nearly singular
/// blocks (perfectly correlated shells, empty multipoles) fall back to the
/// Moore–Penrose pseudoinverse built from the symmetric eigendecomposition.
///
/// Parameters
/// ----------
/// - `matrix`: `DMatrix<f64>`
///   Symmetric `k×k` covariance. Consumed by the factorization.
/// - `rhs`: `&DVector<f64>`
///   Length-`k` right-hand side.
///
/// Returns
/// -------
/// `Result<DVector<f64>, Indefinite>`
///   - `Ok(x)` with the minimum-norm solution on the non-degenerate
///     eigenspace.
///   - `Err(Indefinite)` if an eigenvalue is below `-PSD_TOL · scale`.
///
/// Notes
/// -----
/// - An all-zero `matrix` yields `x = 0` without factorizing.
/// - The Cholesky result is accepted only when every pivot exceeds
///   `EIGEN_EPS · scale`; tiny pivots would blow up the weights.
pub fn psd_solve(matrix: DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, Indefinite> {
    let k = matrix.nrows();
    let scale = matrix.diagonal().iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    if k == 0 || scale == 0.0 {
        return Ok(DVector::zeros(k));
    }
    let cutoff = EIGEN_EPS * scale;

    if let Some(chol) = matrix.clone().cholesky() {
        let pivots_ok = chol.l_dirty().diagonal().iter().all(|d| d * d > cutoff);
        if pivots_ok {
            let x = chol.solve(rhs);
            if x.iter().all(|v| v.is_finite()) {
                return Ok(x);
            }
        }
    }

    let eigen = matrix.symmetric_eigen();
    let min_eigenvalue = eigen.eigenvalues.iter().fold(f64::INFINITY, |acc, &l| acc.min(l));
    if min_eigenvalue < -PSD_TOL * scale {
        return Err(Indefinite { eigenvalue: min_eigenvalue });
    }
    let q = eigen.eigenvectors;
    let mut x = DVector::zeros(k);
    for (col, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda > cutoff {
            let v = q.column(col);
            let coeff = v.dot(rhs) / lambda;
            x.axpy(coeff, &v, 1.0);
        }
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Copying `ndarray` blocks into `DMatrix`.
    // - `psd_solve` on well-conditioned, singular, zero, and indefinite blocks.
    //
    // They intentionally DO NOT cover:
    // - Conditional variances; see `fields::conditional`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `fill_dmatrix` copies every entry unchanged.
    //
    // Given
    // -----
    // - A 2×2 symmetric block with distinct entries.
    //
    // Expect
    // ------
    // - Identical entries in the `DMatrix`.
    fn fill_dmatrix_copies_block_without_modification() {
        // Arrange
        let block = array![[2.0, 0.5], [0.5, 1.0]];
        let mut out = DMatrix::<f64>::zeros(2, 2);

        // Act
        fill_dmatrix(block.view(), &mut out);

        // Assert
        assert_eq!(out[(0, 0)], 2.0);
        assert_eq!(out[(0, 1)], 0.5);
        assert_eq!(out[(1, 0)], 0.5);
        assert_eq!(out[(1, 1)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Check the Cholesky path against an analytic inverse.
    //
    // Given
    // -----
    // - C = [[2, 1], [1, 2]], b = [1, 0]; C⁻¹ = (1/3)[[2, -1], [-1, 2]].
    //
    // Expect
    // ------
    // - x = [2/3, -1/3].
    fn psd_solve_matches_inverse_for_positive_definite_block() {
        // Arrange
        let c = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![1.0, 0.0]);

        // Act
        let x = psd_solve(c, &b).expect("positive definite block should solve");

        // Assert
        assert_relative_eq!(x[0], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], -1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A rank-one block (two perfectly correlated shells) must fall back to the
    // pseudoinverse instead of failing.
    //
    // Given
    // -----
    // - C = [[1, 1], [1, 1]], b = [1, 1].
    //
    // Expect
    // ------
    // - Minimum-norm solution x = [0.5, 0.5].
    fn psd_solve_uses_pseudoinverse_for_singular_block() {
        // Arrange
        let c = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);

        // Act
        let x = psd_solve(c, &b).expect("singular PSD block should solve");

        // Assert
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(x[1], 0.5, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // All-zero blocks carry no information and return zero weights.
    fn psd_solve_returns_zero_for_zero_block() {
        // Arrange
        let c = DMatrix::<f64>::zeros(3, 3);
        let b = DVector::from_vec(vec![0.0, 0.0, 0.0]);

        // Act
        let x = psd_solve(c, &b).expect("zero block should solve");

        // Assert
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Blocks with a clearly negative eigenvalue are reported, not repaired.
    //
    // Given
    // -----
    // - C = [[1, 2], [2, 1]] with eigenvalues {3, -1}.
    //
    // Expect
    // ------
    // - `Err(Indefinite)` carrying eigenvalue ≈ -1.
    fn psd_solve_rejects_indefinite_block() {
        // Arrange
        let c = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let b = DVector::from_vec(vec![1.0, 0.0]);

        // Act
        let err = psd_solve(c, &b).unwrap_err();

        // Assert
        assert_relative_eq!(err.eigenvalue, -1.0, epsilon = 1e-10);
    }
}
