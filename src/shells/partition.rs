//! Partition of a redshift distribution across shell windows.
//!
//! Purpose
//! -------
//! Split a sampled distribution `n(z)` into one weight per shell,
//! `N_i = ∫ n(z) w_i(z) dz`, so that contributions of the shells can be
//! summed into a projected field.
//!
//! Key behaviors
//! -------------
//! - Both `n(z)` and `w_i(z)` are treated as piecewise linear between their
//!   samples and zero outside them.
//! - Each integral uses the trapezoid rule on the merged grid of window and
//!   distribution samples, restricted to the overlap of the two supports.
//!   Since the grid contains every breakpoint of both interpolants, windows
//!   of unit height integrate the distribution's interpolant exactly.
//! - The distribution's own integral is returned alongside the weights;
//!   [`Partition::coverage_error`] reports what the windows miss or double
//!   count instead of silently renormalizing.
//!
//! Edge cases
//! ----------
//! - A window with no overlap gets weight exactly zero.
use crate::shells::{
    errors::ShellResult,
    window::{RadialWindow, interp_or_zero, validate_samples},
};
use log::debug;
use ndarray::{Array1, ArrayView1};

/// Partition — per-shell weights of a redshift distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// `weights[i] = ∫ n(z) w_i(z) dz`, never negative.
    pub weights: Array1<f64>,
    /// `∫ n(z) dz` over the distribution's samples.
    pub total: f64,
}

impl Partition {
    /// `total − Σ weights`: positive where windows miss part of the
    /// distribution, negative where overlapping windows count it twice.
    pub fn coverage_error(&self) -> f64 {
        self.total - self.weights.sum()
    }
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2).zip(y.windows(2)).map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1])).sum()
}

fn overlap_integral(z: ArrayView1<f64>, dndz: ArrayView1<f64>, window: &RadialWindow) -> f64 {
    let (wmin, wmax) = window.support();
    let lo = wmin.max(z[0]);
    let hi = wmax.min(z[z.len() - 1]);
    if lo >= hi {
        return 0.0;
    }

    let mut grid: Vec<f64> = window
        .za()
        .iter()
        .chain(z.iter())
        .copied()
        .filter(|&x| x > lo && x < hi)
        .chain([lo, hi])
        .collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();

    let integrand: Vec<f64> =
        grid.iter().map(|&x| interp_or_zero(x, z, dndz) * window.evaluate(x)).collect();
    trapezoid(&grid, &integrand)
}

/// partition — weight of each shell in a redshift distribution.
///
/// Parameters
/// ----------
/// - `z`: `ArrayView1<f64>`
///   Strictly increasing redshift samples, at least two.
/// - `dndz`: `ArrayView1<f64>`
///   Non-negative distribution values at `z`.
/// - `windows`: `&[RadialWindow]`
///   Shell windows in shell order.
///
/// Returns
/// -------
/// `ShellResult<Partition>`
///   One weight per window and the total integral of the distribution.
///
/// Errors
/// ------
/// - Any [`ShellError`](crate::shells::errors::ShellError) from validating
///   `(z, dndz)`.
pub fn partition(
    z: ArrayView1<f64>, dndz: ArrayView1<f64>, windows: &[RadialWindow],
) -> ShellResult<Partition> {
    validate_samples(z, dndz)?;

    let total = trapezoid(&z.to_vec(), &dndz.to_vec());
    let weights: Array1<f64> = windows.iter().map(|w| overlap_integral(z, dndz, w)).collect();
    let out = Partition { weights, total };
    debug!(
        "partitioned distribution over {} shells: total = {:.6e}, coverage error = {:.3e}",
        windows.len(),
        out.total,
        out.coverage_error()
    );
    Ok(out)
}
