//! Sampled radial window functions.
//!
//! A [`RadialWindow`] is a non-negative weight function of redshift given on
//! a strictly increasing grid, linearly interpolated between samples and
//! zero outside `[za[0], za[n−1]]`. Tophat windows have unit height (not unit
//! area), so contiguous tophats sum to one over their joint range.
use crate::shells::errors::{ShellError, ShellResult};
use ndarray::{Array1, ArrayView1};

/// Default redshift spacing of tophat samples.
pub const TOPHAT_DZ: f64 = 1e-3;

/// Check a sampled function: equal lengths, at least two samples, finite,
/// strictly increasing abscissae, non-negative values.
pub(crate) fn validate_samples(z: ArrayView1<f64>, f: ArrayView1<f64>) -> ShellResult<()> {
    if z.len() < 2 {
        return Err(ShellError::TooFewSamples { len: z.len() });
    }
    if f.len() != z.len() {
        return Err(ShellError::LengthMismatch { expected: z.len(), actual: f.len() });
    }
    for (index, (&zi, &fi)) in z.iter().zip(f.iter()).enumerate() {
        if !zi.is_finite() {
            return Err(ShellError::NonFinite { index, value: zi });
        }
        if !fi.is_finite() {
            return Err(ShellError::NonFinite { index, value: fi });
        }
        if fi < 0.0 {
            return Err(ShellError::NegativeValue { index, value: fi });
        }
        if index > 0 && zi <= z[index - 1] {
            return Err(ShellError::NotIncreasing { index, value: zi });
        }
    }
    Ok(())
}

/// Linear interpolation of `(xs, ys)` at `x`, zero outside the sampled range.
///
/// `xs` must be increasing; the bracketing interval is found by bisection.
pub(crate) fn interp_or_zero(x: f64, xs: ArrayView1<f64>, ys: ArrayView1<f64>) -> f64 {
    let n = xs.len();
    if n == 0 || x < xs[0] || x > xs[n - 1] {
        return 0.0;
    }
    if n == 1 {
        return ys[0];
    }
    // xs[lo] ≤ x ≤ xs[hi]
    let (mut lo, mut hi) = (0, n - 1);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if xs[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if xs[lo] == x {
        return ys[lo];
    }
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + t * (ys[hi] - ys[lo])
}

/// RadialWindow — validated sampled window `w(z)` of one shell.
///
/// Fields
/// ------
/// - `za`: `Array1<f64>`
///   Strictly increasing redshift samples, at least two.
/// - `wa`: `Array1<f64>`
///   Non-negative window values at `za`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialWindow {
    za: Array1<f64>,
    wa: Array1<f64>,
}

impl RadialWindow {
    /// Validated constructor.
    ///
    /// Errors
    /// ------
    /// - `ShellError::TooFewSamples`, `LengthMismatch`, `NonFinite`,
    ///   `NotIncreasing`, or `NegativeValue` for malformed samples.
    pub fn new(za: Array1<f64>, wa: Array1<f64>) -> ShellResult<Self> {
        validate_samples(za.view(), wa.view())?;
        Ok(RadialWindow { za, wa })
    }

    /// Unit-height tophat on `[zmin, zmax]` sampled with `n ≥ 2` points.
    ///
    /// Errors
    /// ------
    /// - `ShellError::InvalidRange` unless `zmin < zmax`, both finite.
    /// - `ShellError::TooFewSamples` if `n < 2`.
    pub fn tophat(zmin: f64, zmax: f64, n: usize) -> ShellResult<Self> {
        RadialWindow::weighted_tophat(zmin, zmax, n, |_| 1.0)
    }

    /// Tophat on `[zmin, zmax]` whose height follows `weight(z)`, sampled
    /// with `n ≥ 2` points.
    ///
    /// Errors
    /// ------
    /// - `ShellError::InvalidRange` unless `zmin < zmax`, both finite.
    /// - `ShellError::TooFewSamples` if `n < 2`.
    /// - `ShellError::NegativeValue` or `NonFinite` if `weight` returns an
    ///   invalid value at a sample.
    pub fn weighted_tophat<F>(zmin: f64, zmax: f64, n: usize, weight: F) -> ShellResult<Self>
    where
        F: Fn(f64) -> f64,
    {
        if !(zmin.is_finite() && zmax.is_finite() && zmin < zmax) {
            return Err(ShellError::InvalidRange { zmin, zmax });
        }
        if n < 2 {
            return Err(ShellError::TooFewSamples { len: n });
        }
        let za = Array1::linspace(zmin, zmax, n);
        let wa = za.mapv(weight);
        RadialWindow::new(za, wa)
    }

    pub fn za(&self) -> ArrayView1<'_, f64> {
        self.za.view()
    }

    pub fn wa(&self) -> ArrayView1<'_, f64> {
        self.wa.view()
    }

    /// `(zmin, zmax)` outside of which the window is zero.
    pub fn support(&self) -> (f64, f64) {
        (self.za[0], self.za[self.za.len() - 1])
    }

    /// Window value at `z`, linearly interpolated.
    pub fn evaluate(&self, z: f64) -> f64 {
        interp_or_zero(z, self.za.view(), self.wa.view())
    }
}

/// tophat_windows — contiguous unit-height tophats between grid edges.
///
/// Shell `i` covers `[zgrid[i], zgrid[i+1]]` and is sampled at spacing close
/// to `dz` (at least two points).
///
/// Errors
/// ------
/// - `ShellError::TooFewSamples` if `zgrid` has fewer than two edges.
/// - `ShellError::InvalidRange` if the edges are not strictly increasing or
///   `dz` is not positive.
pub fn tophat_windows(zgrid: ArrayView1<f64>, dz: f64) -> ShellResult<Vec<RadialWindow>> {
    weighted_tophat_windows(zgrid, dz, |_| 1.0)
}

/// weighted_tophat_windows — contiguous tophats with a shared weight.
///
/// Like [`tophat_windows`], but every shell's height follows `weight(z)`,
/// e.g. a radial matter weight that makes shells of different widths
/// comparable. The window of shell `i` is `weight(z)` on
/// `[zgrid[i], zgrid[i+1]]` and zero elsewhere.
///
/// Errors
/// ------
/// - Same as [`tophat_windows`], plus `ShellError::NegativeValue` or
///   `NonFinite` if `weight` returns an invalid value at a sample.
pub fn weighted_tophat_windows<F>(
    zgrid: ArrayView1<f64>, dz: f64, weight: F,
) -> ShellResult<Vec<RadialWindow>>
where
    F: Fn(f64) -> f64,
{
    if zgrid.len() < 2 {
        return Err(ShellError::TooFewSamples { len: zgrid.len() });
    }
    if !(dz.is_finite() && dz > 0.0) {
        return Err(ShellError::InvalidRange { zmin: 0.0, zmax: dz });
    }
    zgrid
        .windows(2)
        .into_iter()
        .map(|edge| {
            let (zmin, zmax) = (edge[0], edge[1]);
            let n = (((zmax - zmin) / dz).round() as usize).max(2);
            RadialWindow::weighted_tophat(zmin, zmax, n, &weight)
        })
        .collect()
}
