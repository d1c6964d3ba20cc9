//! Spectrum transforms on banded collections: discretization, lognormal
//! covariance mapping, and linear bias.
//!
//! Purpose
//! -------
//! Turn raw angular power spectra into the Gaussian spectra the field
//! generator consumes. Every transform is pure, takes a [`BandedSpectra`],
//! and returns a new collection with the same band.
//!
//! Key behaviors
//! -------------
//! - [`discretized_cls`]: truncate/pad every entry to `lmax + 1` values and
//!   multiply by the squared pixel window of the target resolution, which
//!   also zeroes multipoles above `3 nside − 1`.
//! - [`lognormal_gls`]: map lognormal target spectra to Gaussian spectra,
//!   `G_l = s_i s_j ln(1 + C_l / (s_i s_j))`, with the monopole handled by
//!   [`LognormalGlsOptions`].
//! - [`lognormal_cls`]: the inverse exponential map, used to check
//!   round-trips.
//! - [`biased_cls`]: scale entry `(i, j)` by `b_i b_j`.
//! - [`gaussian_variance`]: zero-lag moment `Σ (2l+1) C_l / 4π`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Outputs keep the input's `nshells`; `ncorr` only changes when
//!   [`discretized_cls`] is asked to reband the collection.
//! - An argument `1 + C_l/(s_i s_j) ≤ 0` is an unphysical request and is
//!   reported as [`FieldError::LogDomain`], never turned into `NaN`.
use crate::{
    fields::{
        errors::{FieldError, FieldResult},
        spectra::BandedSpectra,
    },
    sphere::healpix::pixel_window,
};
use ndarray::{Array1, ArrayView1, s};
use std::f64::consts::PI;

/// ShellFactor — a scalar applied to every shell, or one value per shell.
///
/// Used for the lognormal shift and for linear bias.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellFactor {
    /// Same value for every shell.
    Uniform(f64),
    /// One value per shell, indexed by shell.
    PerShell(Array1<f64>),
}

impl ShellFactor {
    /// Expand to one value per shell.
    ///
    /// Errors
    /// ------
    /// - `FieldError::ShellCountMismatch` if a per-shell sequence does not
    ///   have `nshells` values.
    pub fn resolve(&self, nshells: usize) -> FieldResult<Array1<f64>> {
        match self {
            ShellFactor::Uniform(value) => Ok(Array1::from_elem(nshells, *value)),
            ShellFactor::PerShell(values) if values.len() == nshells => Ok(values.clone()),
            ShellFactor::PerShell(values) => {
                Err(FieldError::ShellCountMismatch { expected: nshells, actual: values.len() })
            }
        }
    }

    fn resolve_shifts(&self, nshells: usize) -> FieldResult<Array1<f64>> {
        let shifts = self.resolve(nshells)?;
        if let Some((shell, &value)) =
            shifts.iter().enumerate().find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(FieldError::InvalidShift { shell, value });
        }
        Ok(shifts)
    }
}

impl Default for ShellFactor {
    fn default() -> Self {
        ShellFactor::Uniform(1.0)
    }
}

/// LognormalGlsOptions — monopole policy for [`lognormal_gls`].
///
/// The logarithmic map only describes fluctuation covariances, so the `l = 0`
/// term of the Gaussian spectra is set explicitly instead of transformed.
///
/// Fields
/// ------
/// - `monopole`: `Option<f64>`
///   `None` (default) sets the Gaussian monopole of every entry to zero, the
///   zero-mean field convention. `Some(v)` sets the monopole of auto entries
///   `(i, i)` to `v` and of cross entries to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LognormalGlsOptions {
    pub monopole: Option<f64>,
}

impl LognormalGlsOptions {
    /// Construct options with an explicit monopole policy.
    ///
    /// Errors
    /// ------
    /// - `FieldError::InvalidVariance` if `monopole` is negative or not finite.
    pub fn new(monopole: Option<f64>) -> FieldResult<Self> {
        if let Some(value) = monopole {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError::InvalidVariance { value });
            }
        }
        Ok(LognormalGlsOptions { monopole })
    }
}

/// discretized_cls — match spectra to a band limit and pixelization.
///
/// Parameters
/// ----------
/// - `cls`: `&BandedSpectra`
///   Raw angular spectra.
/// - `nside`: `Option<usize>`
///   Target HEALPix resolution. When given, every entry is multiplied by the
///   squared pixel window, which is zero above `3 nside − 1`.
/// - `lmax`: `usize`
///   Output band limit; entries are truncated or zero-padded to `lmax + 1`.
/// - `ncorr`: `Option<usize>`
///   Output correlation band. `None` keeps the input band.
///
/// Returns
/// -------
/// `FieldResult<BandedSpectra>`
///   Collection whose every stored entry has exactly `lmax + 1` values.
///
/// Errors
/// ------
/// - `FieldError::Sphere(InvalidNside)` if `nside == Some(0)`.
pub fn discretized_cls(
    cls: &BandedSpectra, nside: Option<usize>, lmax: usize, ncorr: Option<usize>,
) -> FieldResult<BandedSpectra> {
    let banded = match ncorr {
        Some(ncorr) if ncorr != cls.ncorr() => cls.truncated(ncorr),
        _ => cls.clone(),
    };
    let window = nside.map(|nside| pixel_window(nside, lmax)).transpose()?;

    banded.try_map(lmax, |_, _, cl| {
        let n = cl.len().min(lmax + 1);
        let mut out = Array1::<f64>::zeros(lmax + 1);
        out.slice_mut(s![..n]).assign(&cl.slice(s![..n]));
        if let Some(w) = &window {
            out.zip_mut_with(w, |c, &wl| *c *= wl * wl);
        }
        Ok(out)
    })
}

/// lognormal_gls — Gaussian spectra for lognormal fields.
///
/// Purpose
/// -------
/// For every stored pair `(i, j)` and multipole `l ≥ 1`, compute
/// `G_l(i, j) = s_i s_j ln(1 + C_l(i, j) / (s_i s_j))`, so that a Gaussian
/// field with spectra `G` produces, after the lognormal transform, a density
/// contrast with spectra `C`.
///
/// Parameters
/// ----------
/// - `cls`: `&BandedSpectra`
///   Target spectra of the lognormal density contrast.
/// - `shift`: `&ShellFactor`
///   Lognormal shift per shell; must be finite and `> 0`.
/// - `options`: `&LognormalGlsOptions`
///   Monopole policy.
///
/// Errors
/// ------
/// - `FieldError::InvalidShift` / `ShellCountMismatch` for bad shifts.
/// - `FieldError::LogDomain` if `1 + C_l/(s_i s_j) ≤ 0` for some entry.
pub fn lognormal_gls(
    cls: &BandedSpectra, shift: &ShellFactor, options: &LognormalGlsOptions,
) -> FieldResult<BandedSpectra> {
    let shifts = shift.resolve_shifts(cls.nshells())?;

    cls.try_map(cls.lmax(), |i, j, cl| {
        let s2 = shifts[i] * shifts[j];
        let mut gl = Array1::<f64>::zeros(cl.len());
        for (l, (&c, g)) in cl.iter().zip(gl.iter_mut()).enumerate().skip(1) {
            let arg = 1.0 + c / s2;
            if arg <= 0.0 {
                return Err(FieldError::LogDomain { i, j, l, value: arg });
            }
            *g = s2 * (c / s2).ln_1p();
        }
        if let (Some(g0), Some(monopole)) = (gl.get_mut(0), options.monopole) {
            if i == j {
                *g0 = monopole;
            }
        }
        Ok(gl)
    })
}

/// lognormal_cls — inverse of [`lognormal_gls`] for `l ≥ 1`.
///
/// Computes `C_l(i, j) = s_i s_j (exp(G_l(i, j) / (s_i s_j)) − 1)`; the
/// monopole is copied unchanged.
pub fn lognormal_cls(gls: &BandedSpectra, shift: &ShellFactor) -> FieldResult<BandedSpectra> {
    let shifts = shift.resolve_shifts(gls.nshells())?;

    gls.try_map(gls.lmax(), |i, j, gl| {
        let s2 = shifts[i] * shifts[j];
        let mut cl = gl.to_owned();
        cl.iter_mut().skip(1).for_each(|c| *c = s2 * (*c / s2).exp_m1());
        Ok(cl)
    })
}

/// biased_cls — apply linear bias, `C_l(i, j) → b_i b_j C_l(i, j)`.
///
/// Errors
/// ------
/// - `FieldError::ShellCountMismatch` if a per-shell bias has the wrong length.
/// - `FieldError::InvalidBias` if any bias is not finite.
pub fn biased_cls(cls: &BandedSpectra, bias: &ShellFactor) -> FieldResult<BandedSpectra> {
    let biases = bias.resolve(cls.nshells())?;
    if let Some((shell, &value)) = biases.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(FieldError::InvalidBias { shell, value });
    }
    cls.try_map(cls.lmax(), |i, j, cl| Ok(&cl * (biases[i] * biases[j])))
}

/// Zero-lag moment `σ² = Σ_l (2l+1) C_l / 4π` of a spectrum.
pub fn gaussian_variance(cl: ArrayView1<f64>) -> f64 {
    cl.iter().enumerate().map(|(l, &c)| ((2 * l + 1) as f64) * c).sum::<f64>() / (4.0 * PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::errors::SphereError;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Discretization: uniform lengths, pixel-window weighting, band-limit
    //   zeroing, and rebanding.
    // - Lognormal mapping: closed-form values, round-trip through the inverse,
    //   monopole policy, domain errors, and shift validation.
    // - Bias scaling and zero-lag variance.
    //
    // They intentionally DO NOT cover:
    // - Statistical properties of fields built from these spectra; see
    //   `fields::generator` and the integration tests.
    // -------------------------------------------------------------------------

    fn flat(nshells: usize, ncorr: usize, lmax: usize, auto: f64, cross: f64) -> BandedSpectra {
        BandedSpectra::from_fn(nshells, ncorr, lmax, |i, j| {
            Array1::from_elem(lmax + 1, if i == j { auto } else { cross })
        })
        .expect("flat spectra should be valid")
    }

    #[test]
    // Purpose
    // -------
    // Every output entry has exactly lmax + 1 values and the band is kept.
    fn discretized_cls_pads_and_truncates_to_lmax() {
        // Arrange
        let entries = vec![array![1.0, 1.0], Array1::from_elem(10, 2.0), Array1::from_elem(6, 0.5)];
        let cls = BandedSpectra::new(2, 1, 9, entries).expect("valid");

        // Act
        let out = discretized_cls(&cls, None, 4, None).expect("no nside");

        // Assert
        assert_eq!(out.lmax(), 4);
        assert_eq!(out.ncorr(), 1);
        for (_, _, cl) in out.iter() {
            assert_eq!(cl.len(), 5);
        }
        assert_eq!(out.get(0, 0).unwrap().to_owned(), array![1.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // The squared pixel window multiplies each multipole and zeroes l > 3 nside − 1.
    fn discretized_cls_applies_squared_pixel_window() {
        // Arrange
        let nside = 2;
        let lmax = 8;
        let cls = flat(2, 1, lmax, 1.0, 0.5);
        let window = pixel_window(nside, lmax).expect("valid nside");

        // Act
        let out = discretized_cls(&cls, Some(nside), lmax, None).expect("valid nside");

        // Assert
        for l in 0..=lmax {
            assert_relative_eq!(out.get_at(1, 1, l).unwrap(), window[l] * window[l]);
            assert_relative_eq!(out.get_at(1, 0, l).unwrap(), 0.5 * window[l] * window[l]);
        }
        for l in 6..=lmax {
            assert_eq!(out.get_at(0, 0, l).unwrap(), 0.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Requesting a narrower band drops far pairs; invalid nside is reported.
    fn discretized_cls_rebands_and_validates_nside() {
        // Arrange
        let cls = flat(4, 3, 2, 1.0, 0.2);

        // Act & Assert: rebanding
        let out = discretized_cls(&cls, None, 2, Some(1)).expect("valid");
        assert_eq!(out.ncorr(), 1);
        assert!(out.get(3, 0).unwrap().iter().all(|&v| v == 0.0));

        // Act & Assert: invalid nside
        let err = discretized_cls(&cls, Some(0), 2, None).unwrap_err();
        assert_eq!(err, FieldError::Sphere(SphereError::InvalidNside { nside: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // Closed-form check of the logarithmic map with unit shift.
    //
    // Given
    // -----
    // - C_l = 0.5 for autos, 0.25 for crosses.
    //
    // Expect
    // ------
    // - G_l = ln(1.5) and ln(1.25) for l ≥ 1; monopole zero by default.
    fn lognormal_gls_matches_closed_form() {
        // Arrange
        let cls = flat(3, 1, 3, 0.5, 0.25);

        // Act
        let gls = lognormal_gls(&cls, &ShellFactor::default(), &LognormalGlsOptions::default())
            .expect("valid spectra");

        // Assert
        for l in 1..=3 {
            assert_relative_eq!(gls.get_at(2, 2, l).unwrap(), 1.5_f64.ln(), epsilon = 1e-14);
            assert_relative_eq!(gls.get_at(2, 1, l).unwrap(), 1.25_f64.ln(), epsilon = 1e-14);
        }
        assert_eq!(gls.get_at(0, 0, 0).unwrap(), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The exponential inverse reproduces the target spectra for l ≥ 1.
    //
    // Given
    // -----
    // - Per-shell shifts (1.0, 0.7, 1.3) and mixed-sign cross spectra.
    //
    // Expect
    // ------
    // - `lognormal_cls(lognormal_gls(C)) ≈ C` entry by entry.
    fn lognormal_round_trip_reproduces_targets() {
        // Arrange
        let cls = BandedSpectra::from_fn(3, 2, 5, |i, j| {
            Array1::from_iter((0..=5).map(|l| {
                let base = 0.3 / (1.0 + l as f64);
                if i == j { base } else { -0.4 * base / (1 + i - j) as f64 }
            }))
        })
        .expect("valid");
        let shift = ShellFactor::PerShell(array![1.0, 0.7, 1.3]);

        // Act
        let gls = lognormal_gls(&cls, &shift, &LognormalGlsOptions::default()).expect("in domain");
        let back = lognormal_cls(&gls, &shift).expect("valid shifts");

        // Assert
        for (i, j, cl) in cls.iter() {
            for l in 1..=5 {
                assert_relative_eq!(back.get_at(i, j, l).unwrap(), cl[l], epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // An explicit monopole lands on auto entries only.
    fn lognormal_gls_sets_explicit_monopole_on_autos() {
        // Arrange
        let cls = flat(2, 1, 2, 0.5, 0.1);
        let options = LognormalGlsOptions::new(Some(0.2)).expect("valid monopole");

        // Act
        let gls = lognormal_gls(&cls, &ShellFactor::default(), &options).expect("valid");

        // Assert
        assert_eq!(gls.get_at(1, 1, 0).unwrap(), 0.2);
        assert_eq!(gls.get_at(1, 0, 0).unwrap(), 0.0);
        assert!(LognormalGlsOptions::new(Some(-1.0)).is_err());
    }

    #[test]
    // Purpose
    // -------
    // A correlation incompatible with the shift is a domain error naming the
    // shell pair and multipole.
    fn lognormal_gls_reports_log_domain_errors() {
        // Arrange
        let cls = flat(2, 1, 2, 0.5, -1.5);

        // Act
        let err = lognormal_gls(&cls, &ShellFactor::default(), &LognormalGlsOptions::default())
            .unwrap_err();

        // Assert
        match err {
            FieldError::LogDomain { i, j, l, value } => {
                assert_eq!((i, j, l), (1, 0, 1));
                assert_relative_eq!(value, -0.5);
            }
            other => panic!("expected LogDomain, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-positive shifts and wrong-length factor sequences are rejected.
    fn lognormal_gls_validates_shift() {
        // Arrange
        let cls = flat(2, 0, 1, 0.1, 0.0);
        let opts = LognormalGlsOptions::default();

        // Act & Assert: non-positive shift
        let err = lognormal_gls(&cls, &ShellFactor::PerShell(array![1.0, 0.0]), &opts).unwrap_err();
        assert_eq!(err, FieldError::InvalidShift { shell: 1, value: 0.0 });

        // Act & Assert: wrong shell count
        let err = lognormal_gls(&cls, &ShellFactor::PerShell(array![1.0]), &opts).unwrap_err();
        assert_eq!(err, FieldError::ShellCountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Entry (i, j) is scaled by b_i b_j.
    fn biased_cls_scales_by_bias_products() {
        // Arrange
        let cls = flat(3, 1, 1, 1.0, 0.5);
        let bias = ShellFactor::PerShell(array![1.0, 2.0, 3.0]);

        // Act
        let out = biased_cls(&cls, &bias).expect("valid bias");

        // Assert
        assert_relative_eq!(out.get_at(2, 2, 1).unwrap(), 9.0);
        assert_relative_eq!(out.get_at(2, 1, 1).unwrap(), 3.0);
        assert_relative_eq!(out.get_at(1, 0, 0).unwrap(), 1.0);

        let err = biased_cls(&cls, &ShellFactor::Uniform(f64::NAN)).unwrap_err();
        assert!(matches!(err, FieldError::InvalidBias { shell: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // σ² = Σ (2l+1) C_l / 4π.
    fn gaussian_variance_sums_multipole_weights() {
        // Arrange
        let cl = array![0.0, 1.0, 2.0];

        // Act & Assert
        assert_relative_eq!(gaussian_variance(cl.view()), (3.0 + 10.0) / (4.0 * PI));
    }
}
