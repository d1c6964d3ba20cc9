//! Lognormal synthesis: Gaussian coefficients → density-contrast maps.
//!
//! Purpose
//! -------
//! Turn one shell's Gaussian harmonic coefficients into a pixel map of the
//! lognormal density contrast, and chain the field generator with synthesis
//! for whole shell sequences.
//!
//! Key behaviors
//! -------------
//! - [`alm_to_lognormal`]: `alm2map`, then the pointwise transform
//!   `δ = λ (exp(G/λ − σ²/(2λ²)) − 1)` with shift `λ` and Gaussian variance
//!   `σ²`. For `λ = 1` this is `exp(G − σ²/2) − 1`.
//! - `σ²` defaults to the zero-lag moment of the realized spectrum of the
//!   coefficient set and may be fixed through [`LognormalOptions`].
//! - [`generate_gaussian`] / [`generate_lognormal`]: lazy per-shell map
//!   sequences built on
//!   [`CorrelatedFieldGenerator`](crate::fields::generator::CorrelatedFieldGenerator)
//!   and configured by its [`GeneratorOptions`]. The centring variance of
//!   each shell counts the monopole only when the generator draws it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `δ > −λ` everywhere; with `σ²` equal to the field variance the
//!   expectation of `δ` is zero.
//! - The covariance of `δ` at zero lag is `λ² (exp(σ²/λ²) − 1)`, which is
//!   the inverse of the mapping used by `lognormal_gls`.
//! - The coefficient band limit must not exceed `3 nside − 1`.
use crate::{
    fields::{
        errors::{FieldError, FieldResult},
        generator::{CorrelatedFieldGenerator, GeneratorOptions},
        spectra::BandedSpectra,
        transforms::gaussian_variance,
    },
    sphere::{alm::Alm, errors::SphereError, harmonic::alm2map, healpix::HealpixGrid},
};
use ndarray::{Array1, ArrayViewMut1};
use rand::Rng;

/// LognormalOptions — shift and variance for the lognormal transform.
///
/// Fields
/// ------
/// - `shift`: `f64`
///   Lognormal shift `λ > 0`; the contrast is bounded below by `−λ`.
///   Default `1.0`.
/// - `variance`: `Option<f64>`
///   Gaussian variance `σ²` used to centre the field. `None` (default) uses
///   the realized coefficient set in [`alm_to_lognormal`] and the Gaussian
///   auto spectrum in [`generate_lognormal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LognormalOptions {
    pub shift: f64,
    pub variance: Option<f64>,
}

impl LognormalOptions {
    /// Validated constructor.
    ///
    /// Errors
    /// ------
    /// - `FieldError::InvalidShift` (reported for shell 0) if `shift` is not
    ///   finite and positive.
    /// - `FieldError::InvalidVariance` if `variance` is negative or not finite.
    pub fn new(shift: f64, variance: Option<f64>) -> FieldResult<Self> {
        if !shift.is_finite() || shift <= 0.0 {
            return Err(FieldError::InvalidShift { shell: 0, value: shift });
        }
        if let Some(value) = variance {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError::InvalidVariance { value });
            }
        }
        Ok(LognormalOptions { shift, variance })
    }
}

impl Default for LognormalOptions {
    fn default() -> Self {
        LognormalOptions { shift: 1.0, variance: None }
    }
}

/// Apply `δ = λ (exp(G/λ − σ²/(2λ²)) − 1)` in place.
///
/// For `λ ≠ 1` this intentionally differs from the textbook shifted form
/// `λ exp(G − σ²/2) − λ`: the Gaussian field is scaled by `1/λ` before
/// exponentiation so that the covariance of `δ` is `λ² (exp(C_G/λ²) − 1)`,
/// the exact inverse of `lognormal_gls`. Both forms agree at `λ = 1`.
pub fn lognormal_transform(mut map: ArrayViewMut1<f64>, shift: f64, variance: f64) {
    let offset = 0.5 * variance / (shift * shift);
    map.mapv_inplace(|g| shift * (g / shift - offset).exp_m1());
}

/// alm_to_lognormal — synthesize one lognormal density-contrast map.
///
/// Parameters
/// ----------
/// - `alm`: `&Alm`
///   Gaussian coefficients of one shell.
/// - `grid`: `&HealpixGrid`
///   Target pixelization.
/// - `options`: `&LognormalOptions`
///   Shift and optional fixed variance.
///
/// Errors
/// ------
/// - `FieldError::Sphere(LmaxExceedsResolution)` if `alm.lmax() > 3 nside − 1`.
pub fn alm_to_lognormal(
    alm: &Alm, grid: &HealpixGrid, options: &LognormalOptions,
) -> FieldResult<Array1<f64>> {
    let mut map = alm2map(alm, grid)?;
    let variance = options.variance.unwrap_or_else(|| gaussian_variance(alm.to_cl().view()));
    lognormal_transform(map.view_mut(), options.shift, variance);
    Ok(map)
}

fn grid_for(gls: &BandedSpectra, nside: usize) -> FieldResult<HealpixGrid> {
    let grid = HealpixGrid::new(nside)?;
    if gls.lmax() > grid.band_limit() {
        return Err(SphereError::LmaxExceedsResolution { lmax: gls.lmax(), nside }.into());
    }
    Ok(grid)
}

/// Gaussian variance used to centre `shell`: the zero-lag moment of its
/// auto spectrum over the multipoles the generator actually draws.
fn centring_variance(gls: &BandedSpectra, shell: usize, monopole: bool) -> FieldResult<f64> {
    let mut cl = gls.get(shell, shell)?.into_owned();
    if !monopole {
        cl[0] = 0.0;
    }
    Ok(gaussian_variance(cl.view()))
}

/// generate_gaussian — lazy sequence of Gaussian maps, one per shell.
///
/// Parameters
/// ----------
/// - `gls`: `&BandedSpectra`
///   Gaussian spectra.
/// - `nside`: `usize`
///   Output resolution; `gls.lmax()` must not exceed `3 nside − 1`.
/// - `generator`: `GeneratorOptions`
///   Band, band limit, and monopole policy of the underlying generator,
///   usually [`GeneratorOptions::for_spectra`].
/// - `rng`: random source owned by the sequence.
///
/// Errors
/// ------
/// - Construction: `InvalidNside`, `LmaxExceedsResolution`, `NcorrMismatch`,
///   `LmaxMismatch`.
/// - Per item: any generator error; the sequence ends after it.
pub fn generate_gaussian<R: Rng>(
    gls: &BandedSpectra, nside: usize, generator: GeneratorOptions, rng: R,
) -> FieldResult<impl Iterator<Item = FieldResult<Array1<f64>>>> {
    let grid = grid_for(gls, nside)?;
    let alms = CorrelatedFieldGenerator::new(gls, generator, rng)?;
    Ok(alms.map(move |alm| -> FieldResult<Array1<f64>> {
        let alm = alm?;
        Ok(alm2map(&alm, &grid)?)
    }))
}

/// generate_lognormal — lazy sequence of lognormal density-contrast maps.
///
/// Each shell is centred with `σ²` from its Gaussian auto spectrum
/// `gls(i, i)` unless `options.variance` is set. The monopole `G_0` enters
/// `σ²` only when `generator.monopole` is set, so a Gaussian monopole that
/// is never drawn does not shift the mean. The same shift applies to every
/// shell.
///
/// Errors
/// ------
/// - Construction: `InvalidNside`, `LmaxExceedsResolution`, `NcorrMismatch`,
///   `LmaxMismatch`.
/// - Per item: any generator error; the sequence ends after it.
pub fn generate_lognormal<'a, R: Rng + 'a>(
    gls: &'a BandedSpectra, nside: usize, options: LognormalOptions, generator: GeneratorOptions,
    rng: R,
) -> FieldResult<impl Iterator<Item = FieldResult<Array1<f64>>> + 'a> {
    let grid = grid_for(gls, nside)?;
    let alms = CorrelatedFieldGenerator::new(gls, generator, rng)?;
    Ok(alms.enumerate().map(move |(shell, alm)| -> FieldResult<Array1<f64>> {
        let mut map = alm2map(&alm?, &grid)?;
        let variance = match options.variance {
            Some(value) => value,
            None => centring_variance(gls, shell, generator.monopole)?,
        };
        lognormal_transform(map.view_mut(), options.shift, variance);
        Ok(map)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{
        generator::generate_alms,
        transforms::{LognormalGlsOptions, ShellFactor, lognormal_gls},
    };
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use statrs::statistics::Statistics;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The pointwise transform against closed forms.
    // - Zero mean and the lower bound −λ of synthesized maps.
    // - Centring of the lazy pipeline when the Gaussian spectra carry a
    //   monopole, with the monopole drawn or suppressed.
    // - Option validation and band-limit errors.
    // - Shape of the lazy map sequences.
    // -------------------------------------------------------------------------

    fn flat(nshells: usize, ncorr: usize, lmax: usize, auto: f64, cross: f64) -> BandedSpectra {
        BandedSpectra::from_fn(nshells, ncorr, lmax, |i, j| {
            let mut cl = Array1::from_elem(lmax + 1, if i == j { auto } else { cross });
            cl[0] = 0.0;
            cl
        })
        .expect("flat spectra should be valid")
    }

    /// One shell, `C_l = 1e-2` for `1 ≤ l ≤ 8`, mapped to Gaussian spectra
    /// with an explicit Gaussian monopole `G_0 = 0.5`.
    fn gls_with_monopole() -> BandedSpectra {
        let cls = flat(1, 0, 8, 1e-2, 0.0);
        let options = LognormalGlsOptions::new(Some(0.5)).expect("valid monopole");
        lognormal_gls(&cls, &ShellFactor::default(), &options).expect("in domain")
    }

    #[test]
    // Purpose
    // -------
    // δ = λ (exp(G/λ − σ²/(2λ²)) − 1) for a few hand-picked values.
    fn lognormal_transform_matches_closed_form() {
        // Arrange
        let mut map = Array1::from(vec![0.0, 0.5, -1.0]);

        // Act
        lognormal_transform(map.view_mut(), 2.0, 0.4);

        // Assert
        let offset: f64 = 0.5 * 0.4 / 4.0;
        assert_relative_eq!(map[0], 2.0 * ((-offset).exp() - 1.0), epsilon = 1e-14);
        assert_relative_eq!(map[1], 2.0 * ((0.25 - offset).exp() - 1.0), epsilon = 1e-14);
        assert_relative_eq!(map[2], 2.0 * ((-0.5 - offset).exp() - 1.0), epsilon = 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // Synthesized maps have mean ≈ 0 and never fall below −λ.
    //
    // Given
    // -----
    // - Single shell, C_l = 1e-3 for 1 ≤ l ≤ 16, nside = 8, 10 seeds.
    //
    // Expect
    // ------
    // - |pixel mean| < 5e-3 pooled over seeds (pixel std ≈ 0.15).
    // - min δ > −1.
    fn synthesized_map_is_centred_and_bounded() {
        // Arrange
        let gls = flat(1, 0, 16, 1e-3, 0.0);
        let grid = HealpixGrid::new(8).expect("valid nside");
        let options = LognormalOptions::default();
        let mut pooled = Vec::new();

        // Act
        for seed in 0..10 {
            let alm = generate_alms(&gls, 0, StdRng::seed_from_u64(seed))
                .expect("valid")
                .next()
                .expect("one shell")
                .expect("valid spectra");
            let map = alm_to_lognormal(&alm, &grid, &options).expect("band-limited");
            assert_eq!(map.len(), grid.npix());
            pooled.extend(map.iter().copied());
        }

        // Assert
        assert!(pooled.iter().mean().abs() < 5e-3);
        assert!(pooled.iter().copied().fold(f64::INFINITY, f64::min) > -1.0);
    }

    #[test]
    // Purpose
    // -------
    // A large-amplitude field stays above −λ for a non-unit shift.
    fn strong_field_respects_shift_bound() {
        // Arrange
        let gls = flat(1, 0, 8, 0.5, 0.0);
        let grid = HealpixGrid::new(4).expect("valid nside");
        let options = LognormalOptions::new(0.5, None).expect("valid options");
        let alm = generate_alms(&gls, 0, StdRng::seed_from_u64(11))
            .expect("valid")
            .next()
            .expect("one shell")
            .expect("valid spectra");

        // Act
        let map = alm_to_lognormal(&alm, &grid, &options).expect("band-limited");

        // Assert
        assert!(map.iter().all(|&d| d > -0.5));
    }

    #[test]
    // Purpose
    // -------
    // A Gaussian monopole that the generator does not draw must not enter
    // the centring variance of the lazy lognormal pipeline.
    //
    // Given
    // -----
    // - One shell, C_l = 1e-2 for 1 ≤ l ≤ 8, Gaussian monopole G_0 = 0.5.
    // - Default generator options (monopole suppressed), nside = 4, 20 seeds.
    //
    // Expect
    // ------
    // - Pooled pixel mean |δ| < 5e-3. Counting G_0 in σ² would bias the
    //   mean to exp(−G_0 / 8π) − 1 ≈ −0.02.
    fn lognormal_pipeline_ignores_undrawn_monopole() {
        // Arrange
        let gls = gls_with_monopole();
        let generator = GeneratorOptions::for_spectra(&gls);
        let mut pooled = Vec::new();

        // Act
        for seed in 0..20 {
            let maps: Vec<Array1<f64>> = generate_lognormal(
                &gls,
                4,
                LognormalOptions::default(),
                generator,
                StdRng::seed_from_u64(seed),
            )
            .expect("valid configuration")
            .collect::<FieldResult<_>>()
            .expect("valid spectra");
            pooled.extend(maps[0].iter().copied());
        }

        // Assert
        let mean = pooled.iter().mean();
        assert!(mean.abs() < 5e-3, "pooled mean {mean}");
    }

    #[test]
    // Purpose
    // -------
    // The pipelines draw the monopole when the generator options ask for it.
    //
    // Given
    // -----
    // - Gaussian spectra with G_0 = 0.5, nside = 4, 20 seeds.
    //
    // Expect
    // ------
    // - With the monopole on, the mean of squared map means is near
    //   G_0 / 4π ≈ 0.04 (above 0.01).
    // - With the monopole off, it is at least ten times smaller.
    fn gaussian_pipeline_draws_monopole_on_request() {
        // Arrange
        let gls = gls_with_monopole();
        let off = GeneratorOptions::for_spectra(&gls);
        let on = GeneratorOptions { monopole: true, ..off };
        let mean_square = |generator: GeneratorOptions| -> f64 {
            (0..20)
                .map(|seed| {
                    let map = generate_gaussian(&gls, 4, generator, StdRng::seed_from_u64(seed))
                        .expect("valid configuration")
                        .next()
                        .expect("one shell")
                        .expect("valid spectra");
                    map.iter().mean().powi(2)
                })
                .sum::<f64>()
                / 20.0
        };

        // Act
        let with_monopole = mean_square(on);
        let without_monopole = mean_square(off);

        // Assert
        assert!(with_monopole > 0.01, "monopole on: {with_monopole}");
        assert!(without_monopole < 0.1 * with_monopole, "monopole off: {without_monopole}");
    }

    #[test]
    // Purpose
    // -------
    // Invalid options and coefficient sets too fine for the grid are errors.
    fn invalid_inputs_are_rejected() {
        // Arrange
        let grid = HealpixGrid::new(2).expect("valid nside");

        // Act
        let bad_shift = LognormalOptions::new(0.0, None);
        let bad_variance = LognormalOptions::new(1.0, Some(-1.0));
        let too_fine = alm_to_lognormal(&Alm::zeros(6), &grid, &LognormalOptions::default());

        // Assert
        assert_eq!(bad_shift.unwrap_err(), FieldError::InvalidShift { shell: 0, value: 0.0 });
        assert_eq!(bad_variance.unwrap_err(), FieldError::InvalidVariance { value: -1.0 });
        assert_eq!(
            too_fine.unwrap_err(),
            FieldError::Sphere(SphereError::LmaxExceedsResolution { lmax: 6, nside: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // The lazy pipelines yield one full-size map per shell.
    fn pipelines_yield_one_map_per_shell() {
        // Arrange
        let gls = flat(3, 1, 8, 1e-2, 5e-3);
        let generator = GeneratorOptions::for_spectra(&gls);

        // Act
        let gaussian: Vec<Array1<f64>> =
            generate_gaussian(&gls, 4, generator, StdRng::seed_from_u64(5))
                .expect("valid configuration")
                .collect::<FieldResult<_>>()
                .expect("valid spectra");
        let lognormal: Vec<Array1<f64>> = generate_lognormal(
            &gls,
            4,
            LognormalOptions::default(),
            generator,
            StdRng::seed_from_u64(5),
        )
        .expect("valid configuration")
        .collect::<FieldResult<_>>()
        .expect("valid spectra");
        let err = generate_gaussian(&gls, 2, generator, StdRng::seed_from_u64(5)).err();

        // Assert
        assert_eq!(gaussian.len(), 3);
        assert_eq!(lognormal.len(), 3);
        assert!(gaussian.iter().chain(lognormal.iter()).all(|m| m.len() == 192));
        assert_eq!(
            err,
            Some(FieldError::Sphere(SphereError::LmaxExceedsResolution { lmax: 8, nside: 2 }))
        );
    }
}
