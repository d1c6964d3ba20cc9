//! Spherical-harmonic synthesis and analysis on the HEALPix ring grid.
//!
//! Purpose
//! -------
//! Convert between harmonic coefficient sets ([`Alm`]) and RING-ordered
//! pixel maps. Both directions work ring by ring: normalized associated
//! Legendre functions are evaluated once per ring and the azimuthal sums are
//! carried by a phase recurrence.
//!
//! Key behaviors
//! -------------
//! - [`alm2map`]: exact synthesis `f(θ, φ) = Σ_l a_l0 λ_l0 + 2 Re Σ_{m>0}
//!   e^{imφ} Σ_l a_lm λ_lm`.
//! - [`map2alm`]: equal-weight quadrature `a_lm ≈ (4π/npix) Σ_p f_p Y*_lm(p)`
//!   with optional Jacobi refinement passes `a += A(f − S(a))`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lmax ≤ 3 nside − 1`; larger band limits are rejected because the ring
//!   sampling cannot represent them.
//! - `λ_lm(z) = sqrt((2l+1)/(4π) (l−m)!/(l+m)!) P_lm(z)` including the
//!   Condon–Shortley phase, so `Y_lm(θ, φ) = λ_lm(cos θ) e^{imφ}`.
//!
//! Performance
//! -----------
//! - Synthesis and analysis cost `O(nrings · lmax²) + O(npix · lmax)`; no
//!   FFTs are used.
use crate::sphere::{
    alm::Alm,
    errors::{SphereError, SphereResult},
    healpix::HealpixGrid,
};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Normalized associated Legendre functions `λ_lm(z)` for every
/// `0 ≤ m ≤ l ≤ lmax`, laid out like [`Alm`] coefficients.
pub(crate) fn legendre_table(lmax: usize, z: f64) -> Vec<f64> {
    let mut out = vec![0.0; Alm::size(lmax)];
    let sin_theta = (1.0 - z * z).max(0.0).sqrt();
    let mut lambda_mm = (1.0 / (4.0 * PI)).sqrt();
    for m in 0..=lmax {
        let mf = m as f64;
        if m > 0 {
            lambda_mm *= -((2.0 * mf + 1.0) / (2.0 * mf)).sqrt() * sin_theta;
        }
        let base = Alm::index_of(lmax, m, m);
        out[base] = lambda_mm;
        if m == lmax {
            continue;
        }
        let mut prev2 = lambda_mm;
        let mut prev1 = z * (2.0 * mf + 3.0).sqrt() * lambda_mm;
        out[base + 1] = prev1;
        for l in m + 2..=lmax {
            let lf = l as f64;
            let a = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
            let b = (((lf - 1.0) * (lf - 1.0) - mf * mf) / (4.0 * (lf - 1.0) * (lf - 1.0) - 1.0))
                .sqrt();
            let value = a * (z * prev1 - b * prev2);
            out[base + (l - m)] = value;
            prev2 = prev1;
            prev1 = value;
        }
    }
    out
}

fn check_band_limit(lmax: usize, grid: &HealpixGrid) -> SphereResult<()> {
    if lmax > grid.band_limit() {
        return Err(SphereError::LmaxExceedsResolution { lmax, nside: grid.nside() });
    }
    Ok(())
}

/// alm2map — synthesize a RING-ordered real map from harmonic coefficients.
///
/// Parameters
/// ----------
/// - `alm`: `&Alm`
///   Coefficients with `lmax ≤ 3 nside − 1`.
/// - `grid`: `&HealpixGrid`
///   Target pixelization.
///
/// Returns
/// -------
/// `SphereResult<Array1<f64>>`
///   Map of length `12 nside²`.
///
/// Errors
/// ------
/// - `SphereError::LmaxExceedsResolution` if the band limit is too high for
///   the grid.
pub fn alm2map(alm: &Alm, grid: &HealpixGrid) -> SphereResult<Array1<f64>> {
    let lmax = alm.lmax();
    check_band_limit(lmax, grid)?;
    let mut map = Array1::<f64>::zeros(grid.npix());
    let mut fm = vec![Complex64::new(0.0, 0.0); lmax + 1];

    for ring in grid.rings() {
        let lambda = legendre_table(lmax, ring.z);
        for (m, f) in fm.iter_mut().enumerate() {
            let base = Alm::index_of(lmax, m, m);
            *f = (m..=lmax).map(|l| alm.get(l, m) * lambda[base + (l - m)]).sum();
        }
        for j in 0..ring.npix {
            let step = Complex64::from_polar(1.0, ring.phi(j));
            let mut phase = Complex64::new(1.0, 0.0);
            let mut value = fm[0].re;
            for f in fm.iter().skip(1) {
                phase *= step;
                value += 2.0 * (f * phase).re;
            }
            map[ring.first_pixel + j] = value;
        }
    }
    Ok(map)
}

fn analysis(map: ArrayView1<f64>, grid: &HealpixGrid, lmax: usize) -> Alm {
    let mut alm = Alm::zeros(lmax);
    let weight = 4.0 * PI / (grid.npix() as f64);
    let mut gm = vec![Complex64::new(0.0, 0.0); lmax + 1];

    for ring in grid.rings() {
        gm.iter_mut().for_each(|g| *g = Complex64::new(0.0, 0.0));
        for j in 0..ring.npix {
            let value = weight * map[ring.first_pixel + j];
            let step = Complex64::from_polar(1.0, -ring.phi(j));
            let mut phase = Complex64::new(1.0, 0.0);
            gm[0] += value;
            for g in gm.iter_mut().skip(1) {
                phase *= step;
                *g += phase * value;
            }
        }
        let lambda = legendre_table(lmax, ring.z);
        for (m, &g) in gm.iter().enumerate() {
            let base = Alm::index_of(lmax, m, m);
            for l in m..=lmax {
                let current = alm.get(l, m);
                alm.set(l, m, current + g * lambda[base + (l - m)]);
            }
        }
    }
    alm
}

/// map2alm — harmonic analysis of a RING-ordered map.
///
/// Purpose
/// -------
/// Estimate `a_lm` up to `lmax` by equal-weight quadrature over pixels,
/// refined by `iterations` Jacobi passes that re-analyse the synthesis
/// residual.
///
/// Errors
/// ------
/// - `SphereError::MapSizeMismatch` if `map.len() != 12 nside²`.
/// - `SphereError::LmaxExceedsResolution` if `lmax > 3 nside − 1`.
pub fn map2alm(
    map: ArrayView1<f64>, grid: &HealpixGrid, lmax: usize, iterations: usize,
) -> SphereResult<Alm> {
    if map.len() != grid.npix() {
        return Err(SphereError::MapSizeMismatch { expected: grid.npix(), actual: map.len() });
    }
    check_band_limit(lmax, grid)?;

    let mut alm = analysis(map, grid, lmax);
    for _ in 0..iterations {
        let residual = &map - &alm2map(&alm, grid)?;
        alm.add_assign(&analysis(residual.view(), grid, lmax));
    }
    Ok(alm)
}
