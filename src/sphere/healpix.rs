//! HEALPix RING-scheme geometry and the pixel window function.
//!
//! Purpose
//! -------
//! Describe the equal-area HEALPix pixelization as a list of iso-latitude
//! rings, which is all harmonic synthesis and analysis need: per ring the
//! cosine of the colatitude, the number of pixels, the index of its first
//! pixel, and the azimuth of that first pixel.
//!
//! Key behaviors
//! -------------
//! - [`HealpixGrid::new`] builds the `4 nside − 1` rings for any `nside ≥ 1`.
//! - [`HealpixGrid::pix2ang`] maps a RING pixel index to `(θ, φ)`.
//! - [`pixel_window`] approximates the pixel window by a spherical cap of
//!   one pixel's area and zeroes multipoles above `3 nside − 1`.
//!
//! Conventions
//! -----------
//! - Rings are numbered from the north pole; pixels within a ring increase
//!   in azimuth, starting at `phi0`.
//! - North polar cap rings `r < nside` hold `4r` pixels; equatorial rings
//!   `nside ≤ r ≤ 3 nside` hold `4 nside` pixels, starting at `φ = 0` or at
//!   a half-pixel offset on alternate rings; the south cap mirrors the north.
use crate::sphere::errors::{SphereError, SphereResult};
use ndarray::Array1;
use std::f64::consts::PI;

/// Ring — one iso-latitude ring of HEALPix pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    /// `cos θ` of the ring.
    pub z: f64,
    /// Index of the first pixel of the ring.
    pub first_pixel: usize,
    /// Number of pixels in the ring.
    pub npix: usize,
    /// Azimuth of the first pixel.
    pub phi0: f64,
}

impl Ring {
    /// Azimuth of the `j`-th pixel within the ring.
    #[inline]
    pub fn phi(&self, j: usize) -> f64 {
        self.phi0 + 2.0 * PI * (j as f64) / (self.npix as f64)
    }
}

/// HealpixGrid — RING-ordered HEALPix pixelization at resolution `nside`.
///
/// Invariants
/// ----------
/// - `nside ≥ 1`; `rings.len() == 4 nside − 1`.
/// - Ring pixel ranges are contiguous and cover `0..12 nside²` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct HealpixGrid {
    nside: usize,
    rings: Vec<Ring>,
}

impl HealpixGrid {
    /// Build the ring table for `nside`.
    ///
    /// Errors
    /// ------
    /// - `SphereError::InvalidNside` if `nside == 0`.
    pub fn new(nside: usize) -> SphereResult<Self> {
        if nside == 0 {
            return Err(SphereError::InvalidNside { nside });
        }
        let n = nside as f64;
        let npix = 12 * nside * nside;
        let ncap = 2 * nside * (nside - 1);
        let rings = (1..4 * nside)
            .map(|r| {
                if r < nside {
                    let rf = r as f64;
                    Ring {
                        z: 1.0 - rf * rf / (3.0 * n * n),
                        first_pixel: 2 * r * (r - 1),
                        npix: 4 * r,
                        phi0: PI / (4.0 * rf),
                    }
                } else if r <= 3 * nside {
                    let shifted = (r - nside + 1) % 2 == 1;
                    Ring {
                        z: 4.0 / 3.0 - 2.0 * (r as f64) / (3.0 * n),
                        first_pixel: ncap + (r - nside) * 4 * nside,
                        npix: 4 * nside,
                        phi0: if shifted { PI / (4.0 * n) } else { 0.0 },
                    }
                } else {
                    let rr = 4 * nside - r;
                    let rf = rr as f64;
                    Ring {
                        z: -(1.0 - rf * rf / (3.0 * n * n)),
                        first_pixel: npix - 2 * rr * (rr + 1),
                        npix: 4 * rr,
                        phi0: PI / (4.0 * rf),
                    }
                }
            })
            .collect();
        Ok(HealpixGrid { nside, rings })
    }

    pub fn nside(&self) -> usize {
        self.nside
    }

    /// Total number of pixels, `12 nside²`.
    pub fn npix(&self) -> usize {
        12 * self.nside * self.nside
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Largest multipole the pixelization resolves, `3 nside − 1`.
    pub fn band_limit(&self) -> usize {
        3 * self.nside - 1
    }

    /// Colatitude and azimuth `(θ, φ)` of a RING pixel center.
    ///
    /// Errors
    /// ------
    /// - `SphereError::PixelOutOfRange` if `pixel ≥ npix`.
    pub fn pix2ang(&self, pixel: usize) -> SphereResult<(f64, f64)> {
        let npix = self.npix();
        if pixel >= npix {
            return Err(SphereError::PixelOutOfRange { pixel, npix });
        }
        let idx = self.rings.partition_point(|ring| ring.first_pixel <= pixel) - 1;
        let ring = &self.rings[idx];
        Ok((ring.z.acos(), ring.phi(pixel - ring.first_pixel)))
    }
}

/// Pixel window function `W_l` for `l = 0..=lmax`.
///
/// Approximates each pixel by a spherical cap of equal area (`cos θ_p =
/// 1 − 2/npix`), whose window is
/// `W_l = [P_{l−1}(x) − P_{l+1}(x)] / ((2l+1)(1 − x))` with `W_0 = 1`.
/// Multipoles above `3 nside − 1` are set to zero because the pixelization
/// cannot represent them.
///
/// Errors
/// ------
/// - `SphereError::InvalidNside` if `nside == 0`.
pub fn pixel_window(nside: usize, lmax: usize) -> SphereResult<Array1<f64>> {
    if nside == 0 {
        return Err(SphereError::InvalidNside { nside });
    }
    let npix = (12 * nside * nside) as f64;
    let x = 1.0 - 2.0 / npix;
    let band_limit = 3 * nside - 1;

    // Legendre polynomials up to lmax + 1
    let mut p = Array1::<f64>::zeros(lmax + 2);
    p[0] = 1.0;
    p[1] = x;
    for l in 1..=lmax {
        let lf = l as f64;
        p[l + 1] = ((2.0 * lf + 1.0) * x * p[l] - lf * p[l - 1]) / (lf + 1.0);
    }

    let mut window = Array1::<f64>::zeros(lmax + 1);
    window[0] = 1.0;
    for l in 1..=lmax.min(band_limit) {
        window[l] = (p[l - 1] - p[l + 1]) / (((2 * l + 1) as f64) * (1.0 - x));
    }
    Ok(window)
}
