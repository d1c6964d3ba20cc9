//! Errors for spherical-harmonic containers, pixel grids, and transforms.
//!
//! All failures here are shape or resolution mismatches between a
//! coefficient set, a pixel map, and a HEALPix grid. They are configuration
//! errors in the caller and are never retried.

/// Result alias for sphere operations that may produce [`SphereError`].
pub type SphereResult<T> = Result<T, SphereError>;

/// Unified error type for the sphere layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SphereError {
    // ---- Grid ----
    /// HEALPix resolution parameter must be at least 1.
    InvalidNside { nside: usize },

    /// Pixel index outside `0..npix`.
    PixelOutOfRange { pixel: usize, npix: usize },

    // ---- Shapes ----
    /// Map length does not equal `12 nside²`.
    MapSizeMismatch { expected: usize, actual: usize },

    /// Coefficient array length does not equal `(lmax+1)(lmax+2)/2`.
    AlmSizeMismatch { expected: usize, actual: usize },

    /// Two coefficient sets (or a set and a per-`l` filter) disagree on `lmax`.
    LmaxMismatch { expected: usize, actual: usize },

    /// Band limit exceeds what the pixelization can represent (`3 nside − 1`).
    LmaxExceedsResolution { lmax: usize, nside: usize },
}

impl std::error::Error for SphereError {}

impl std::fmt::Display for SphereError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Grid ----
            SphereError::InvalidNside { nside } => {
                write!(f, "Sphere Error: nside must be >= 1 (got {nside})")
            }
            SphereError::PixelOutOfRange { pixel, npix } => {
                write!(f, "Sphere Error: pixel {pixel} out of range for npix = {npix}")
            }

            // ---- Shapes ----
            SphereError::MapSizeMismatch { expected, actual } => write!(
                f,
                "Sphere Error: map has {actual} pixels, grid expects {expected}"
            ),
            SphereError::AlmSizeMismatch { expected, actual } => write!(
                f,
                "Sphere Error: alm has {actual} coefficients, lmax implies {expected}"
            ),
            SphereError::LmaxMismatch { expected, actual } => {
                write!(f, "Sphere Error: lmax mismatch (expected {expected}, got {actual})")
            }
            SphereError::LmaxExceedsResolution { lmax, nside } => write!(
                f,
                "Sphere Error: lmax = {lmax} exceeds the band limit 3*nside-1 for nside = {nside}"
            ),
        }
    }
}
