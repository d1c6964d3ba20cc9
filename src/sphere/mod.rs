//! sphere — harmonic coefficient sets, HEALPix rings, and spherical transforms.
//!
//! Purpose
//! -------
//! Provide the minimal spherical machinery the field pipeline sits on: a
//! container for the harmonic coefficients of a real field ([`Alm`]), the
//! RING-ordered HEALPix pixelization ([`HealpixGrid`]) with its pixel window,
//! and the transforms between the two ([`alm2map`], [`map2alm`]).
//!
//! Key behaviors
//! -------------
//! - Store `a_lm` for `0 ≤ m ≤ l ≤ lmax` in m-major order and compute
//!   realized auto/cross spectra and per-`l` filters.
//! - Enumerate iso-latitude rings and pixel centers for any `nside ≥ 1`.
//! - Synthesize maps exactly and analyse maps by quadrature with optional
//!   iterative refinement.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fields are real: negative-`m` coefficients are implied by Hermitian
//!   symmetry and never stored.
//! - Band limits above `3 nside − 1` are rejected with
//!   [`SphereError::LmaxExceedsResolution`].
//!
//! Conventions
//! -----------
//! - Maps are `Array1<f64>` of length `12 nside²` in RING order.
//! - Spherical harmonics include the Condon–Shortley phase.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each file: indexing and spectra in [`alm`],
//!   ring layout and pixel window in [`healpix`], closed-form harmonics and
//!   analysis round-trips in [`harmonic`].

pub mod alm;
pub mod errors;
pub mod harmonic;
pub mod healpix;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::alm::Alm;
pub use self::errors::{SphereError, SphereResult};
pub use self::harmonic::{alm2map, map2alm};
pub use self::healpix::{HealpixGrid, Ring, pixel_window};

pub mod prelude {
    pub use super::alm::Alm;
    pub use super::errors::{SphereError, SphereResult};
    pub use super::harmonic::{alm2map, map2alm};
    pub use super::healpix::{HealpixGrid, pixel_window};
}
