//! fields — correlated Gaussian and lognormal fields across radial shells.
//!
//! Purpose
//! -------
//! Generate a sequence of spherical random fields, one per radial shell,
//! whose cross-shell correlations follow a prescribed set of angular power
//! spectra, and turn them into lognormal density-contrast maps. Shells are
//! produced one at a time with memory bounded by the correlation band
//! `ncorr`, independent of the total number of shells.
//!
//! Key behaviors
//! -------------
//! - Store spectra for every shell pair within `ncorr` of each other in a
//!   banded triangular collection ([`BandedSpectra`]) with symmetric,
//!   zero-outside-band lookup.
//! - Prepare spectra: discretize to a band limit and pixel window
//!   ([`discretized_cls`]), map lognormal targets to Gaussian spectra
//!   ([`lognormal_gls`]), and apply linear bias ([`biased_cls`]).
//! - Draw harmonic coefficients shell by shell, conditioning each shell on
//!   its `ncorr` predecessors ([`CorrelatedFieldGenerator`]).
//! - Reuse random phases for a second field via [`rescaled_alm`] and
//!   synthesize lognormal maps with [`alm_to_lognormal`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Shells are 0-based and ordered by increasing distance.
//! - Pairs with `|i − j| > ncorr` are uncorrelated. This is a truncation of
//!   whatever the physical correlation length is, not an error condition.
//! - Covariance blocks that are indefinite beyond round-off are reported as
//!   [`FieldError::NotPositiveSemiDefinite`]; tiny negative residual
//!   variances are clamped to zero.
//!
//! Conventions
//! -----------
//! - Spectra are `Array1<f64>` indexed by multipole `l`.
//! - Randomness is injected by the caller as any `rand::Rng`; a seeded
//!   `StdRng` makes every pipeline reproducible.
//! - Library code logs through `log` only (`debug!` per shell, `trace!` on
//!   clamping).
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each file. Statistical tests use fixed seeds
//!   and tolerances several standard errors wide.
//! - The end-to-end matter + biased tracer scenario is covered by the
//!   integration tests under `tests/`.

pub mod conditional;
pub mod errors;
pub mod generator;
pub mod lognormal;
pub mod rescale;
pub mod spectra;
pub mod transforms;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::conditional::{ConditionalNormal, conditional_normal};
pub use self::errors::{FieldError, FieldResult};
pub use self::generator::{CorrelatedFieldGenerator, GeneratorOptions, generate_alms};
pub use self::lognormal::{
    LognormalOptions, alm_to_lognormal, generate_gaussian, generate_lognormal, lognormal_transform,
};
pub use self::rescale::rescaled_alm;
pub use self::spectra::BandedSpectra;
pub use self::transforms::{
    LognormalGlsOptions, ShellFactor, biased_cls, discretized_cls, gaussian_variance,
    lognormal_cls, lognormal_gls,
};

pub mod prelude {
    pub use super::errors::{FieldError, FieldResult};
    pub use super::generator::{CorrelatedFieldGenerator, GeneratorOptions, generate_alms};
    pub use super::lognormal::{LognormalOptions, alm_to_lognormal, generate_lognormal};
    pub use super::rescale::rescaled_alm;
    pub use super::spectra::BandedSpectra;
    pub use super::transforms::{
        LognormalGlsOptions, ShellFactor, biased_cls, discretized_cls, lognormal_gls,
    };
}
