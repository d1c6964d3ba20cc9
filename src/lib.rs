//! rust_lss — correlated lognormal fields on concentric spherical shells.
//!
//! Purpose
//! -------
//! Simulate the matter distribution of the universe as a stack of
//! concentric shells, each carrying a random field on the sphere, with
//! cross-shell correlations taken from angular power spectra. The crate is
//! the numerical core only: spectra, windows, and distributions come from
//! the caller.
//!
//! Key behaviors
//! -------------
//! - [`fields`]: banded spectrum store, spectrum transforms (discretization,
//!   lognormal mapping, bias), the sequential correlated field generator,
//!   rescaling of coefficient sets, and lognormal synthesis.
//! - [`sphere`]: harmonic coefficient sets, HEALPix RING geometry, pixel
//!   windows, and spherical harmonic transforms.
//! - [`shells`]: radial window functions and redshift partitioning.
//! - [`numerical_stability`]: tolerances and positive-semi-definite solves
//!   shared by the generator.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shells are generated strictly in order and only `ncorr` previous shells
//!   are kept, so memory does not grow with the number of shells.
//! - All fallible operations return typed errors (`FieldError`,
//!   `SphereError`, `ShellError`); library code never panics on bad input.
//!
//! Downstream usage
//! ----------------
//! - Typical flow: build a [`fields::BandedSpectra`], call
//!   [`fields::discretized_cls`] and [`fields::lognormal_gls`], then iterate
//!   [`fields::generate_alms`] and synthesize with
//!   [`fields::alm_to_lognormal`]. The `biased_lognormal` binary runs the
//!   full matter + biased tracer workflow.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each module; `tests/` runs the end-to-end bias
//!   recovery scenario at low resolution.

pub mod fields;
pub mod numerical_stability;
pub mod shells;
pub mod sphere;
