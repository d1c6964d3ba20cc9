//! Sequential generator of correlated Gaussian harmonic coefficients.
//!
//! Purpose
//! -------
//! Draw one [`Alm`] per shell, in shell order, such that the joint
//! distribution of all shells matches a banded Gaussian spectrum collection.
//! Shell `i` is conditioned only on the `k = min(i, ncorr)` shells before it,
//! so memory and work per shell are independent of the total shell count.
//!
//! Key behaviors
//! -------------
//! - For each multipole `l` of shell `i`, assemble the `(k+1)×(k+1)`
//!   covariance block of shells `i, i−1, …, i−k`, solve it once with
//!   [`conditional_normal`], and reuse the weights for every `m ≤ l`.
//! - Set `a_i(l, m) = Σ_r w_r a_{i−r}(l, m) + ε` with `ε` real
//!   `N(0, σ²)` for `m = 0` and complex with independent `N(0, σ²/2)` parts
//!   for `m > 0`.
//! - Keep only the last `ncorr` coefficient sets; everything older is
//!   dropped as soon as a new shell is produced.
//! - Expose the sequence as a fused [`Iterator`] of `FieldResult<Alm>`; the
//!   first error ends the sequence.
//!
//! Invariants & assumptions
//! ------------------------
//! - The collection's `ncorr` and `lmax` must equal the generator options;
//!   mismatches fail at construction.
//! - Random draws happen in a fixed `(l, m)` order regardless of the
//!   variances, so a seeded RNG reproduces the sequence bit for bit.
//! - The monopole is left at zero unless `GeneratorOptions::monopole` is set.
//!
//! Conventions
//! -----------
//! - Single producer, single consumer, forward only: there is no way to
//!   rewind or revisit a shell. Dropping the generator releases its history.
//! - Pairs farther apart than `ncorr` are treated as uncorrelated; the band
//!   is never widened automatically.
use crate::{
    fields::{
        conditional::conditional_normal,
        errors::{FieldError, FieldResult},
        spectra::BandedSpectra,
    },
    sphere::alm::Alm,
};
use log::{debug, trace};
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::VecDeque;
use std::iter::FusedIterator;

/// GeneratorOptions — shape and monopole policy of a field generator.
///
/// Fields
/// ------
/// - `ncorr`: `usize`
///   Number of preceding shells each new shell is conditioned on. Must equal
///   the spectrum collection's band.
/// - `lmax`: `usize`
///   Band limit of the generated coefficient sets. Must equal the
///   collection's `lmax`.
/// - `monopole`: `bool`
///   Generate `l = 0` like any other multipole. Defaults to `false` in
///   [`GeneratorOptions::for_spectra`] (zero-mean fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub ncorr: usize,
    pub lmax: usize,
    pub monopole: bool,
}

impl GeneratorOptions {
    pub fn new(ncorr: usize, lmax: usize, monopole: bool) -> Self {
        GeneratorOptions { ncorr, lmax, monopole }
    }

    /// Options matching a collection's band and band limit, monopole off.
    pub fn for_spectra(gls: &BandedSpectra) -> Self {
        GeneratorOptions { ncorr: gls.ncorr(), lmax: gls.lmax(), monopole: false }
    }
}

/// CorrelatedFieldGenerator — lazy, forward-only sequence of shell `Alm`s.
///
/// Purpose
/// -------
/// Own the look-back window of the last `ncorr` coefficient sets and the
/// random number generator, and produce the next shell on demand.
///
/// Fields
/// ------
/// - `gls`: Gaussian spectra, borrowed for the lifetime of the generator.
/// - `options`: validated [`GeneratorOptions`].
/// - `rng`: caller-supplied random source.
/// - `next_shell`: index of the shell the next call produces.
/// - `history`: `(shell, alm)` pairs, newest first, at most `ncorr` long.
/// - `finished`: set after the first error so the iterator stays fused.
///
/// Performance
/// -----------
/// - Per shell: `lmax + 1` solves of size at most `ncorr × ncorr` and
///   `O(ncorr · lmax²)` coefficient updates.
/// - Memory: `O(ncorr · lmax²)` coefficients, independent of `nshells`.
#[derive(Debug)]
pub struct CorrelatedFieldGenerator<'a, R: Rng> {
    gls: &'a BandedSpectra,
    options: GeneratorOptions,
    rng: R,
    next_shell: usize,
    history: VecDeque<(usize, Alm)>,
    finished: bool,
}

impl<'a, R: Rng> CorrelatedFieldGenerator<'a, R> {
    /// Construct a generator over Gaussian spectra.
    ///
    /// Errors
    /// ------
    /// - `FieldError::NcorrMismatch` if `gls.ncorr() != options.ncorr`.
    /// - `FieldError::LmaxMismatch` if `gls.lmax() != options.lmax`.
    pub fn new(gls: &'a BandedSpectra, options: GeneratorOptions, rng: R) -> FieldResult<Self> {
        if gls.ncorr() != options.ncorr {
            return Err(FieldError::NcorrMismatch { expected: options.ncorr, actual: gls.ncorr() });
        }
        if gls.lmax() != options.lmax {
            return Err(FieldError::LmaxMismatch { expected: options.lmax, actual: gls.lmax() });
        }
        Ok(CorrelatedFieldGenerator {
            gls,
            options,
            rng,
            next_shell: 0,
            history: VecDeque::with_capacity(options.ncorr),
            finished: false,
        })
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Index of the shell the next call to `next` will produce.
    pub fn next_shell(&self) -> usize {
        self.next_shell
    }

    /// Shells whose coefficient sets are still held, newest first.
    pub fn retained_shells(&self) -> Vec<usize> {
        self.history.iter().map(|(shell, _)| *shell).collect()
    }

    fn draw_residual(&mut self, m: usize, variance: f64) -> Complex64 {
        if m == 0 {
            let x: f64 = self.rng.sample(StandardNormal);
            Complex64::new(variance.sqrt() * x, 0.0)
        } else {
            let half = (0.5 * variance).sqrt();
            let re: f64 = self.rng.sample(StandardNormal);
            let im: f64 = self.rng.sample(StandardNormal);
            Complex64::new(half * re, half * im)
        }
    }

    fn generate(&mut self, shell: usize) -> FieldResult<Alm> {
        let lmax = self.options.lmax;
        let k = shell.min(self.options.ncorr);
        let lmin = if self.options.monopole { 0 } else { 1 };
        let mut alm = Alm::zeros(lmax);
        let mut block = Array2::<f64>::zeros((k + 1, k + 1));

        for l in lmin..=lmax {
            for a in 0..=k {
                for b in 0..=k {
                    block[[a, b]] = self.gls.value(shell - a, shell - b, l);
                }
            }
            let cond = conditional_normal(block.view(), shell, l)?;
            if cond.clamped {
                trace!("shell {shell}, l = {l}: residual variance clamped to zero");
            }
            for m in 0..=l {
                let mean: Complex64 = cond
                    .weights
                    .iter()
                    .zip(self.history.iter())
                    .map(|(&w, (_, past))| past.get(l, m) * w)
                    .sum();
                let residual = self.draw_residual(m, cond.variance);
                alm.set(l, m, mean + residual);
            }
        }

        if self.options.ncorr > 0 {
            self.history.push_front((shell, alm.clone()));
            self.history.truncate(self.options.ncorr);
        }
        debug!("generated shell {shell} (lmax = {lmax}, retained = {})", self.history.len());
        Ok(alm)
    }
}

impl<R: Rng> Iterator for CorrelatedFieldGenerator<'_, R> {
    type Item = FieldResult<Alm>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.next_shell >= self.gls.nshells() {
            return None;
        }
        let shell = self.next_shell;
        match self.generate(shell) {
            Ok(alm) => {
                self.next_shell += 1;
                Some(Ok(alm))
            }
            Err(err) => {
                self.finished = true;
                self.history.clear();
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining =
            if self.finished { 0 } else { self.gls.nshells().saturating_sub(self.next_shell) };
        (0, Some(remaining))
    }
}

impl<R: Rng> FusedIterator for CorrelatedFieldGenerator<'_, R> {}

/// generate_alms — generator with default options for band `ncorr`.
///
/// Errors
/// ------
/// - `FieldError::NcorrMismatch` if `gls` was not built with band `ncorr`.
pub fn generate_alms<R: Rng>(
    gls: &BandedSpectra, ncorr: usize, rng: R,
) -> FieldResult<CorrelatedFieldGenerator<'_, R>> {
    CorrelatedFieldGenerator::new(gls, GeneratorOptions::new(ncorr, gls.lmax(), false), rng)
}
