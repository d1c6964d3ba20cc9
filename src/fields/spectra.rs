//! Banded storage of angular power spectra between pairs of shells.
//!
//! Purpose
//! -------
//! Hold the angular power spectra `C_l(i, j)` for every pair of shells
//! within a fixed index distance `ncorr`, in a flat triangular order, and
//! answer symmetric lookups with implicit zeros outside the band.
//!
//! Key behaviors
//! -------------
//! - Store one entry per pair `(i, j)` with `0 ≤ i − j ≤ ncorr`, enumerated
//!   as `(0,0), (1,1), (1,0), (2,2), (2,1), (2,0), …` truncated to the band.
//! - [`BandedSpectra::get`] swaps arguments when `i < j` and returns an
//!   all-zero spectrum of length `lmax + 1` for pairs outside the band.
//! - [`BandedSpectra::from_full`] accepts the full triangular collection over
//!   all pairs (the shape of a persisted spectrum archive) and keeps only the
//!   band.
//!
//! Invariants & assumptions
//! ------------------------
//! - `get(i, j) == get(j, i)` for all valid shells.
//! - `get(i, j)` is all-zero whenever `|i − j| > ncorr`.
//! - Stored entries may be ragged (shorter than `lmax + 1`); missing
//!   multipoles read as zero. Entries never exceed `lmax + 1` values.
//! - Memory is `O(nshells · ncorr · lmax)`; there is no dense
//!   `nshells × nshells` matrix anywhere.
//!
//! Conventions
//! -----------
//! - Truncating a physical spectrum to `ncorr` is an approximation: pairs
//!   farther apart than `ncorr` are treated as uncorrelated without any
//!   signal that information was dropped.
use crate::fields::errors::{FieldError, FieldResult};
use ndarray::{Array1, ArrayView1, CowArray, Ix1};

/// BandedSpectra — per-shell-pair spectra within a correlation band.
///
/// Fields
/// ------
/// - `nshells`: number of shells.
/// - `ncorr`: largest stored index distance `i − j`.
/// - `lmax`: shared band limit; every lookup returns `lmax + 1` values.
/// - `entries`: flat triangular storage, see module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedSpectra {
    nshells: usize,
    ncorr: usize,
    lmax: usize,
    entries: Vec<Array1<f64>>,
}

impl BandedSpectra {
    /// Number of entries stored for `nshells` shells and band `ncorr`.
    pub fn entry_count(nshells: usize, ncorr: usize) -> usize {
        Self::offset(ncorr, nshells)
    }

    /// Flat index of the first entry of shell `i`.
    fn offset(ncorr: usize, i: usize) -> usize {
        if i <= ncorr + 1 {
            i * (i + 1) / 2
        } else {
            (ncorr + 1) * (ncorr + 2) / 2 + (i - ncorr - 1) * (ncorr + 1)
        }
    }

    /// Construct a collection from entries already in banded order.
    ///
    /// Parameters
    /// ----------
    /// - `nshells`, `ncorr`, `lmax`: shape of the collection.
    /// - `entries`: `Vec<Array1<f64>>`
    ///   One spectrum per pair, for each shell `i` the pairs
    ///   `j = i, i−1, …, max(0, i − ncorr)`. Empty entries are allowed and
    ///   read as zero.
    ///
    /// Errors
    /// ------
    /// - `FieldError::EntryCountMismatch` if the number of entries is wrong.
    /// - `FieldError::SpectrumLengthMismatch` if an entry has more than
    ///   `lmax + 1` values.
    /// - `FieldError::NonFiniteSpectrum` if any value is NaN/±inf.
    pub fn new(
        nshells: usize, ncorr: usize, lmax: usize, entries: Vec<Array1<f64>>,
    ) -> FieldResult<Self> {
        let expected = Self::entry_count(nshells, ncorr);
        if entries.len() != expected {
            return Err(FieldError::EntryCountMismatch { expected, actual: entries.len() });
        }
        let spectra = BandedSpectra { nshells, ncorr, lmax, entries };
        for (i, j, cl) in spectra.iter() {
            if cl.len() > lmax + 1 {
                return Err(FieldError::SpectrumLengthMismatch {
                    expected: lmax + 1,
                    actual: cl.len(),
                });
            }
            if let Some((l, &value)) = cl.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(FieldError::NonFiniteSpectrum { i, j, l, value });
            }
        }
        Ok(spectra)
    }

    /// Construct a collection by evaluating `cl(i, j)` for every pair in the
    /// band, in banded order.
    pub fn from_fn<F>(nshells: usize, ncorr: usize, lmax: usize, mut cl: F) -> FieldResult<Self>
    where
        F: FnMut(usize, usize) -> Array1<f64>,
    {
        let entries = Self::pairs(nshells, ncorr).map(|(i, j)| cl(i, j)).collect();
        Self::new(nshells, ncorr, lmax, entries)
    }

    /// Construct a banded collection from the full triangular collection.
    ///
    /// `entries` holds all `nshells (nshells + 1) / 2` pairs in the order
    /// `(0,0), (1,1), (1,0), (2,2), …`. Pairs with `i − j > ncorr` are
    /// dropped and every entry is truncated to `lmax + 1` values.
    ///
    /// Errors
    /// ------
    /// - `FieldError::EntryCountMismatch` if `entries` is not triangular in
    ///   `nshells`.
    pub fn from_full(
        nshells: usize, ncorr: usize, lmax: usize, entries: Vec<Array1<f64>>,
    ) -> FieldResult<Self> {
        let expected = nshells * (nshells + 1) / 2;
        if entries.len() != expected {
            return Err(FieldError::EntryCountMismatch { expected, actual: entries.len() });
        }
        let mut full = entries.into_iter();
        let mut banded = Vec::with_capacity(Self::entry_count(nshells, ncorr));
        for i in 0..nshells {
            for lag in 0..=i {
                let Some(cl) = full.next() else { break };
                if lag <= ncorr {
                    let n = cl.len().min(lmax + 1);
                    banded.push(cl.slice_move(ndarray::s![..n]));
                }
            }
        }
        Self::new(nshells, ncorr, lmax, banded)
    }

    /// Pairs `(i, j)` of the band in storage order.
    pub fn pairs(nshells: usize, ncorr: usize) -> impl Iterator<Item = (usize, usize)> {
        (0..nshells).flat_map(move |i| (i.saturating_sub(ncorr)..=i).rev().map(move |j| (i, j)))
    }

    pub fn nshells(&self) -> usize {
        self.nshells
    }

    pub fn ncorr(&self) -> usize {
        self.ncorr
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Iterate stored entries as `(i, j, cl)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, ArrayView1<'_, f64>)> {
        Self::pairs(self.nshells, self.ncorr)
            .zip(self.entries.iter())
            .map(|((i, j), cl)| (i, j, cl.view()))
    }

    fn check_shell(&self, shell: usize) -> FieldResult<()> {
        if shell >= self.nshells {
            return Err(FieldError::ShellOutOfRange { shell, nshells: self.nshells });
        }
        Ok(())
    }

    /// Storage slot for `(i, j)` with `i ≥ j`, or `None` outside the band.
    fn slot(&self, i: usize, j: usize) -> Option<usize> {
        let (i, j) = if i >= j { (i, j) } else { (j, i) };
        let lag = i - j;
        (lag <= self.ncorr).then(|| Self::offset(self.ncorr, i) + lag)
    }

    /// Spectrum for the shell pair `(i, j)`, zero-padded to `lmax + 1`.
    ///
    /// Returns a borrowed view when the stored entry already has full length
    /// and an owned zero-padded array otherwise (including pairs outside the
    /// band).
    ///
    /// Errors
    /// ------
    /// - `FieldError::ShellOutOfRange` if `i` or `j` is not a valid shell.
    pub fn get(&self, i: usize, j: usize) -> FieldResult<CowArray<'_, f64, Ix1>> {
        self.check_shell(i)?;
        self.check_shell(j)?;
        let n = self.lmax + 1;
        match self.slot(i, j).map(|slot| &self.entries[slot]) {
            Some(cl) if cl.len() == n => Ok(CowArray::from(cl.view())),
            Some(cl) => {
                let mut padded = Array1::zeros(n);
                padded.slice_mut(ndarray::s![..cl.len()]).assign(cl);
                Ok(CowArray::from(padded))
            }
            None => Ok(CowArray::from(Array1::zeros(n))),
        }
    }

    /// Single multipole of `get(i, j)`, without allocating.
    ///
    /// Errors
    /// ------
    /// - `FieldError::ShellOutOfRange` for invalid shells.
    /// - `FieldError::LmaxMismatch` if `l > lmax`.
    pub fn get_at(&self, i: usize, j: usize, l: usize) -> FieldResult<f64> {
        self.check_shell(i)?;
        self.check_shell(j)?;
        if l > self.lmax {
            return Err(FieldError::LmaxMismatch { expected: self.lmax, actual: l });
        }
        Ok(self.value(i, j, l))
    }

    /// Unchecked single-multipole lookup; indices must be valid.
    #[inline]
    pub(crate) fn value(&self, i: usize, j: usize, l: usize) -> f64 {
        self.slot(i, j).and_then(|slot| self.entries[slot].get(l).copied()).unwrap_or(0.0)
    }

    /// Copy of this collection restricted (or widened) to band `ncorr`.
    ///
    /// Widening adds empty entries, which read as zero; no correlation is
    /// invented.
    pub fn truncated(&self, ncorr: usize) -> BandedSpectra {
        let entries = Self::pairs(self.nshells, ncorr)
            .map(|(i, j)| match self.slot(i, j) {
                Some(slot) => self.entries[slot].clone(),
                None => Array1::zeros(0),
            })
            .collect();
        BandedSpectra { nshells: self.nshells, ncorr, lmax: self.lmax, entries }
    }

    /// Build a new collection of the same shape by transforming every entry.
    pub(crate) fn try_map<F>(&self, lmax: usize, mut f: F) -> FieldResult<BandedSpectra>
    where
        F: FnMut(usize, usize, ArrayView1<f64>) -> FieldResult<Array1<f64>>,
    {
        let entries =
            self.iter().map(|(i, j, cl)| f(i, j, cl)).collect::<FieldResult<Vec<_>>>()?;
        BandedSpectra::new(self.nshells, self.ncorr, lmax, entries)
    }
}
