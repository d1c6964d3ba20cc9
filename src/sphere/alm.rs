//! Harmonic coefficient sets for real fields on the sphere.
//!
//! Purpose
//! -------
//! Store the spherical-harmonic coefficients `a_lm` of one real scalar field
//! up to a band limit `lmax`, and provide the per-`l` operations the field
//! pipeline needs (realized power spectra, per-`l` filtering).
//!
//! Conventions
//! -----------
//! - Only `m ≥ 0` is stored; `a_{l,-m} = (-1)^m conj(a_lm)` is implied by the
//!   field being real.
//! - Storage is m-major: `index(l, m) = m (2 lmax + 1 − m) / 2 + l`, so all
//!   `l` for a fixed `m` are contiguous.
//! - `a_l0` is real for a real field; the imaginary part is carried but
//!   ignored by synthesis.
use crate::sphere::errors::{SphereError, SphereResult};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;

/// Alm — complex harmonic coefficients `a_lm`, `0 ≤ m ≤ l ≤ lmax`.
///
/// Purpose
/// -------
/// Own one shell's coefficient set between generation and consumption by
/// synthesis or rescaling.
///
/// Fields
/// ------
/// - `lmax`: `usize`
///   Band limit.
/// - `coeffs`: `Array1<Complex64>`
///   Length `(lmax+1)(lmax+2)/2`, m-major.
///
/// Invariants
/// ----------
/// - `coeffs.len() == Alm::size(lmax)` for every constructed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Alm {
    lmax: usize,
    coeffs: Array1<Complex64>,
}

impl Alm {
    /// Number of stored coefficients for band limit `lmax`.
    pub fn size(lmax: usize) -> usize {
        (lmax + 1) * (lmax + 2) / 2
    }

    /// Flat index of `(l, m)` in m-major order. Requires `m ≤ l ≤ lmax`.
    #[inline]
    pub fn index_of(lmax: usize, l: usize, m: usize) -> usize {
        m * (2 * lmax + 1 - m) / 2 + l
    }

    /// All-zero coefficient set.
    pub fn zeros(lmax: usize) -> Self {
        Alm { lmax, coeffs: Array1::zeros(Alm::size(lmax)) }
    }

    /// Wrap an existing coefficient array, validating its length.
    ///
    /// Errors
    /// ------
    /// - `SphereError::AlmSizeMismatch` if `coeffs.len() != Alm::size(lmax)`.
    pub fn from_coeffs(lmax: usize, coeffs: Array1<Complex64>) -> SphereResult<Self> {
        let expected = Alm::size(lmax);
        if coeffs.len() != expected {
            return Err(SphereError::AlmSizeMismatch { expected, actual: coeffs.len() });
        }
        Ok(Alm { lmax, coeffs })
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn coeffs(&self) -> ArrayView1<'_, Complex64> {
        self.coeffs.view()
    }

    #[inline]
    pub fn get(&self, l: usize, m: usize) -> Complex64 {
        self.coeffs[Alm::index_of(self.lmax, l, m)]
    }

    #[inline]
    pub fn set(&mut self, l: usize, m: usize, value: Complex64) {
        self.coeffs[Alm::index_of(self.lmax, l, m)] = value;
    }

    /// Realized auto spectrum `C_l = (|a_l0|² + 2 Σ_{m>0} |a_lm|²) / (2l+1)`.
    pub fn to_cl(&self) -> Array1<f64> {
        let mut cl = Array1::<f64>::zeros(self.lmax + 1);
        for m in 0..=self.lmax {
            let weight = if m == 0 { 1.0 } else { 2.0 };
            for l in m..=self.lmax {
                cl[l] += weight * self.get(l, m).norm_sqr();
            }
        }
        for (l, c) in cl.iter_mut().enumerate() {
            *c /= (2 * l + 1) as f64;
        }
        cl
    }

    /// Realized cross spectrum `C_l = Re(a_l0 b*_l0 + 2 Σ_{m>0} a_lm b*_lm) / (2l+1)`.
    ///
    /// Errors
    /// ------
    /// - `SphereError::LmaxMismatch` if the two sets have different `lmax`.
    pub fn cross_cl(&self, other: &Alm) -> SphereResult<Array1<f64>> {
        if other.lmax != self.lmax {
            return Err(SphereError::LmaxMismatch { expected: self.lmax, actual: other.lmax });
        }
        let mut cl = Array1::<f64>::zeros(self.lmax + 1);
        for m in 0..=self.lmax {
            let weight = if m == 0 { 1.0 } else { 2.0 };
            for l in m..=self.lmax {
                cl[l] += weight * (self.get(l, m) * other.get(l, m).conj()).re;
            }
        }
        for (l, c) in cl.iter_mut().enumerate() {
            *c /= (2 * l + 1) as f64;
        }
        Ok(cl)
    }

    /// Multiply every `a_lm` by the real factor `fl[l]`.
    ///
    /// Errors
    /// ------
    /// - `SphereError::LmaxMismatch` if `fl.len() != lmax + 1`.
    pub fn scaled_by_l(&self, fl: ArrayView1<f64>) -> SphereResult<Alm> {
        if fl.len() != self.lmax + 1 {
            return Err(SphereError::LmaxMismatch {
                expected: self.lmax,
                actual: fl.len().saturating_sub(1),
            });
        }
        let mut out = self.clone();
        for m in 0..=self.lmax {
            for l in m..=self.lmax {
                let idx = Alm::index_of(self.lmax, l, m);
                out.coeffs[idx] *= fl[l];
            }
        }
        Ok(out)
    }

    /// In-place `self += other`, used by iterative map analysis.
    pub(crate) fn add_assign(&mut self, other: &Alm) {
        self.coeffs += &other.coeffs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - m-major indexing and size bookkeeping.
    // - Realized auto/cross spectra and per-`l` scaling.
    //
    // They intentionally DO NOT cover:
    // - Synthesis to pixels; see `sphere::harmonic`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The m-major index enumerates every (l, m) exactly once in order.
    fn index_of_enumerates_every_mode_once() {
        // Arrange
        let lmax = 5;
        let mut expected = 0;

        // Act & Assert
        for m in 0..=lmax {
            for l in m..=lmax {
                assert_eq!(Alm::index_of(lmax, l, m), expected);
                expected += 1;
            }
        }
        assert_eq!(expected, Alm::size(lmax));
    }

    #[test]
    // Purpose
    // -------
    // `from_coeffs` rejects arrays whose length does not match `lmax`.
    fn from_coeffs_rejects_wrong_length() {
        // Act & Assert
        let err = Alm::from_coeffs(2, Array1::zeros(5)).unwrap_err();
        assert_eq!(err, SphereError::AlmSizeMismatch { expected: 6, actual: 5 });
    }

    #[test]
    // Purpose
    // -------
    // Check the m > 0 double counting in `to_cl`.
    //
    // Given
    // -----
    // - lmax = 1 with a_00 = 2, a_10 = 1, a_11 = 1 + i.
    //
    // Expect
    // ------
    // - C_0 = 4, C_1 = (1 + 2·2)/3 = 5/3.
    fn to_cl_weights_positive_m_twice() {
        // Arrange
        let mut alm = Alm::zeros(1);
        alm.set(0, 0, Complex64::new(2.0, 0.0));
        alm.set(1, 0, Complex64::new(1.0, 0.0));
        alm.set(1, 1, Complex64::new(1.0, 1.0));

        // Act
        let cl = alm.to_cl();

        // Assert
        assert_relative_eq!(cl[0], 4.0);
        assert_relative_eq!(cl[1], 5.0 / 3.0);
    }

    #[test]
    // Purpose
    // -------
    // The cross spectrum of a set with itself equals its auto spectrum.
    fn cross_cl_with_self_equals_auto() {
        // Arrange
        let mut alm = Alm::zeros(2);
        alm.set(1, 0, Complex64::new(0.3, 0.0));
        alm.set(2, 1, Complex64::new(-0.2, 0.7));
        alm.set(2, 2, Complex64::new(0.5, -0.1));

        // Act
        let auto = alm.to_cl();
        let cross = alm.cross_cl(&alm).expect("same lmax");

        // Assert
        for l in 0..=2 {
            assert_relative_eq!(auto[l], cross[l], epsilon = 1e-14);
        }
    }

    #[test]
    // Purpose
    // -------
    // `scaled_by_l` multiplies each multipole by its own factor and rejects
    // filters of the wrong length.
    fn scaled_by_l_applies_per_multipole_factor() {
        // Arrange
        let mut alm = Alm::zeros(1);
        alm.set(0, 0, Complex64::new(1.0, 0.0));
        alm.set(1, 1, Complex64::new(1.0, -1.0));

        // Act
        let out = alm.scaled_by_l(array![2.0, 3.0].view()).expect("matching lmax");

        // Assert
        assert_eq!(out.get(0, 0), Complex64::new(2.0, 0.0));
        assert_eq!(out.get(1, 1), Complex64::new(3.0, -3.0));
        assert!(alm.scaled_by_l(array![1.0].view()).is_err());
    }
}
