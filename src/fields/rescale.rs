//! Rescaling of a coefficient set from one spectrum to another.
//!
//! Lets two fields share random phases while having different amplitudes,
//! e.g. matter and a biased tracer drawn from a single generator run:
//!
//! ```text
//! a'_lm = a_lm · sqrt(C_target(l) / C_source(l))      for C_source(l) > 0
//! a'_lm = 0                                           for C_source(l) = 0
//! ```
//!
//! The auto spectrum of the rescaled field follows `C_target` exactly in
//! expectation. Cross spectra between fields rescaled this way are the
//! geometric mean of the two autos, so the construction overstates
//! cross-correlations whenever the target spectra are not perfectly
//! correlated. That is a modeling approximation of the shared-phase method.
use crate::{
    fields::errors::{FieldError, FieldResult},
    sphere::alm::Alm,
};
use ndarray::{Array1, ArrayView1};

/// rescaled_alm — filter `alm` by `sqrt(target / source)` per multipole.
///
/// Parameters
/// ----------
/// - `alm`: `&Alm`
///   Coefficients drawn under `source`.
/// - `target`, `source`: `ArrayView1<f64>`
///   Spectra of length `alm.lmax() + 1`.
///
/// Returns
/// -------
/// `FieldResult<Alm>`
///   New coefficient set; multipoles with a zero (or negative) source
///   spectrum are set to zero.
///
/// Errors
/// ------
/// - `FieldError::SpectrumLengthMismatch` if either spectrum has the wrong
///   length.
/// - `FieldError::NegativeTargetSpectrum` if `target[l] < 0` where
///   `source[l] > 0`.
pub fn rescaled_alm(
    alm: &Alm, target: ArrayView1<f64>, source: ArrayView1<f64>,
) -> FieldResult<Alm> {
    let expected = alm.lmax() + 1;
    for actual in [target.len(), source.len()] {
        if actual != expected {
            return Err(FieldError::SpectrumLengthMismatch { expected, actual });
        }
    }

    let mut factor = Array1::<f64>::zeros(expected);
    for (l, ((f, &t), &s)) in factor.iter_mut().zip(target.iter()).zip(source.iter()).enumerate()
    {
        if s > 0.0 {
            if t < 0.0 {
                return Err(FieldError::NegativeTargetSpectrum { l, value: t });
            }
            *f = (t / s).sqrt();
        }
    }
    Ok(alm.scaled_by_l(factor.view())?)
}
