//! Frozen spectrum wrapper over a transform result.

use super::{fft_forward_real, fft_inverse_complex, fft_inverse_real};
use crate::error::{Error, Result};
use crate::vector::{ComplexVector, RealVector};
use num_complex::Complex64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Real,
    Complex,
}

/// An immutable transform result.
///
/// A real-origin spectrum presents its lower half (`n/2 + 1` bins) by
/// default, since the upper half is the conjugate mirror; the full range
/// can be toggled on. A complex-origin spectrum always presents all bins.
#[derive(Clone)]
pub struct Spectrum {
    bins: Vec<Complex64>,
    n: usize,
    origin: Origin,
    full: bool,
}

impl Spectrum {
    /// Forward real transform of `x`.
    pub fn from_real(x: &[f64]) -> Spectrum {
        Spectrum {
            bins: fft_forward_real(x),
            n: x.len(),
            origin: Origin::Real,
            full: false,
        }
    }

    /// Forward complex transform of `data`.
    pub fn from_complex(mut data: Vec<Complex64>) -> Spectrum {
        let n = data.len();
        super::fft_forward_complex(&mut data);
        Spectrum {
            bins: data,
            n,
            origin: Origin::Complex,
            full: true,
        }
    }

    /// Toggle between the lower-half and full-range presentation of a
    /// real-origin spectrum. No effect on a complex origin.
    pub fn with_full_range(mut self, full: bool) -> Spectrum {
        if self.origin == Origin::Real {
            self.full = full;
        }
        self
    }

    /// Length of the originating signal.
    pub fn signal_len(&self) -> usize {
        self.n
    }

    /// Number of presented bins.
    pub fn len(&self) -> usize {
        if self.n == 0 {
            0
        } else if self.origin == Origin::Real && !self.full {
            self.n / 2 + 1
        } else {
            self.n
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The presented bins as a complex vector.
    pub fn bins(&self) -> ComplexVector {
        ComplexVector::new(self.bins[..self.len()].to_vec())
    }

    pub fn magnitudes(&self) -> RealVector {
        self.bins[..self.len()].iter().map(|z| z.norm()).collect()
    }

    pub fn phases(&self) -> RealVector {
        self.bins[..self.len()].iter().map(|z| z.arg()).collect()
    }

    pub fn get(&self, i: usize) -> Result<Complex64> {
        if i >= self.len() {
            return Err(Error::out_of_range(i, self.len()));
        }
        Ok(self.bins[i])
    }

    /// Presented bins `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<ComplexVector> {
        if start > end || end > self.len() {
            return Err(Error::out_of_range(end, self.len()));
        }
        Ok(ComplexVector::new(self.bins[start..end].to_vec()))
    }

    /// Recovers the originating real signal.
    pub fn inverse_real(&self) -> Result<Vec<f64>> {
        if self.origin != Origin::Real {
            return Err(Error::invalid(
                "complex-origin spectrum has no real inverse",
            ));
        }
        Ok(fft_inverse_real(&self.bins, self.n))
    }

    /// Recovers the originating samples as complex values.
    pub fn inverse_complex(&self) -> Vec<Complex64> {
        let mut data = self.bins.clone();
        fft_inverse_complex(&mut data);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_origin_presents_the_lower_half() {
        let spec = Spectrum::from_real(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(spec.signal_len(), 4);
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.clone().with_full_range(true).len(), 4);
        assert!((spec.get(0).unwrap() - Complex64::new(10.0, 0.0)).norm() < 1e-12);
        assert!(spec.get(3).is_err());
    }

    #[test]
    fn magnitudes_and_phases_cover_the_presented_range() {
        let spec = Spectrum::from_real(&[1.0, 0.0, -1.0, 0.0]);
        assert_eq!(spec.magnitudes().len(), 3);
        assert_eq!(spec.phases().len(), 3);
    }

    #[test]
    fn real_inverse_recovers_the_signal() {
        let x = [0.5, -1.0, 2.25, 4.0, -3.5];
        let spec = Spectrum::from_real(&x);
        let back = spec.inverse_real().unwrap();
        for i in 0..x.len() {
            assert!((back[i] - x[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn complex_inverse_recovers_the_signal() {
        let x: Vec<Complex64> = (0..9)
            .map(|k| Complex64::new(k as f64, -(k as f64) * 0.5))
            .collect();
        let spec = Spectrum::from_complex(x.clone());
        assert_eq!(spec.len(), 9);
        assert!(spec.inverse_real().is_err());
        let back = spec.inverse_complex();
        for k in 0..9 {
            assert!((back[k] - x[k]).norm() < 1e-10);
        }
    }

    #[test]
    fn slicing_respects_the_presented_range() {
        let spec = Spectrum::from_real(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(spec.len(), 4);
        assert_eq!(spec.slice(1, 3).unwrap().len(), 2);
        assert!(spec.slice(2, 5).is_err());
    }
}
