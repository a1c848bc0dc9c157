use crate::error::{Error, Result};
use crate::simd;
use crate::vector::RealVector;
use num_complex::Complex64;
use std::ops::Index;

/// Contiguous `Complex64` storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplexVector {
    data: Vec<Complex64>,
}

impl ComplexVector {
    pub fn new(data: Vec<Complex64>) -> Self {
        Self { data }
    }

    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![Complex64::default(); n],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Complex64> {
        self.data.iter()
    }

    pub fn get(&self, i: usize) -> Result<Complex64> {
        self.data
            .get(i)
            .copied()
            .ok_or_else(|| Error::out_of_range(i, self.data.len()))
    }

    pub fn slice(&self, start: usize, end: usize) -> Result<ComplexVector> {
        if start > end || end > self.data.len() {
            return Err(Error::out_of_range(end, self.data.len()));
        }
        Ok(ComplexVector::new(self.data[start..end].to_vec()))
    }

    pub fn into_vec(self) -> Vec<Complex64> {
        self.data
    }

    //
    // Derived real views.
    //

    pub fn magnitudes(&self) -> RealVector {
        self.data.iter().map(|z| z.norm()).collect()
    }

    pub fn phases(&self) -> RealVector {
        self.data.iter().map(|z| z.arg()).collect()
    }

    //
    // Reductions.
    //

    pub fn sum(&self) -> Complex64 {
        self.data.iter().sum()
    }

    pub fn product(&self) -> Complex64 {
        self.data.iter().product()
    }

    /// Hermitian dot product `Σ xᵢ·conj(yᵢ)`.
    pub fn dot(&self, other: &ComplexVector) -> Complex64 {
        assert_eq!(self.len(), other.len(), "dot of unequal vectors");
        self.data
            .iter()
            .zip(&other.data)
            .map(|(x, y)| x * y.conj())
            .sum()
    }

    //
    // Element-wise operations.
    //

    pub fn add(&self, other: &ComplexVector) -> ComplexVector {
        assert_eq!(self.len(), other.len());
        ComplexVector::new(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(x, y)| x + y)
                .collect(),
        )
    }

    pub fn sub(&self, other: &ComplexVector) -> ComplexVector {
        assert_eq!(self.len(), other.len());
        ComplexVector::new(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(x, y)| x - y)
                .collect(),
        )
    }

    pub fn mul(&self, other: &ComplexVector) -> ComplexVector {
        assert_eq!(self.len(), other.len());
        let mut out = vec![Complex64::default(); self.len()];
        simd::mul_complex(&self.data, &other.data, &mut out);
        ComplexVector::new(out)
    }

    pub fn div(&self, other: &ComplexVector) -> ComplexVector {
        assert_eq!(self.len(), other.len());
        ComplexVector::new(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(x, y)| x / y)
                .collect(),
        )
    }

    pub fn add_scalar(&self, s: Complex64) -> ComplexVector {
        ComplexVector::new(self.data.iter().map(|x| x + s).collect())
    }

    pub fn scale(&self, s: Complex64) -> ComplexVector {
        ComplexVector::new(self.data.iter().map(|x| x * s).collect())
    }

    pub fn negate(&self) -> ComplexVector {
        ComplexVector::new(self.data.iter().map(|x| -x).collect())
    }

    pub fn conj(&self) -> ComplexVector {
        ComplexVector::new(self.data.iter().map(|x| x.conj()).collect())
    }

    pub fn contains(&self, v: Complex64) -> bool {
        self.data.iter().any(|&x| x == v)
    }

    pub fn index_of(&self, v: Complex64) -> Option<usize> {
        self.data.iter().position(|&x| x == v)
    }
}

impl From<Vec<Complex64>> for ComplexVector {
    fn from(data: Vec<Complex64>) -> Self {
        Self::new(data)
    }
}

impl FromIterator<Complex64> for ComplexVector {
    fn from_iter<I: IntoIterator<Item = Complex64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Index<usize> for ComplexVector {
    type Output = Complex64;

    fn index(&self, i: usize) -> &Complex64 {
        &self.data[i]
    }
}
