//! Lazy numeric sequences and an arbitrary-length FFT engine.
//!
//! The crate has two independent subsystems:
//!
//! - [`seq`]: lazily-composable sequences over three element domains
//!   (`i32`, `f64`, `Complex64`) with algebraic combinators, analytic
//!   fast paths and vectorized storage paths.
//! - [`fft`]: a mixed-strategy FFT planner/executor handling any length
//!   through codelets, Cooley–Tukey decomposition, Rader's algorithm and
//!   Bluestein's chirp-z transform.
//!
//! The real-valued FFT of a sequence ([`RealSeq::fft`]) is the single
//! bridge between them.
//!
//! ```
//! use numseq::{RealSeq, Sequence};
//!
//! let total = RealSeq::range(1, 10).map(|x| x * x).sum();
//! assert_eq!(total, 385.0);
//!
//! let spectrum = RealSeq::grid(0.0, 63, 1.0).fft();
//! assert_eq!(spectrum.len(), 33);
//! ```

pub mod error;
pub mod fft;
pub mod random;
pub mod seq;
pub mod stats;
pub mod vector;

mod simd;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use fft::{
    fft_forward_complex, fft_forward_real, fft_inverse_complex, fft_inverse_real, plan_for,
    FftPlan, Spectrum,
};
pub use random::{DefaultRandom, GaussianSource, NormalSource, RandomSource};
pub use seq::{ComplexSeq, IntSeq, RealSeq, Sequence};
pub use stats::Accumulator;
pub use vector::{ComplexVector, IntVector, RealVector};
