//! Fast Fourier Transform engine for arbitrary lengths.
//!
//! A mixed-strategy planner factors the problem size into codelets,
//! Cooley–Tukey stages, Rader and Bluestein leaves; the executor walks the
//! resulting instruction list. Plans are cached per size and shared.

mod codelets;
mod exec;
mod plan;
mod spectrum;
mod transpose;

pub use plan::FftPlan;
pub use spectrum::Spectrum;

use lazy_static::lazy_static;
use num_complex::Complex64;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// Largest codelet size; composites below this transform directly.
pub(crate) const MAX_RADIX: usize = 6;

/// Primes at or under this take the Rader path, larger ones Bluestein.
pub(crate) const RADER_THRESHOLD: usize = 19;

/// Sizes above this emit child blocks with `ParallelCall` dispatch
/// instead of inlined sub-plans.
pub(crate) const RECURSIVE_THRESHOLD: usize = 1024;

/// Incremental twiddle recurrences are refreshed from the closed form
/// every this many iterations to bound drift.
pub(crate) const UPDATE_TW: usize = 16;

lazy_static! {
    static ref PLAN_CACHE: Mutex<HashMap<usize, Arc<FftPlan>>> = Mutex::new(HashMap::new());
}

/// Returns the cached plan for size `n`, building it on first use.
pub fn plan_for(n: usize) -> Arc<FftPlan> {
    {
        let cache = PLAN_CACHE.lock();
        if let Some(plan) = cache.get(&n) {
            return plan.clone();
        }
    }

    let plan = Arc::new(FftPlan::build(n));

    let mut cache = PLAN_CACHE.lock();
    cache.insert(n, plan.clone());
    plan
}

/// In-place forward transform of a complex array.
pub fn fft_forward_complex(a: &mut [Complex64]) {
    if a.len() <= 1 {
        return;
    }
    plan_for(a.len()).execute(a);
}

/// In-place inverse transform: conjugate, forward, conjugate, scale.
pub fn fft_inverse_complex(a: &mut [Complex64]) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    for x in a.iter_mut() {
        *x = x.conj();
    }
    plan_for(n).execute(a);
    let scale = 1.0 / n as f64;
    for x in a.iter_mut() {
        *x = x.conj() * scale;
    }
}

/// Forward transform of real input, returning the full `n`-bin spectrum.
///
/// Even lengths run a half-size complex transform on the samples
/// reinterpreted as interleaved pairs, then combine with the standard
/// post-twiddle; odd lengths pad to complex.
pub fn fft_forward_real(x: &[f64]) -> Vec<Complex64> {
    let n = x.len();
    match n {
        0 => Vec::new(),
        1 => vec![Complex64::new(x[0], 0.0)],
        2 => vec![
            Complex64::new(x[0] + x[1], 0.0),
            Complex64::new(x[0] - x[1], 0.0),
        ],
        _ if n % 2 == 0 => {
            let h = n / 2;
            let mut z: Vec<Complex64> = (0..h)
                .map(|j| Complex64::new(x[2 * j], x[2 * j + 1]))
                .collect();
            fft_forward_complex(&mut z);

            let mut out = vec![Complex64::default(); n];
            for k in 0..h {
                let zk = z[k];
                let zm = z[(h - k) % h].conj();
                let even = (zk + zm) * 0.5;
                let odd = (zk - zm) * Complex64::new(0.0, -0.5);
                let tw = Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64);
                out[k] = even + tw * odd;
            }
            // Nyquist bin and the conjugate-symmetric upper half.
            out[h] = Complex64::new(z[0].re - z[0].im, 0.0);
            for k in 1..h {
                out[n - k] = out[k].conj();
            }
            out
        }
        _ => {
            let mut z: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
            fft_forward_complex(&mut z);
            z
        }
    }
}

/// Inverse of [`fft_forward_real`], reduced to a real Hartley transform:
/// from `h[k] = X[k].re − X[k].im` the samples are recovered as
/// `x[i] = (F(h)[i].re − F(h)[i].im) / n`.
///
/// `spec` may be the full `n`-bin spectrum or its lower half
/// (`n/2 + 1` bins) with the rest implied by conjugate symmetry.
pub fn fft_inverse_real(spec: &[Complex64], n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![spec[0].re];
    }
    assert!(
        spec.len() == n || spec.len() == n / 2 + 1,
        "spectrum length {} does not match a length-{} signal",
        spec.len(),
        n
    );

    let bin = |k: usize| -> Complex64 {
        if k < spec.len() {
            spec[k]
        } else {
            spec[n - k].conj()
        }
    };

    let h: Vec<f64> = (0..n).map(|k| bin(k).re - bin(k).im).collect();
    let f = fft_forward_real(&h);
    let scale = 1.0 / n as f64;
    (0..n).map(|i| (f[i].re - f[i].im) * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn real_forward_of_a_ramp() {
        let spec = fft_forward_real(&[1.0, 2.0, 3.0, 4.0]);
        let expect = [c(10.0, 0.0), c(-2.0, 2.0), c(-2.0, 0.0), c(-2.0, -2.0)];
        for (got, want) in spec.iter().zip(&expect) {
            assert!((got - want).norm() < 1e-12, "{} vs {}", got, want);
        }
    }

    #[test]
    fn tiny_real_cases() {
        assert_eq!(fft_forward_real(&[]), Vec::new());
        assert_eq!(fft_forward_real(&[5.0]), vec![c(5.0, 0.0)]);
        assert_eq!(fft_forward_real(&[3.0, 1.0]), vec![c(4.0, 0.0), c(2.0, 0.0)]);
        assert_eq!(fft_inverse_real(&[c(5.0, 0.0)], 1), vec![5.0]);
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i * 13 + 5) % 17) as f64 - 8.0).collect()
    }

    #[test]
    fn real_roundtrip_even_odd_prime() {
        for n in [2usize, 3, 4, 7, 10, 16, 23, 36, 100, 101, 360] {
            let x = ramp(n);
            let spec = fft_forward_real(&x);
            let back = fft_inverse_real(&spec, n);
            for i in 0..n {
                assert!(
                    (back[i] - x[i]).abs() < 1e-9,
                    "n={} sample {}: {} vs {}",
                    n,
                    i,
                    back[i],
                    x[i]
                );
            }
        }
    }

    #[test]
    fn real_roundtrip_from_half_spectrum() {
        let n = 24;
        let x = ramp(n);
        let spec = fft_forward_real(&x);
        let back = fft_inverse_real(&spec[..n / 2 + 1], n);
        for i in 0..n {
            assert!((back[i] - x[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn complex_roundtrip() {
        for n in [1usize, 2, 5, 12, 17, 23, 60] {
            let x: Vec<Complex64> = (0..n)
                .map(|k| c((k % 5) as f64 - 2.0, (k % 3) as f64))
                .collect();
            let mut a = x.clone();
            fft_forward_complex(&mut a);
            fft_inverse_complex(&mut a);
            for k in 0..n {
                assert!((a[k] - x[k]).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn linearity() {
        let n = 30;
        let x = ramp(n);
        let y: Vec<f64> = x.iter().map(|v| v * 0.5 + 1.0).collect();
        let (alpha, beta) = (2.5, -1.25);

        let mixed: Vec<f64> = (0..n).map(|i| alpha * x[i] + beta * y[i]).collect();
        let fx = fft_forward_real(&x);
        let fy = fft_forward_real(&y);
        let fm = fft_forward_real(&mixed);
        for k in 0..n {
            let combo = fx[k] * alpha + fy[k] * beta;
            assert!((fm[k] - combo).norm() < 1e-9);
        }
    }

    #[test]
    fn parseval() {
        let n = 48;
        let x = ramp(n);
        let spec = fft_forward_real(&x);
        let time: f64 = x.iter().map(|v| v * v).sum();
        let freq: f64 = spec.iter().map(|z| z.norm_sqr()).sum::<f64>() / n as f64;
        assert!((time - freq).abs() < 1e-8);
    }

    #[test]
    fn plans_are_cached_and_shared() {
        let a = plan_for(48);
        let b = plan_for(48);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
