//! Hand-unrolled small-radix DFT kernels (sizes 2–6) and the integrated
//! codelet that fuses a small FFT with its twiddle pre-multiplication.

use super::{MAX_RADIX, UPDATE_TW};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Computes sin(pi * a / b).
#[inline(always)]
fn sab(a: f64, b: f64) -> f64 {
    (PI * a / b).sin()
}

/// Computes cos(pi * a / b).
#[inline(always)]
fn cab(a: f64, b: f64) -> f64 {
    (PI * a / b).cos()
}

/// Returns the imaginary-unit complex constant.
#[inline(always)]
fn i_c() -> Complex64 {
    Complex64::new(0.0, 1.0)
}

/// In-place forward DFT of one contiguous block of `size ≤ 6` samples.
#[inline]
pub(crate) fn forward(size: usize, a: &mut [Complex64]) {
    match size {
        0 | 1 => {}
        2 => c2(a),
        3 => c3(a),
        4 => c4(a),
        5 => c5(a),
        6 => c6(a),
        _ => unreachable!("codelet size out of range"),
    }
}

#[inline(always)]
fn c2(a: &mut [Complex64]) {
    let (x0, x1) = (a[0], a[1]);
    a[0] = x0 + x1;
    a[1] = x0 - x1;
}

#[inline(always)]
fn c3(a: &mut [Complex64]) {
    let (x0, x1, x2) = (a[0], a[1], a[2]);
    let t0 = (x1 - x2) * sab(1.0, 3.0) * i_c();
    let u0 = x1 + x2;
    let u1 = x0 - u0 * 0.5;
    a[0] = x0 + u0;
    a[1] = u1 - t0;
    a[2] = u1 + t0;
}

#[inline(always)]
fn c4(a: &mut [Complex64]) {
    let (x0, x1, x2, x3) = (a[0], a[1], a[2], a[3]);
    let t0 = x0 + x2;
    let t1 = x3 + x1;
    let u0 = x0 - x2;
    let u1 = (x3 - x1) * i_c();
    a[0] = t0 + t1;
    a[1] = u0 + u1;
    a[2] = t0 - t1;
    a[3] = u0 - u1;
}

#[inline(always)]
fn c5(a: &mut [Complex64]) {
    let (x0, x1, x2, x3, x4) = (a[0], a[1], a[2], a[3], a[4]);
    let qa = 0.25;
    let b = sab(2.0, 5.0);
    let c = sab(1.0, 5.0);
    let d = cab(1.0, 5.0) - qa;

    let t0 = x1 + x4;
    let t1 = x2 + x3;
    let t2 = (t0 - t1) * d;
    let u0 = x1 - x4;
    let u1 = x2 - x3;
    let u2 = t0 + t1;
    let u3 = x0 - u2 * qa;
    let t4 = u3 + t2;
    let t5 = (u0 * b + u1 * c) * i_c();

    a[0] = x0 + u2;

    let u4 = u3 - t2;
    let u5 = (u1 * b - u0 * c) * i_c();

    a[1] = t4 - t5;
    a[2] = u4 + u5;
    a[4] = t4 + t5;
    a[3] = u4 - u5;
}

#[inline(always)]
fn c6(a: &mut [Complex64]) {
    let (x0, x1, x2, x3, x4, x5) = (a[0], a[1], a[2], a[3], a[4], a[5]);
    let h = 0.5;
    let b = sab(1.0, 3.0);

    let t0 = x0 + x3;
    let t1 = x4 + x1;
    let t2 = x2 + x5;
    let t3 = t0 - (t1 + t2) * h;
    let t4 = (t1 - t2) * i_c();

    let u0 = x0 - x3;
    let u1 = x4 - x1;
    let u2 = x2 - x5;
    let u3 = u0 - (u1 + u2) * h;
    let u4 = (u1 - u2) * i_c();

    a[0] = t0 + t1 + t2;
    a[1] = u3 + u4 * b;
    a[4] = t3 + t4 * b;
    a[3] = u0 + u1 + u2;
    a[5] = u3 - u4 * b;
    a[2] = t3 - t4 * b;
}

/// Integrated codelet: size-`s` strided DFT over the columns of an
/// `s×m` row-major block, fused with the Cooley–Tukey twiddle
/// pre-multiplication. The per-column twiddle base follows the
/// `θ = −2π/(s·m)` recurrence, refreshed from the closed form every
/// [`UPDATE_TW`] columns to bound drift.
pub(crate) fn integrated(size: usize, m: usize, a: &mut [Complex64]) {
    debug_assert!(size <= MAX_RADIX);
    let theta = -2.0 * PI / (size * m) as f64;
    let step = Complex64::from_polar(1.0, theta);
    let mut tw = Complex64::new(1.0, 0.0);
    let mut x = [Complex64::default(); MAX_RADIX];

    for j in 0..m {
        if j % UPDATE_TW == 0 {
            tw = Complex64::from_polar(1.0, theta * j as f64);
        }
        for (k, slot) in x[..size].iter_mut().enumerate() {
            *slot = a[k * m + j];
        }
        forward(size, &mut x[..size]);
        let mut w = Complex64::new(1.0, 0.0);
        for k in 0..size {
            a[k * m + j] = x[k] * w;
            w *= tw;
        }
        tw *= step;
    }
}
