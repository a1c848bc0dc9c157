//! Vectorized slice kernels backing the dense-vector primitives.
//!
//! Every kernel has an AVX path and a scalar path computing the same
//! expression; the AVX path is taken when the CPU reports support at
//! runtime. Callers never see the split.

use lazy_static::lazy_static;
use num_complex::Complex64;

lazy_static! {
    static ref HAS_AVX: bool = detect_avx();
}

#[cfg(target_arch = "x86_64")]
fn detect_avx() -> bool {
    std::arch::is_x86_feature_detected!("avx")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_avx() -> bool {
    false
}

/// True when the AVX paths are active; exposed for diagnostics only.
pub fn avx_enabled() -> bool {
    *HAS_AVX
}

//
// Binary element-wise kernels over f64 slices.
//

macro_rules! binary_kernel {
    ($name:ident, $avx:ident, $op:tt, $intrin:ident) => {
        pub fn $name(a: &[f64], b: &[f64], out: &mut [f64]) {
            debug_assert_eq!(a.len(), b.len());
            debug_assert_eq!(a.len(), out.len());
            #[cfg(target_arch = "x86_64")]
            {
                if *HAS_AVX {
                    unsafe { $avx(a, b, out) };
                    return;
                }
            }
            for i in 0..a.len() {
                out[i] = a[i] $op b[i];
            }
        }

        #[cfg(target_arch = "x86_64")]
        #[target_feature(enable = "avx")]
        unsafe fn $avx(a: &[f64], b: &[f64], out: &mut [f64]) {
            use std::arch::x86_64::*;
            let n = a.len();
            let mut i = 0;
            while i + 4 <= n {
                let va = _mm256_loadu_pd(a.as_ptr().add(i));
                let vb = _mm256_loadu_pd(b.as_ptr().add(i));
                _mm256_storeu_pd(out.as_mut_ptr().add(i), $intrin(va, vb));
                i += 4;
            }
            while i < n {
                out[i] = a[i] $op b[i];
                i += 1;
            }
        }
    };
}

binary_kernel!(add, add_avx, +, _mm256_add_pd);
binary_kernel!(sub, sub_avx, -, _mm256_sub_pd);
binary_kernel!(mul, mul_avx, *, _mm256_mul_pd);
binary_kernel!(div, div_avx, /, _mm256_div_pd);

//
// Scalar broadcast kernels.
//

pub fn add_scalar(a: &[f64], s: f64, out: &mut [f64]) {
    debug_assert_eq!(a.len(), out.len());
    #[cfg(target_arch = "x86_64")]
    {
        if *HAS_AVX {
            unsafe { add_scalar_avx(a, s, out) };
            return;
        }
    }
    for i in 0..a.len() {
        out[i] = a[i] + s;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn add_scalar_avx(a: &[f64], s: f64, out: &mut [f64]) {
    use std::arch::x86_64::*;
    let vs = _mm256_set1_pd(s);
    let n = a.len();
    let mut i = 0;
    while i + 4 <= n {
        let va = _mm256_loadu_pd(a.as_ptr().add(i));
        _mm256_storeu_pd(out.as_mut_ptr().add(i), _mm256_add_pd(va, vs));
        i += 4;
    }
    while i < n {
        out[i] = a[i] + s;
        i += 1;
    }
}

pub fn scale(a: &[f64], s: f64, out: &mut [f64]) {
    debug_assert_eq!(a.len(), out.len());
    #[cfg(target_arch = "x86_64")]
    {
        if *HAS_AVX {
            unsafe { scale_avx(a, s, out) };
            return;
        }
    }
    for i in 0..a.len() {
        out[i] = a[i] * s;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn scale_avx(a: &[f64], s: f64, out: &mut [f64]) {
    use std::arch::x86_64::*;
    let vs = _mm256_set1_pd(s);
    let n = a.len();
    let mut i = 0;
    while i + 4 <= n {
        let va = _mm256_loadu_pd(a.as_ptr().add(i));
        _mm256_storeu_pd(out.as_mut_ptr().add(i), _mm256_mul_pd(va, vs));
        i += 4;
    }
    while i < n {
        out[i] = a[i] * s;
        i += 1;
    }
}

pub fn negate(a: &[f64], out: &mut [f64]) {
    scale(a, -1.0, out);
}

//
// Horizontal reductions.
//

pub fn sum(a: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if *HAS_AVX {
            return unsafe { sum_avx(a) };
        }
    }
    a.iter().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn sum_avx(a: &[f64]) -> f64 {
    use std::arch::x86_64::*;
    let n = a.len();
    let mut acc = _mm256_setzero_pd();
    let mut i = 0;
    while i + 4 <= n {
        acc = _mm256_add_pd(acc, _mm256_loadu_pd(a.as_ptr().add(i)));
        i += 4;
    }
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);
    let mut total = lanes[0] + lanes[1] + lanes[2] + lanes[3];
    while i < n {
        total += a[i];
        i += 1;
    }
    total
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(target_arch = "x86_64")]
    {
        if *HAS_AVX {
            return unsafe { dot_avx(a, b) };
        }
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn dot_avx(a: &[f64], b: &[f64]) -> f64 {
    use std::arch::x86_64::*;
    let n = a.len();
    let mut acc = _mm256_setzero_pd();
    let mut i = 0;
    while i + 4 <= n {
        let va = _mm256_loadu_pd(a.as_ptr().add(i));
        let vb = _mm256_loadu_pd(b.as_ptr().add(i));
        acc = _mm256_add_pd(acc, _mm256_mul_pd(va, vb));
        i += 4;
    }
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);
    let mut total = lanes[0] + lanes[1] + lanes[2] + lanes[3];
    while i < n {
        total += a[i] * b[i];
        i += 1;
    }
    total
}

//
// Pointwise complex multiply, used by complex vectors and the FFT
// convolution post-processing.
//

pub fn mul_complex(a: &[Complex64], b: &[Complex64], out: &mut [Complex64]) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());
    #[cfg(target_arch = "x86_64")]
    {
        if *HAS_AVX {
            unsafe { mul_complex_avx(a, b, out) };
            return;
        }
    }
    for i in 0..a.len() {
        out[i] = a[i] * b[i];
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn mul_complex_avx(a: &[Complex64], b: &[Complex64], out: &mut [Complex64]) {
    use std::arch::x86_64::*;
    // Complex64 is repr(C) { re, im }: two f64 lanes per element.
    let pa = a.as_ptr().cast::<f64>();
    let pb = b.as_ptr().cast::<f64>();
    let po = out.as_mut_ptr().cast::<f64>();
    let n = a.len();
    let mut i = 0;
    while i + 2 <= n {
        let va = _mm256_loadu_pd(pa.add(2 * i));
        let vb = _mm256_loadu_pd(pb.add(2 * i));
        let re = _mm256_movedup_pd(va);
        let im = _mm256_permute_pd(va, 0xF);
        let sw = _mm256_permute_pd(vb, 0x5);
        let r = _mm256_addsub_pd(_mm256_mul_pd(re, vb), _mm256_mul_pd(im, sw));
        _mm256_storeu_pd(po.add(2 * i), r);
        i += 2;
    }
    while i < n {
        out[i] = a[i] * b[i];
        i += 1;
    }
}
