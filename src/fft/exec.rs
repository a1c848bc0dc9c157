//! FFT plan execution.
//!
//! The executor walks the instruction list with a cursor. Every opcode
//! processes `count × multiplier` contiguous operands of its own unit
//! size, so inlined child plans and `ParallelCall` chunks share one code
//! path. Rader and Bluestein run their convolutions through the child
//! block recorded in the step, swapping the data and scratch roles.

use super::plan::Step;
use super::{codelets, transpose, RECURSIVE_THRESHOLD, UPDATE_TW};
use num_complex::Complex64;
use parking_lot::Mutex;
use std::f64::consts::PI;

/// Free list of equally sized buffer pairs reused across Bluestein calls.
pub(crate) type BufferPool = Mutex<Vec<(Vec<Complex64>, Vec<Complex64>)>>;

/// Largest Rader scratch: the threshold prime less one.
const RADER_MAX: usize = 18;

/// Bluestein sizes at or under this run on stack buffers.
const BLUESTEIN_STACK: usize = 80;

pub(crate) fn execute_steps(
    steps: &[Step],
    precr: &[Complex64],
    pool: &BufferPool,
    data: &mut [Complex64],
    work: &mut [Complex64],
    start: usize,
    mult: usize,
) {
    let mut cursor = start;
    loop {
        match &steps[cursor] {
            Step::Start { .. } => {}
            Step::End => return,
            Step::Jump { target } => {
                cursor = *target;
                continue;
            }
            Step::Codelet { size, count } => {
                let total = count * mult;
                for blk in data[..total * size].chunks_mut(*size) {
                    codelets::forward(*size, blk);
                }
            }
            Step::IntegratedCodelet { size, m, count } => {
                let unit = size * m;
                let total = count * mult;
                for blk in data[..total * unit].chunks_mut(unit) {
                    codelets::integrated(*size, *m, blk);
                }
            }
            Step::Transpose { rows, cols, count } => {
                let unit = rows * cols;
                let total = count * mult;
                for blk in data[..total * unit].chunks_mut(unit) {
                    transpose::transpose(blk, work, *rows, *cols);
                }
            }
            Step::SmallTranspose { rows, cols, count } => {
                let unit = rows * cols;
                let total = count * mult;
                for blk in data[..total * unit].chunks_mut(unit) {
                    transpose::small(blk, *rows, *cols);
                }
            }
            Step::TwiddleFactors { n1, n2, count } => {
                let unit = n1 * n2;
                let total = count * mult;
                for blk in data[..total * unit].chunks_mut(unit) {
                    twiddle_block(blk, *n1, *n2);
                }
            }
            Step::ParallelCall {
                child,
                child_n,
                count,
            } => {
                let total = count * mult;
                let chunk = (RECURSIVE_THRESHOLD / child_n).max(1);
                let region = &mut data[..total * child_n];
                parallel_call(steps, precr, pool, region, work, *child, *child_n, chunk);
            }
            Step::Bluestein {
                n,
                m,
                prec,
                child,
                count,
            } => {
                let chirp = &precr[*prec..*prec + *m];
                let kernel = &precr[*prec + *m..*prec + 2 * *m];
                let total = count * mult;
                for blk in data[..total * n].chunks_mut(*n) {
                    bluestein_block(
                        steps, precr, pool, blk, work, chirp, kernel, *m, *child,
                    );
                }
            }
            Step::Rader {
                n,
                g,
                g_inv,
                prec,
                child,
                count,
            } => {
                let l = *n - 1;
                let table = &precr[*prec..*prec + l];
                let total = count * mult;
                for blk in data[..total * n].chunks_mut(*n) {
                    rader_block(steps, precr, pool, blk, table, *g, *g_inv, *child);
                }
            }
        }
        cursor += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn parallel_call(
    steps: &[Step],
    precr: &[Complex64],
    pool: &BufferPool,
    region: &mut [Complex64],
    work: &mut [Complex64],
    child: usize,
    child_n: usize,
    chunk: usize,
) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let _ = work;
        region.par_chunks_mut(chunk * child_n).for_each(|group| {
            // Each worker owns a scratch buffer of the child size.
            let mut local = vec![Complex64::default(); child_n];
            execute_steps(
                steps,
                precr,
                pool,
                group,
                &mut local,
                child,
                group.len() / child_n,
            );
        });
    }
    #[cfg(not(feature = "parallel"))]
    {
        for group in region.chunks_mut(chunk * child_n) {
            execute_steps(steps, precr, pool, group, work, child, group.len() / child_n);
        }
    }
}

/// Cooley–Tukey twiddle pass over one `n2×n1` block: entry `(i, j)` is
/// scaled by `exp(−2πi·i·j/n)`. Row and column factors both follow the
/// incremental recurrence, refreshed from the closed form every
/// [`UPDATE_TW`] iterations.
fn twiddle_block(a: &mut [Complex64], n1: usize, n2: usize) {
    let n = n1 * n2;
    let theta = -2.0 * PI / n as f64;
    let row_step = Complex64::from_polar(1.0, theta);
    let mut wr = Complex64::new(1.0, 0.0);
    for i in 0..n2 {
        if i % UPDATE_TW == 0 {
            wr = Complex64::from_polar(1.0, theta * i as f64);
        }
        if i > 0 {
            let row = &mut a[i * n1..(i + 1) * n1];
            let mut wc = Complex64::new(1.0, 0.0);
            for (j, slot) in row.iter_mut().enumerate() {
                if j % UPDATE_TW == 0 {
                    wc = Complex64::from_polar(1.0, theta * ((i * j) % n) as f64);
                }
                if j > 0 {
                    *slot *= wc;
                }
                wc *= wr;
            }
        }
        wr *= row_step;
    }
}

/// One Bluestein operand: modulate by the conjugate chirp, zero-pad to
/// `m`, convolve with the precomputed kernel through the child plan
/// (inverse realized as conjugate–forward–conjugate), demodulate, copy
/// the first `n` entries back.
#[allow(clippy::too_many_arguments)]
fn bluestein_block(
    steps: &[Step],
    precr: &[Complex64],
    pool: &BufferPool,
    d: &mut [Complex64],
    work: &mut [Complex64],
    chirp: &[Complex64],
    kernel: &[Complex64],
    m: usize,
    child: usize,
) {
    if m <= BLUESTEIN_STACK {
        // Small convolution: stack pair.
        let mut u = [Complex64::default(); BLUESTEIN_STACK];
        let mut s = [Complex64::default(); BLUESTEIN_STACK];
        bluestein_convolve(
            steps, precr, pool, d, &mut u[..m], &mut s[..m], chirp, kernel, child,
        );
    } else if 2 * m <= work.len() {
        // The plan's main buffer is large enough: short-circuit the pool.
        let (u, s) = work.split_at_mut(m);
        bluestein_convolve(steps, precr, pool, d, u, &mut s[..m], chirp, kernel, child);
    } else {
        let (mut u, mut s) = rent(pool, m);
        bluestein_convolve(steps, precr, pool, d, &mut u, &mut s, chirp, kernel, child);
        pool.lock().push((u, s));
    }
}

fn rent(pool: &BufferPool, m: usize) -> (Vec<Complex64>, Vec<Complex64>) {
    let mut free = pool.lock();
    if let Some(at) = free.iter().position(|(a, _)| a.len() == m) {
        return free.swap_remove(at);
    }
    log::trace!("bluestein pool miss, allocating pair of {}", m);
    (
        vec![Complex64::default(); m],
        vec![Complex64::default(); m],
    )
}

#[allow(clippy::too_many_arguments)]
fn bluestein_convolve(
    steps: &[Step],
    precr: &[Complex64],
    pool: &BufferPool,
    d: &mut [Complex64],
    u: &mut [Complex64],
    s: &mut [Complex64],
    chirp: &[Complex64],
    kernel: &[Complex64],
    child: usize,
) {
    let n = d.len();
    let m = u.len();

    for k in 0..n {
        u[k] = d[k] * chirp[k].conj();
    }
    for slot in u[n..m].iter_mut() {
        *slot = Complex64::default();
    }

    execute_steps(steps, precr, pool, u, s, child, 1);

    // Frequency-domain product; the conjugation enters the inverse pass.
    crate::simd::mul_complex(u, kernel, s);
    for (dst, src) in u.iter_mut().zip(s.iter()) {
        *dst = src.conj();
    }

    execute_steps(steps, precr, pool, u, s, child, 1);

    for k in 0..n {
        d[k] = u[k].conj() * chirp[k].conj();
    }
}

/// One Rader operand: permute by powers of the primitive root, convolve
/// with the transformed kernel through the child plan, scatter back by
/// powers of the inverse root with the DC term folded in.
#[allow(clippy::too_many_arguments)]
fn rader_block(
    steps: &[Step],
    precr: &[Complex64],
    pool: &BufferPool,
    d: &mut [Complex64],
    table: &[Complex64],
    g: usize,
    g_inv: usize,
    child: usize,
) {
    let n = d.len();
    let l = n - 1;
    let mut b = [Complex64::default(); RADER_MAX];
    let mut s = [Complex64::default(); RADER_MAX];

    let x0 = d[0];
    let mut gp = 1usize;
    for q in 0..l {
        b[q] = d[gp];
        gp = gp * g % n;
    }

    execute_steps(steps, precr, pool, &mut b[..l], &mut s[..l], child, 1);

    // Bin zero of the permuted transform is the sum of a[1..].
    let dc = x0 + b[0];

    for q in 0..l {
        b[q] = (b[q] * table[q]).conj();
    }

    execute_steps(steps, precr, pool, &mut b[..l], &mut s[..l], child, 1);

    let mut gp = 1usize;
    for q in 0..l {
        d[gp] = x0 + b[q].conj();
        gp = gp * g_inv % n;
    }
    d[0] = dc;
}

#[cfg(test)]
mod tests {
    use crate::fft::plan::FftPlan;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    fn naive_dft(x: &[Complex64]) -> Vec<Complex64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                (0..n)
                    .map(|j| {
                        let angle = -2.0 * PI * ((j * k) % n) as f64 / n as f64;
                        x[j] * Complex64::from_polar(1.0, angle)
                    })
                    .sum()
            })
            .collect()
    }

    fn sample(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|k| {
                Complex64::new(
                    ((k * 7 + 3) % 11) as f64 - 5.0,
                    ((k * 5 + 1) % 9) as f64 * 0.25,
                )
            })
            .collect()
    }

    fn check_against_naive(n: usize, tol: f64) {
        let plan = FftPlan::build(n);
        let x = sample(n);
        let mut a = x.clone();
        plan.execute(&mut a);
        let expect = naive_dft(&x);
        let scale = (n as f64).sqrt();
        for k in 0..n {
            assert!(
                (a[k] - expect[k]).norm() < tol * scale,
                "n={} bin {}: {} vs {}",
                n,
                k,
                a[k],
                expect[k]
            );
        }
    }

    #[test]
    fn matches_naive_dft_small() {
        for n in 1..=32 {
            check_against_naive(n, 1e-9);
        }
    }

    #[test]
    fn matches_naive_dft_mixed() {
        // Composite with radices 2/3/5, prime Rader, prime Bluestein,
        // composite with large prime factors.
        for n in [36, 60, 49, 77, 91, 120, 210, 225, 343, 360, 1000] {
            check_against_naive(n, 1e-9);
        }
    }

    #[test]
    fn prime_paths() {
        // Rader territory.
        for n in [7, 11, 13, 17, 19] {
            check_against_naive(n, 1e-10);
        }
        // Bluestein territory.
        for n in [23, 29, 31, 37, 97, 101, 211] {
            check_against_naive(n, 1e-9);
        }
    }

    #[test]
    fn impulse_yields_all_ones() {
        for n in [7usize, 23] {
            let plan = FftPlan::build(n);
            let mut a = vec![Complex64::default(); n];
            a[0] = Complex64::new(1.0, 0.0);
            plan.execute(&mut a);
            for bin in a {
                assert!((bin - Complex64::new(1.0, 0.0)).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn parallel_call_path_matches_naive() {
        check_against_naive(2048, 1e-9);
        check_against_naive(1536, 1e-9);
    }

    #[test]
    fn large_bluestein_uses_the_pool() {
        // 2·1021: integrated codelet over a large prime child, whose
        // Bluestein convolution exceeds both the stack and main buffer.
        let n = 2042;
        let plan = FftPlan::build(n);
        let mut a = vec![Complex64::default(); n];
        a[0] = Complex64::new(1.0, 0.0);
        plan.execute(&mut a);
        for bin in &a {
            assert!((bin - Complex64::new(1.0, 0.0)).norm() < 1e-8);
        }
        // Second run reuses the rented pair.
        plan.execute(&mut a);
    }

    #[test]
    fn dc_bin_is_the_plain_sum() {
        for n in [12usize, 17, 23, 40] {
            let plan = FftPlan::build(n);
            let x = sample(n);
            let mut a = x.clone();
            plan.execute(&mut a);
            let sum: Complex64 = x.iter().sum();
            assert!((a[0] - sum).norm() < 1e-10);
        }
    }
}
