//! FFT plan construction.
//!
//! A plan is an immutable instruction list plus precomputed tables. The
//! builder factors the problem size recursively: codelets for sizes up to
//! [`MAX_RADIX`], Cooley–Tukey splits for composites (inlined below
//! [`RECURSIVE_THRESHOLD`], child blocks dispatched through
//! `ParallelCall` above it), Rader for small primes and Bluestein's
//! chirp-z for large ones. Rader and Bluestein kernels are transformed at
//! build time by the freshly emitted child plan.

use super::exec::{self, BufferPool};
use super::transpose;
use super::{MAX_RADIX, RADER_THRESHOLD, RECURSIVE_THRESHOLD};
use crate::error::{Error, Result};
use num_complex::Complex64;
use parking_lot::Mutex;
use std::f64::consts::PI;
use std::fmt::Write as _;

/// `exp(−2πi·k/n)`.
pub(crate) fn w(k: usize, n: usize) -> Complex64 {
    let angle = -2.0 * PI * (k % n) as f64 / n as f64;
    Complex64::from_polar(1.0, angle)
}

/// One plan entry: a variant tag, up to three small parameters and a
/// count/size pair. Counts multiply with the executor's block multiplier.
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Opens a plan block.
    Start { n: usize },
    /// Terminates the enclosing block.
    End,
    /// Transfers to an absolute plan index (skips embedded child blocks).
    Jump { target: usize },
    /// Runs the child block over `count` contiguous operands, chunked.
    ParallelCall {
        child: usize,
        child_n: usize,
        count: usize,
    },
    /// Contiguous small-radix DFT blocks.
    Codelet { size: usize, count: usize },
    /// Strided DFT fused with twiddle pre-multiplication over `size×m`.
    IntegratedCodelet {
        size: usize,
        m: usize,
        count: usize,
    },
    /// `rows×cols` in-place transpose through the working buffer.
    Transpose {
        rows: usize,
        cols: usize,
        count: usize,
    },
    /// Cache-block transpose; both dimensions fit one block.
    SmallTranspose {
        rows: usize,
        cols: usize,
        count: usize,
    },
    /// Cooley–Tukey twiddle multiplication over an `n2×n1` block.
    TwiddleFactors {
        n1: usize,
        n2: usize,
        count: usize,
    },
    /// Chirp-z leaf; `prec` indexes the chirp + kernel tables.
    Bluestein {
        n: usize,
        m: usize,
        prec: usize,
        child: usize,
        count: usize,
    },
    /// Prime-length leaf via primitive-root convolution.
    Rader {
        n: usize,
        g: usize,
        g_inv: usize,
        prec: usize,
        child: usize,
        count: usize,
    },
}

/// A frozen transform plan for one problem size.
///
/// The instruction list and tables are immutable and safe to share; the
/// working buffer and the Bluestein pool belong to this instance and are
/// mutex-guarded. For parallel throughput use one plan per thread.
pub struct FftPlan {
    n: usize,
    steps: Vec<Step>,
    precr: Vec<Complex64>,
    work: Mutex<Vec<Complex64>>,
    pool: BufferPool,
}

impl FftPlan {
    /// Builds a plan for transforming length-`n` complex arrays.
    pub fn new(n: usize) -> Result<FftPlan> {
        if n == 0 {
            return Err(Error::invalid("FFT size must be positive"));
        }
        Ok(Self::build(n))
    }

    pub(crate) fn build(n: usize) -> FftPlan {
        let mut builder = Builder {
            steps: Vec::new(),
            precr: Vec::with_capacity(prec_size(n)),
        };
        builder.steps.push(Step::Start { n });
        if n > 1 {
            builder.emit(n, 1);
        }
        builder.steps.push(Step::End);

        log::debug!(
            "built FFT plan for N={} ({} steps, {} table entries)",
            n,
            builder.steps.len(),
            builder.precr.len()
        );

        FftPlan {
            n,
            steps: builder.steps,
            precr: builder.precr,
            work: Mutex::new(vec![Complex64::default(); n]),
            pool: Mutex::new(Vec::new()),
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Transforms `a` in place. `a.len()` must equal the plan size.
    pub fn execute(&self, a: &mut [Complex64]) {
        assert_eq!(a.len(), self.n, "plan size mismatch");
        if self.n <= 1 {
            return;
        }
        let mut work = self.work.lock();
        exec::execute_steps(&self.steps, &self.precr, &self.pool, a, &mut work, 0, 1);
    }

    /// Diagnostic textual tree of the plan.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let mut indent = 0usize;
        for step in &self.steps {
            match step {
                Step::Start { n } => {
                    let _ = writeln!(out, "{}Plan({}):", "  ".repeat(indent), n);
                    indent += 1;
                }
                Step::End => indent = indent.saturating_sub(1),
                Step::Jump { .. } => {}
                other => {
                    let pad = "  ".repeat(indent);
                    let _ = match other {
                        Step::Codelet { size, count } => {
                            writeln!(out, "{}Codelet-{} x{}", pad, size, count)
                        }
                        Step::IntegratedCodelet { size, m, count } => {
                            writeln!(out, "{}Codelet-{} (integrated, m={}) x{}", pad, size, m, count)
                        }
                        Step::Transpose { rows, cols, count } => {
                            writeln!(out, "{}Transpose {}x{} x{}", pad, rows, cols, count)
                        }
                        Step::SmallTranspose { rows, cols, count } => {
                            writeln!(out, "{}SmallTranspose {}x{} x{}", pad, rows, cols, count)
                        }
                        Step::TwiddleFactors { n1, n2, count } => {
                            writeln!(out, "{}Twiddle {}x{} x{}", pad, n2, n1, count)
                        }
                        Step::ParallelCall { child_n, count, .. } => {
                            writeln!(out, "{}ParallelCall plan({}) x{}", pad, child_n, count)
                        }
                        Step::Bluestein { n, m, count, .. } => {
                            writeln!(out, "{}Bluestein({}, M={}) x{}", pad, n, m, count)
                        }
                        Step::Rader { n, g, count, .. } => {
                            writeln!(out, "{}Rader({}, g={}) x{}", pad, n, g, count)
                        }
                        _ => Ok(()),
                    };
                }
            }
        }
        out
    }
}

//
// Builder.
//

struct Builder {
    steps: Vec<Step>,
    precr: Vec<Complex64>,
}

impl Builder {
    /// Emits the instruction sequence transforming `count` contiguous
    /// length-`n` operands.
    fn emit(&mut self, n: usize, count: usize) {
        if n <= MAX_RADIX {
            self.steps.push(Step::Codelet { size: n, count });
            return;
        }
        if is_prime(n) {
            if n <= RADER_THRESHOLD {
                self.emit_rader(n, count);
            } else {
                self.emit_bluestein(n, count);
            }
            return;
        }

        let (n1, n2) = choose_split(n);
        if n <= RECURSIVE_THRESHOLD {
            //
            // Flat form: inner plans inlined with multiplied counts.
            //
            if n1 <= MAX_RADIX {
                self.steps.push(Step::IntegratedCodelet {
                    size: n1,
                    m: n2,
                    count,
                });
                self.emit(n2, count * n1);
                self.push_transpose(n1, n2, count);
            } else {
                self.push_transpose(n1, n2, count);
                self.emit(n1, count * n2);
                self.steps.push(Step::TwiddleFactors { n1, n2, count });
                self.push_transpose(n2, n1, count);
                self.emit(n2, count * n1);
                self.push_transpose(n1, n2, count);
            }
        } else {
            //
            // Parallel-call form: inner plans as child blocks.
            //
            if n1 <= MAX_RADIX {
                self.steps.push(Step::IntegratedCodelet {
                    size: n1,
                    m: n2,
                    count,
                });
                let child = self.emit_child(n2);
                self.steps.push(Step::ParallelCall {
                    child,
                    child_n: n2,
                    count: count * n1,
                });
                self.push_transpose(n1, n2, count);
            } else {
                self.push_transpose(n1, n2, count);
                let child1 = self.emit_child(n1);
                self.steps.push(Step::ParallelCall {
                    child: child1,
                    child_n: n1,
                    count: count * n2,
                });
                self.steps.push(Step::TwiddleFactors { n1, n2, count });
                self.push_transpose(n2, n1, count);
                let child2 = self.emit_child(n2);
                self.steps.push(Step::ParallelCall {
                    child: child2,
                    child_n: n2,
                    count: count * n1,
                });
                self.push_transpose(n1, n2, count);
            }
        }
    }

    /// Emits a `Start…End` child block for one length-`n` operand,
    /// jumped over in the fall-through path. Returns its absolute index.
    fn emit_child(&mut self, n: usize) -> usize {
        let jump_at = self.steps.len();
        self.steps.push(Step::Jump { target: 0 });
        let start = self.steps.len();
        self.steps.push(Step::Start { n });
        self.emit(n, 1);
        self.steps.push(Step::End);
        let after = self.steps.len();
        self.steps[jump_at] = Step::Jump { target: after };
        start
    }

    /// Emits the transpose step, tagging cache-block shapes separately.
    fn push_transpose(&mut self, rows: usize, cols: usize, count: usize) {
        if rows <= transpose::BLOCK_SIZE && cols <= transpose::BLOCK_SIZE {
            self.steps.push(Step::SmallTranspose { rows, cols, count });
        } else {
            self.steps.push(Step::Transpose { rows, cols, count });
        }
    }

    /// Prime leaf, `n ≤ RADER_THRESHOLD`: reduce to a length-`n−1`
    /// convolution via a primitive root mod `n`.
    fn emit_rader(&mut self, n: usize, count: usize) {
        let g = primitive_root(n);
        let g_inv = powermod(g, n - 2, n);
        let l = n - 1;

        let child = self.emit_child(l);

        //
        // Reordered twiddle kernel: omega[q] = w(g^−q), transformed by the
        // child plan and pre-divided by the convolution length.
        //
        let prec = self.precr.len();
        let mut omega = vec![Complex64::default(); l];
        let mut gp = 1usize;
        for slot in omega.iter_mut() {
            *slot = w(gp, n);
            gp = gp * g_inv % n;
        }
        self.run_child(child, &mut omega);
        for x in omega.iter_mut() {
            *x /= l as f64;
        }
        self.precr.extend_from_slice(&omega);

        self.steps.push(Step::Rader {
            n,
            g,
            g_inv,
            prec,
            child,
            count,
        });
    }

    /// Prime leaf, `n > RADER_THRESHOLD`: chirp-z through the smallest
    /// 5-smooth convolution size `M ≥ 2n−1`.
    fn emit_bluestein(&mut self, n: usize, count: usize) {
        let m = find_smooth(2 * n - 1);
        let child = self.emit_child(m);

        //
        // Chirp b[k] = exp(iπk²/n), mirrored into the padding so the
        // circular convolution sees b[k−j] at every lag.
        //
        let prec = self.precr.len();
        let mut chirp = vec![Complex64::default(); m];
        for k in 0..n {
            let kk = (k as u64 * k as u64) % (2 * n as u64);
            chirp[k] = Complex64::from_polar(1.0, PI * kk as f64 / n as f64);
        }
        for k in 1..n {
            chirp[m - k] = chirp[k];
        }
        self.precr.extend_from_slice(&chirp);

        //
        // Frequency-domain kernel, pre-divided by M so the inverse pass
        // needs no extra normalization.
        //
        let mut kernel = chirp;
        for x in kernel.iter_mut() {
            *x /= m as f64;
        }
        self.run_child(child, &mut kernel);
        self.precr.extend_from_slice(&kernel);

        self.steps.push(Step::Bluestein {
            n,
            m,
            prec,
            child,
            count,
        });
    }

    /// Runs an already-emitted child block at build time to transform a
    /// kernel table in place.
    fn run_child(&self, child: usize, data: &mut [Complex64]) {
        let pool: BufferPool = Mutex::new(Vec::new());
        let mut scratch = vec![Complex64::default(); data.len()];
        exec::execute_steps(&self.steps, &self.precr, &pool, data, &mut scratch, child, 1);
    }
}

/// Factor selection. Small sizes scan radices ascending so the plan
/// bottoms out in the smallest codelets; large sizes take the balanced
/// split closest to `√n`.
fn choose_split(n: usize) -> (usize, usize) {
    if n <= RECURSIVE_THRESHOLD {
        for j in 2..=MAX_RADIX {
            if n % j == 0 {
                return (j, n / j);
            }
        }
        let p = smallest_factor(n);
        (p, n / p)
    } else {
        for j in (2..=isqrt(n)).rev() {
            if n % j == 0 {
                return (j, n / j);
            }
        }
        unreachable!("composite size has a divisor at or below its square root")
    }
}

fn isqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    while r * r > n {
        r -= 1;
    }
    r
}

//
// Factorization. Plans are built once per size and cached, so a 2/3 then
// 6k±1 trial-division wheel is all the number theory the builder needs.
//

/// Smallest prime factor of `n` (`n` itself when prime).
fn smallest_factor(n: usize) -> usize {
    if n % 2 == 0 {
        return 2;
    }
    if n % 3 == 0 {
        return 3;
    }
    let mut p = 5;
    while p * p <= n {
        if n % p == 0 {
            return p;
        }
        if n % (p + 2) == 0 {
            return p + 2;
        }
        p += 6;
    }
    n
}

fn is_prime(n: usize) -> bool {
    n > 1 && smallest_factor(n) == n
}

/// Distinct prime factors in ascending order, as needed by the
/// primitive-root search over `φ(n)`.
fn distinct_prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    while n > 1 {
        let p = smallest_factor(n);
        out.push(p);
        while n % p == 0 {
            n /= p;
        }
    }
    out
}

/// Exact table size needed for a length-`n` plan, computed by simulating
/// the factorization.
fn prec_size(n: usize) -> usize {
    if n <= MAX_RADIX {
        return 0;
    }
    if is_prime(n) {
        return if n <= RADER_THRESHOLD {
            (n - 1) + prec_size(n - 1)
        } else {
            let m = find_smooth(2 * n - 1);
            2 * m + prec_size(m)
        };
    }
    let (n1, n2) = choose_split(n);
    prec_size(n1) + prec_size(n2)
}

/// Smallest integer `≥ target` whose only prime factors are 2, 3 and 5:
/// start from the power-of-two ceiling and prune downward with a
/// recursive smooth-number enumeration.
pub(crate) fn find_smooth(target: usize) -> usize {
    fn descend(cur: usize, target: usize, best: &mut usize) {
        if cur >= *best {
            return;
        }
        if cur >= target {
            *best = cur;
            return;
        }
        descend(cur * 2, target, best);
        descend(cur * 3, target, best);
        descend(cur * 5, target, best);
    }

    let mut best = target.next_power_of_two();
    descend(1, target, &mut best);
    best
}

fn powermod(mut base: usize, mut exp: usize, modulus: usize) -> usize {
    let mut result = 1;
    base %= modulus;
    while exp > 0 {
        if exp % 2 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exp /= 2;
    }
    result
}

/// Smallest generator of the multiplicative group mod prime `n`, found by
/// testing candidates against the prime factorization of `n−1`.
fn primitive_root(n: usize) -> usize {
    let phi = n - 1;
    let factors = distinct_prime_factors(phi);
    let mut g = 2;
    loop {
        let mut is_gen = true;
        for &p in &factors {
            if powermod(g, phi / p, n) == 1 {
                is_gen = false;
                break;
            }
        }
        if is_gen {
            return g;
        }
        g += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorization_helpers() {
        assert_eq!(smallest_factor(360), 2);
        assert_eq!(smallest_factor(49), 7);
        assert_eq!(smallest_factor(77), 7);
        assert_eq!(smallest_factor(1021), 1021);
        assert!(is_prime(2));
        assert!(is_prime(1021));
        assert!(is_prime(10_007));
        assert!(!is_prime(1));
        assert!(!is_prime(1024));
        assert_eq!(distinct_prime_factors(360), vec![2, 3, 5]);
        assert_eq!(distinct_prime_factors(16), vec![2]);
        assert_eq!(distinct_prime_factors(23), vec![23]);
        assert_eq!(distinct_prime_factors(1), Vec::<usize>::new());
    }

    #[test]
    fn smooth_sizes() {
        assert_eq!(find_smooth(45), 45);
        assert_eq!(find_smooth(46), 48);
        assert_eq!(find_smooth(121), 125);
        assert_eq!(find_smooth(1), 1);
        assert_eq!(find_smooth(7), 8);
    }

    #[test]
    fn primitive_roots() {
        assert_eq!(primitive_root(3), 2);
        assert_eq!(primitive_root(7), 3);
        assert_eq!(primitive_root(17), 3);
        assert_eq!(primitive_root(19), 2);
        // g · g⁻¹ ≡ 1 (mod n)
        for n in [7usize, 11, 13, 17, 19] {
            let g = primitive_root(n);
            let g_inv = powermod(g, n - 2, n);
            assert_eq!(g * g_inv % n, 1);
        }
    }

    #[test]
    fn describe_references_expected_strategies() {
        let plan = FftPlan::new(360).unwrap();
        let tree = plan.describe();
        assert!(tree.contains("Codelet-5"), "{}", tree);
        assert!(tree.contains("Codelet-3"), "{}", tree);
        assert!(tree.contains("Codelet-2"), "{}", tree);

        let tree = FftPlan::new(23).unwrap().describe();
        assert!(tree.contains("Bluestein"), "{}", tree);

        let tree = FftPlan::new(17).unwrap().describe();
        assert!(tree.contains("Rader"), "{}", tree);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(FftPlan::new(0).is_err());
        assert!(FftPlan::new(1).is_ok());
    }

    #[test]
    fn large_sizes_emit_parallel_calls() {
        let plan = FftPlan::new(2048).unwrap();
        assert!(plan.describe().contains("ParallelCall"));
    }

    #[test]
    fn table_sizing_matches_the_build() {
        for n in [23usize, 17, 46, 97, 360, 1000] {
            let plan = FftPlan::build(n);
            assert_eq!(plan.precr.len(), prec_size(n), "n={}", n);
        }
    }
}
