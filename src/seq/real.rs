use crate::error::{Error, Result};
use crate::fft::Spectrum;
use crate::random::{DefaultRandom, GaussianSource, NormalSource, RandomSource};
use crate::seq::{ComplexSeq, IntSeq, Sequence};
use crate::stats::Accumulator;
use crate::vector::RealVector;
use num_complex::Complex64;
use std::collections::HashSet;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

type Map1 = Rc<dyn Fn(f64) -> f64>;
type Map2 = Rc<dyn Fn(f64, f64) -> f64>;
type MapIdx = Rc<dyn Fn(usize, f64) -> f64>;
type Pred = Rc<dyn Fn(f64) -> bool>;

/// Lazy sequence of `f64` values.
///
/// Variants own their cursor state; `reset` restores every variant to its
/// pristine configuration. Cloning copies configuration and cursor, so
/// `clone` followed by `reset` yields a fresh-cursor copy.
#[derive(Clone)]
pub enum RealSeq {
    /// Integers `[first, last]`, ascending or descending, as doubles.
    Range { first: i32, last: i32, i: usize },
    /// `n+1` evenly spaced values between `lower` and `upper`.
    Grid {
        lower: f64,
        upper: f64,
        n: usize,
        i: usize,
    },
    /// `n` copies of one value.
    Repeat { value: f64, n: usize, i: usize },
    /// Backed by contiguous storage.
    Vector { data: RealVector, i: usize },
    /// `n` uniform draws in `[0, 1)`.
    Random {
        n: usize,
        i: usize,
        source: Box<dyn RandomSource>,
    },
    /// `n` normal draws.
    Normal {
        n: usize,
        i: usize,
        source: Box<dyn NormalSource>,
    },
    /// Autoregressive process `x[t] = coeffs·(x[t−1..t−p]) + ε[t]`.
    Ar {
        n: usize,
        i: usize,
        coeffs: Vec<f64>,
        history: Vec<f64>,
        source: Box<dyn NormalSource>,
    },
    /// Moving average `x[t] = mean + ε[t] + coeffs·(ε[t−1..t−q])`.
    Ma {
        n: usize,
        i: usize,
        mean: f64,
        coeffs: Vec<f64>,
        noise: Vec<f64>,
        source: Box<dyn NormalSource>,
    },
    /// `x[0] = seed; x[i+1] = f(x[i])`.
    Unfold {
        n: usize,
        i: usize,
        seed: f64,
        state: f64,
        f: Map1,
    },
    /// `x[0] = seed; x[i+1] = f(i+1, x[i])`.
    UnfoldIdx {
        n: usize,
        i: usize,
        seed: f64,
        state: f64,
        f: MapIdx,
    },
    /// Two seeds, `x[i+2] = f(x[i], x[i+1])`.
    Unfold2 {
        n: usize,
        i: usize,
        seeds: (f64, f64),
        state: (f64, f64),
        f: Map2,
    },
    /// Fused element transform.
    Mapped { source: Box<RealSeq>, f: Map1 },
    /// Keeps values satisfying the predicate.
    Filtered { source: Box<RealSeq>, p: Pred },
    /// Filter and transform fused into one combinator.
    FilteredMapped {
        source: Box<RealSeq>,
        p: Pred,
        f: Map1,
    },
    /// Lockstep combination of two sequences, stopping at the shorter.
    Zipped {
        a: Box<RealSeq>,
        b: Box<RealSeq>,
        f: Map2,
    },
    /// Yields until the predicate first fails.
    TakeWhile {
        source: Box<RealSeq>,
        p: Pred,
        done: bool,
    },
    /// Yields through and including the sentinel match.
    UntilValue {
        source: Box<RealSeq>,
        sentinel: f64,
        done: bool,
    },
    /// Yields through and including the first predicate match.
    UntilPred {
        source: Box<RealSeq>,
        p: Pred,
        done: bool,
    },
    /// Real view of a complex sequence.
    FromComplex {
        source: Box<ComplexSeq>,
        f: Rc<dyn Fn(Complex64) -> f64>,
    },
    /// Real view of an integer sequence.
    FromInt {
        source: Box<IntSeq>,
        f: Rc<dyn Fn(i32) -> f64>,
    },
}

//
// Constructors.
//

impl RealSeq {
    pub fn range(first: i32, last: i32) -> RealSeq {
        RealSeq::Range { first, last, i: 0 }
    }

    pub fn grid(lower: f64, n: usize, upper: f64) -> RealSeq {
        RealSeq::Grid {
            lower,
            upper,
            n,
            i: 0,
        }
    }

    pub fn repeat(n: usize, value: f64) -> RealSeq {
        RealSeq::Repeat { value, n, i: 0 }
    }

    pub fn from_vector(data: RealVector) -> RealSeq {
        RealSeq::Vector { data, i: 0 }
    }

    pub fn from_values(values: Vec<f64>) -> RealSeq {
        Self::from_vector(RealVector::new(values))
    }

    pub fn random(n: usize) -> RealSeq {
        Self::random_with(n, Box::new(DefaultRandom::new()))
    }

    pub fn random_with(n: usize, source: Box<dyn RandomSource>) -> RealSeq {
        RealSeq::Random { n, i: 0, source }
    }

    pub fn normal_random(n: usize) -> RealSeq {
        Self::normal_random_with(n, Box::new(GaussianSource::standard()))
    }

    pub fn normal_random_with_variance(n: usize, variance: f64) -> RealSeq {
        Self::normal_random_with(n, Box::new(GaussianSource::new(variance)))
    }

    pub fn normal_random_with(n: usize, source: Box<dyn NormalSource>) -> RealSeq {
        RealSeq::Normal { n, i: 0, source }
    }

    pub fn ar(n: usize, variance: f64, coeffs: &RealVector) -> Result<RealSeq> {
        Self::ar_with(n, coeffs, Box::new(GaussianSource::new(variance)))
    }

    pub fn ar_with(
        n: usize,
        coeffs: &RealVector,
        source: Box<dyn NormalSource>,
    ) -> Result<RealSeq> {
        if coeffs.is_empty() {
            return Err(Error::invalid("AR sequence needs at least one coefficient"));
        }
        Ok(RealSeq::Ar {
            n,
            i: 0,
            coeffs: coeffs.as_slice().to_vec(),
            history: Vec::new(),
            source,
        })
    }

    pub fn ma(n: usize, variance: f64, mean: f64, coeffs: &RealVector) -> Result<RealSeq> {
        Self::ma_with(n, mean, coeffs, Box::new(GaussianSource::new(variance)))
    }

    pub fn ma_with(
        n: usize,
        mean: f64,
        coeffs: &RealVector,
        source: Box<dyn NormalSource>,
    ) -> Result<RealSeq> {
        if coeffs.is_empty() {
            return Err(Error::invalid("MA sequence needs at least one coefficient"));
        }
        Ok(RealSeq::Ma {
            n,
            i: 0,
            mean,
            coeffs: coeffs.as_slice().to_vec(),
            noise: Vec::new(),
            source,
        })
    }

    pub fn unfold(n: usize, seed: f64, f: impl Fn(f64) -> f64 + 'static) -> RealSeq {
        RealSeq::Unfold {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold_indexed(n: usize, seed: f64, f: impl Fn(usize, f64) -> f64 + 'static) -> RealSeq {
        RealSeq::UnfoldIdx {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold2(
        n: usize,
        first: f64,
        second: f64,
        f: impl Fn(f64, f64) -> f64 + 'static,
    ) -> RealSeq {
        RealSeq::Unfold2 {
            n,
            i: 0,
            seeds: (first, second),
            state: (first, second),
            f: Rc::new(f),
        }
    }

    pub fn from_complex(source: ComplexSeq, f: impl Fn(Complex64) -> f64 + 'static) -> RealSeq {
        RealSeq::FromComplex {
            source: Box::new(source),
            f: Rc::new(f),
        }
    }

    pub fn from_int(source: IntSeq, f: impl Fn(i32) -> f64 + 'static) -> RealSeq {
        RealSeq::FromInt {
            source: Box::new(source),
            f: Rc::new(f),
        }
    }
}

//
// Protocol.
//

impl RealSeq {
    pub(crate) fn exact_len(&self) -> Option<usize> {
        match self {
            RealSeq::Range { first, last, .. } => {
                Some((*last as i64 - *first as i64).unsigned_abs() as usize + 1)
            }
            RealSeq::Grid { n, .. } => Some(n + 1),
            RealSeq::Repeat { n, .. } => Some(*n),
            RealSeq::Vector { data, .. } => Some(data.len()),
            RealSeq::Random { n, .. }
            | RealSeq::Normal { n, .. }
            | RealSeq::Ar { n, .. }
            | RealSeq::Ma { n, .. }
            | RealSeq::Unfold { n, .. }
            | RealSeq::UnfoldIdx { n, .. }
            | RealSeq::Unfold2 { n, .. } => Some(*n),
            RealSeq::Mapped { source, .. } => source.exact_len(),
            RealSeq::Zipped { a, b, .. } => Some(a.exact_len()?.min(b.exact_len()?)),
            RealSeq::FromComplex { source, .. } => source.exact_len(),
            RealSeq::FromInt { source, .. } => source.exact_len(),
            RealSeq::Filtered { .. }
            | RealSeq::FilteredMapped { .. }
            | RealSeq::TakeWhile { .. }
            | RealSeq::UntilValue { .. }
            | RealSeq::UntilPred { .. } => None,
        }
    }

    fn grid_delta(lower: f64, upper: f64, n: usize) -> f64 {
        if n == 0 {
            0.0
        } else {
            (upper - lower) / n as f64
        }
    }
}

impl Sequence for RealSeq {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match self {
            RealSeq::Range { first, last, i } => {
                let count = (*last as i64 - *first as i64).unsigned_abs() as usize + 1;
                if *i >= count {
                    return None;
                }
                let v = if last >= first {
                    *first as i64 + *i as i64
                } else {
                    *first as i64 - *i as i64
                };
                *i += 1;
                Some(v as f64)
            }
            RealSeq::Grid { lower, upper, n, i } => {
                if *i > *n {
                    return None;
                }
                let v = *lower + Self::grid_delta(*lower, *upper, *n) * *i as f64;
                *i += 1;
                Some(v)
            }
            RealSeq::Repeat { value, n, i } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(*value)
            }
            RealSeq::Vector { data, i } => {
                if *i >= data.len() {
                    return None;
                }
                let v = data[*i];
                *i += 1;
                Some(v)
            }
            RealSeq::Random { n, i, source } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(source.next_double())
            }
            RealSeq::Normal { n, i, source } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(source.next_double())
            }
            RealSeq::Ar {
                n,
                i,
                coeffs,
                history,
                source,
            } => {
                if *i >= *n {
                    return None;
                }
                let mut x = source.next_double();
                for (j, c) in coeffs.iter().enumerate() {
                    if let Some(prev) = history.get(j) {
                        x += c * prev;
                    }
                }
                history.insert(0, x);
                history.truncate(coeffs.len());
                *i += 1;
                Some(x)
            }
            RealSeq::Ma {
                n,
                i,
                mean,
                coeffs,
                noise,
                source,
            } => {
                if *i >= *n {
                    return None;
                }
                let e = source.next_double();
                let mut x = *mean + e;
                for (j, c) in coeffs.iter().enumerate() {
                    if let Some(prev) = noise.get(j) {
                        x += c * prev;
                    }
                }
                noise.insert(0, e);
                noise.truncate(coeffs.len());
                *i += 1;
                Some(x)
            }
            RealSeq::Unfold {
                n,
                i,
                seed,
                state,
                f,
            } => {
                if *i >= *n {
                    return None;
                }
                let v = if *i == 0 {
                    *state = *seed;
                    *seed
                } else {
                    *state = f(*state);
                    *state
                };
                *i += 1;
                Some(v)
            }
            RealSeq::UnfoldIdx {
                n,
                i,
                seed,
                state,
                f,
            } => {
                if *i >= *n {
                    return None;
                }
                let v = if *i == 0 {
                    *state = *seed;
                    *seed
                } else {
                    *state = f(*i, *state);
                    *state
                };
                *i += 1;
                Some(v)
            }
            RealSeq::Unfold2 { n, i, seeds, state, f } => {
                if *i >= *n {
                    return None;
                }
                let v = match *i {
                    0 => {
                        *state = *seeds;
                        seeds.0
                    }
                    1 => seeds.1,
                    _ => {
                        let v = f(state.0, state.1);
                        *state = (state.1, v);
                        v
                    }
                };
                *i += 1;
                Some(v)
            }
            RealSeq::Mapped { source, f } => source.next().map(|x| f(x)),
            RealSeq::Filtered { source, p } => loop {
                match source.next() {
                    Some(x) if p(x) => return Some(x),
                    Some(_) => continue,
                    None => return None,
                }
            },
            RealSeq::FilteredMapped { source, p, f } => loop {
                match source.next() {
                    Some(x) if p(x) => return Some(f(x)),
                    Some(_) => continue,
                    None => return None,
                }
            },
            RealSeq::Zipped { a, b, f } => {
                let x = a.next()?;
                let y = b.next()?;
                Some(f(x, y))
            }
            RealSeq::TakeWhile { source, p, done } => {
                if *done {
                    return None;
                }
                match source.next() {
                    Some(x) if p(x) => Some(x),
                    _ => {
                        *done = true;
                        None
                    }
                }
            }
            RealSeq::UntilValue {
                source,
                sentinel,
                done,
            } => {
                if *done {
                    return None;
                }
                let x = source.next()?;
                if x == *sentinel {
                    *done = true;
                }
                Some(x)
            }
            RealSeq::UntilPred { source, p, done } => {
                if *done {
                    return None;
                }
                let x = source.next()?;
                if p(x) {
                    *done = true;
                }
                Some(x)
            }
            RealSeq::FromComplex { source, f } => source.next().map(|z| f(z)),
            RealSeq::FromInt { source, f } => source.next().map(|k| f(k)),
        }
    }

    fn reset(&mut self) {
        match self {
            RealSeq::Range { i, .. }
            | RealSeq::Grid { i, .. }
            | RealSeq::Repeat { i, .. }
            | RealSeq::Vector { i, .. }
            | RealSeq::Random { i, .. }
            | RealSeq::Normal { i, .. } => *i = 0,
            RealSeq::Ar { i, history, .. } => {
                *i = 0;
                history.clear();
            }
            RealSeq::Ma { i, noise, .. } => {
                *i = 0;
                noise.clear();
            }
            RealSeq::Unfold { i, seed, state, .. } | RealSeq::UnfoldIdx { i, seed, state, .. } => {
                *i = 0;
                *state = *seed;
            }
            RealSeq::Unfold2 { i, seeds, state, .. } => {
                *i = 0;
                *state = *seeds;
            }
            RealSeq::Mapped { source, .. } | RealSeq::Filtered { source, .. } => source.reset(),
            RealSeq::FilteredMapped { source, .. } => source.reset(),
            RealSeq::Zipped { a, b, .. } => {
                a.reset();
                b.reset();
            }
            RealSeq::TakeWhile { source, done, .. }
            | RealSeq::UntilValue { source, done, .. }
            | RealSeq::UntilPred { source, done, .. } => {
                source.reset();
                *done = false;
            }
            RealSeq::FromComplex { source, .. } => source.reset(),
            RealSeq::FromInt { source, .. } => source.reset(),
        }
    }

    fn has_length(&self) -> bool {
        self.exact_len().is_some()
    }

    fn has_storage(&self) -> bool {
        matches!(self, RealSeq::Vector { .. })
    }

    fn length(&mut self) -> usize {
        if let Some(n) = self.exact_len() {
            return n;
        }
        // Destructive fallback: drain what is left.
        let mut n = 0;
        while self.next().is_some() {
            n += 1;
        }
        n
    }

    fn materialize(&mut self) -> Vec<f64> {
        if let RealSeq::Vector { data, .. } = self {
            return data.as_slice().to_vec();
        }
        self.reset();
        let mut out = if self.has_length() {
            Vec::with_capacity(self.length())
        } else {
            Vec::new()
        };
        while let Some(x) = self.next() {
            out.push(x);
        }
        out
    }
}

//
// Combinators.
//

impl RealSeq {
    /// Applies `f` to every element. Mapping over a mapped or
    /// filtered-mapped sequence fuses into a single combinator.
    pub fn map(self, f: impl Fn(f64) -> f64 + 'static) -> RealSeq {
        let f: Map1 = Rc::new(f);
        match self {
            RealSeq::Mapped { source, f: g } => RealSeq::Mapped {
                source,
                f: Rc::new(move |x| f(g(x))),
            },
            RealSeq::FilteredMapped { source, p, f: g } => RealSeq::FilteredMapped {
                source,
                p,
                f: Rc::new(move |x| f(g(x))),
            },
            RealSeq::Filtered { source, p } => RealSeq::FilteredMapped { source, p, f },
            other => RealSeq::Mapped {
                source: Box::new(other),
                f,
            },
        }
    }

    /// Keeps elements satisfying `p`. Stacked filters compose predicates.
    pub fn filter(self, p: impl Fn(f64) -> bool + 'static) -> RealSeq {
        let p: Pred = Rc::new(p);
        match self {
            RealSeq::Filtered { source, p: q } => RealSeq::Filtered {
                source,
                p: Rc::new(move |x| q(x) && p(x)),
            },
            other => RealSeq::Filtered {
                source: Box::new(other),
                p,
            },
        }
    }

    pub fn zip(self, other: RealSeq, f: impl Fn(f64, f64) -> f64 + 'static) -> RealSeq {
        RealSeq::Zipped {
            a: Box::new(self),
            b: Box::new(other),
            f: Rc::new(f),
        }
    }

    pub fn take_while(self, p: impl Fn(f64) -> bool + 'static) -> RealSeq {
        RealSeq::TakeWhile {
            source: Box::new(self),
            p: Rc::new(p),
            done: false,
        }
    }

    pub fn until(self, p: impl Fn(f64) -> bool + 'static) -> RealSeq {
        RealSeq::UntilPred {
            source: Box::new(self),
            p: Rc::new(p),
            done: false,
        }
    }

    pub fn until_value(self, sentinel: f64) -> RealSeq {
        RealSeq::UntilValue {
            source: Box::new(self),
            sentinel,
            done: false,
        }
    }
}

//
// Random access, slicing, ordering.
//

impl RealSeq {
    /// Random access. O(1) for analytically described and vector-backed
    /// variants; iterates a fresh cursor otherwise.
    pub fn index(&self, idx: usize) -> Result<f64> {
        match self {
            RealSeq::Range { first, last, .. } => {
                let count = (*last as i64 - *first as i64).unsigned_abs() as usize + 1;
                if idx >= count {
                    return Err(Error::out_of_range(idx, count));
                }
                Ok(if last >= first {
                    (*first as i64 + idx as i64) as f64
                } else {
                    (*first as i64 - idx as i64) as f64
                })
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                if idx > *n {
                    return Err(Error::out_of_range(idx, n + 1));
                }
                Ok(*lower + Self::grid_delta(*lower, *upper, *n) * idx as f64)
            }
            RealSeq::Repeat { value, n, .. } => {
                if idx >= *n {
                    return Err(Error::out_of_range(idx, *n));
                }
                Ok(*value)
            }
            RealSeq::Vector { data, .. } => data.get(idx),
            _ => {
                let mut probe = self.clone();
                probe.reset();
                let mut seen = 0;
                while let Some(x) = probe.next() {
                    if seen == idx {
                        return Ok(x);
                    }
                    seen += 1;
                }
                Err(Error::out_of_range(idx, seen))
            }
        }
    }

    /// From-end random access: `index_back(0)` is the last element.
    pub fn index_back(&self, idx: usize) -> Result<f64> {
        if let Some(count) = self.exact_len() {
            if idx >= count {
                return Err(Error::out_of_range(idx, count));
            }
            return self.index(count - 1 - idx);
        }
        let mut probe = self.clone();
        let values = probe.materialize();
        if idx >= values.len() {
            return Err(Error::out_of_range(idx, values.len()));
        }
        Ok(values[values.len() - 1 - idx])
    }

    /// Sub-sequence `[start, end)`. Analytic variants restrict their
    /// parameters; everything else materializes and slices.
    pub fn range_of(self, start: usize, end: usize) -> Result<RealSeq> {
        if start > end {
            return Err(Error::invalid("slice start after end"));
        }
        if start == end {
            return Ok(RealSeq::from_values(Vec::new()));
        }
        match self {
            RealSeq::Range { first, last, .. } => {
                let count = (last as i64 - first as i64).unsigned_abs() as usize + 1;
                if end > count {
                    return Err(Error::out_of_range(end, count));
                }
                let (a, b) = if last >= first {
                    (first + start as i32, first + end as i32 - 1)
                } else {
                    (first - start as i32, first - (end as i32 - 1))
                };
                Ok(RealSeq::range(a, b))
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                if end > n + 1 {
                    return Err(Error::out_of_range(end, n + 1));
                }
                let delta = Self::grid_delta(lower, upper, n);
                Ok(RealSeq::grid(
                    lower + delta * start as f64,
                    end - 1 - start,
                    lower + delta * (end - 1) as f64,
                ))
            }
            RealSeq::Repeat { value, n, .. } => {
                if end > n {
                    return Err(Error::out_of_range(end, n));
                }
                Ok(RealSeq::repeat(end - start, value))
            }
            RealSeq::Vector { data, .. } => Ok(RealSeq::from_vector(data.slice(start, end)?)),
            mut other => {
                let values = other.materialize();
                if end > values.len() {
                    return Err(Error::out_of_range(end, values.len()));
                }
                Ok(RealSeq::from_values(values[start..end].to_vec()))
            }
        }
    }

    /// Unique values in stream order.
    pub fn distinct(self) -> RealSeq {
        match self {
            // Range and strict grids never repeat a value.
            RealSeq::Range { first, last, .. } => RealSeq::range(first, last),
            RealSeq::Grid { lower, upper, n, .. } if lower != upper || n == 0 => {
                RealSeq::grid(lower, n, upper)
            }
            RealSeq::Grid { lower, .. } => RealSeq::from_values(vec![lower]),
            RealSeq::Repeat { value, n, .. } => {
                if n == 0 {
                    RealSeq::from_values(Vec::new())
                } else {
                    RealSeq::from_values(vec![value])
                }
            }
            mut other => {
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for x in other.materialize() {
                    if seen.insert(x.to_bits()) {
                        out.push(x);
                    }
                }
                RealSeq::from_values(out)
            }
        }
    }

    pub fn sort(self) -> RealSeq {
        match self {
            RealSeq::Range { first, last, .. } => {
                RealSeq::range(first.min(last), first.max(last))
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                RealSeq::grid(lower.min(upper), n, lower.max(upper))
            }
            RealSeq::Repeat { value, n, .. } => RealSeq::repeat(n, value),
            mut other => {
                let mut values = other.materialize();
                values.sort_by(|a, b| a.total_cmp(b));
                RealSeq::from_values(values)
            }
        }
    }

    pub fn sort_desc(self) -> RealSeq {
        match self {
            RealSeq::Range { first, last, .. } => {
                RealSeq::range(first.max(last), first.min(last))
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                RealSeq::grid(lower.max(upper), n, lower.min(upper))
            }
            RealSeq::Repeat { value, n, .. } => RealSeq::repeat(n, value),
            mut other => {
                let mut values = other.materialize();
                values.sort_by(|a, b| b.total_cmp(a));
                RealSeq::from_values(values)
            }
        }
    }
}

//
// Reductions and quantifiers.
//

impl RealSeq {
    /// First element, or `NaN` when the sequence is empty.
    pub fn first(&mut self) -> f64 {
        self.reset();
        self.next().unwrap_or(f64::NAN)
    }

    /// Last element, or `NaN` when the sequence is empty.
    pub fn last(&mut self) -> f64 {
        match self {
            RealSeq::Range { .. }
            | RealSeq::Grid { .. }
            | RealSeq::Repeat { .. }
            | RealSeq::Vector { .. } => self.index_back(0).unwrap_or(f64::NAN),
            _ => {
                self.reset();
                let mut last = f64::NAN;
                while let Some(x) = self.next() {
                    last = x;
                }
                last
            }
        }
    }

    pub fn sum(&mut self) -> f64 {
        match self {
            // Closed forms.
            RealSeq::Range { first, last, .. } => {
                let count = (*last as i64 - *first as i64).unsigned_abs() + 1;
                (count as f64) * (*first as f64 + *last as f64) / 2.0
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                (*n as f64 + 1.0) * (*lower + *upper) / 2.0
            }
            RealSeq::Repeat { value, n, .. } => *value * *n as f64,
            // Storage: vectorized reduction.
            RealSeq::Vector { data, .. } => data.sum(),
            // Generic: iterate.
            _ => {
                self.reset();
                let mut total = 0.0;
                while let Some(x) = self.next() {
                    total += x;
                }
                total
            }
        }
    }

    pub fn product(&mut self) -> f64 {
        match self {
            RealSeq::Repeat { value, n, .. } => value.powi(*n as i32),
            RealSeq::Vector { data, .. } => data.product(),
            _ => {
                self.reset();
                let mut total = 1.0;
                while let Some(x) = self.next() {
                    total *= x;
                }
                total
            }
        }
    }

    pub fn min(&mut self) -> Result<f64> {
        match self {
            RealSeq::Range { first, last, .. } => Ok(*first.min(last) as f64),
            RealSeq::Grid { lower, upper, .. } => Ok(lower.min(*upper)),
            RealSeq::Repeat { value, n, .. } => {
                if *n == 0 {
                    Err(Error::EmptySequence("min"))
                } else {
                    Ok(*value)
                }
            }
            RealSeq::Vector { data, .. } => data.min(),
            _ => {
                self.reset();
                let mut best: Option<f64> = None;
                while let Some(x) = self.next() {
                    best = Some(match best {
                        Some(b) if b.total_cmp(&x).is_le() => b,
                        _ => x,
                    });
                }
                best.ok_or(Error::EmptySequence("min"))
            }
        }
    }

    pub fn max(&mut self) -> Result<f64> {
        match self {
            RealSeq::Range { first, last, .. } => Ok(*first.max(last) as f64),
            RealSeq::Grid { lower, upper, .. } => Ok(lower.max(*upper)),
            RealSeq::Repeat { value, n, .. } => {
                if *n == 0 {
                    Err(Error::EmptySequence("max"))
                } else {
                    Ok(*value)
                }
            }
            RealSeq::Vector { data, .. } => data.max(),
            _ => {
                self.reset();
                let mut best: Option<f64> = None;
                while let Some(x) = self.next() {
                    best = Some(match best {
                        Some(b) if b.total_cmp(&x).is_ge() => b,
                        _ => x,
                    });
                }
                best.ok_or(Error::EmptySequence("max"))
            }
        }
    }

    pub fn all(&mut self, p: impl Fn(f64) -> bool) -> bool {
        self.reset();
        while let Some(x) = self.next() {
            if !p(x) {
                return false;
            }
        }
        true
    }

    pub fn any(&mut self, p: impl Fn(f64) -> bool) -> bool {
        self.reset();
        while let Some(x) = self.next() {
            if p(x) {
                return true;
            }
        }
        false
    }

    pub fn reduce(&mut self, seed: f64, f: impl Fn(f64, f64) -> f64) -> f64 {
        self.reset();
        let mut acc = seed;
        while let Some(x) = self.next() {
            acc = f(acc, x);
        }
        acc
    }

    pub fn contains(&mut self, v: f64) -> bool {
        match self {
            // Arithmetic-progression membership.
            RealSeq::Range { first, last, .. } => {
                v.fract() == 0.0
                    && v >= *first.min(last) as f64
                    && v <= *first.max(last) as f64
            }
            RealSeq::Grid { lower, upper, n, .. } => {
                let delta = Self::grid_delta(*lower, *upper, *n);
                if delta == 0.0 {
                    return v == *lower;
                }
                let k = ((v - *lower) / delta).round();
                k >= 0.0 && k <= *n as f64 && *lower + delta * k == v
            }
            RealSeq::Repeat { value, n, .. } => *n > 0 && v == *value,
            // Storage: linear scan over the dense vector.
            RealSeq::Vector { data, .. } => data.contains(v),
            _ => self.any(|x| x == v),
        }
    }

    /// Running statistics over the whole stream.
    pub fn stats(&mut self) -> Accumulator {
        self.reset();
        let mut acc = Accumulator::new();
        while let Some(x) = self.next() {
            acc.push(x);
        }
        acc
    }

    /// Dot product. Storage on either side takes the vectorized path.
    pub fn dot(mut self, mut rhs: RealSeq) -> f64 {
        if self.has_storage() || rhs.has_storage() {
            // Vector path: materialize both, truncate to the shorter.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            return crate::simd::dot(&a[..n], &b[..n]);
        }
        // Lazy path: fused zip, then sum.
        self.zip(rhs, |x, y| x * y).sum()
    }

    pub fn to_vector(&mut self) -> RealVector {
        RealVector::new(self.materialize())
    }

    /// Real forward FFT of the materialized sequence.
    pub fn fft(&mut self) -> Spectrum {
        let data = self.materialize();
        Spectrum::from_real(&data)
    }
}

//
// Operators. Each binary operator picks one of three branches:
// analytic specialization, vectorized storage path, or fused lazy zip.
//

impl RealSeq {
    fn combine(
        mut self,
        mut rhs: RealSeq,
        vec_op: fn(&RealVector, &RealVector) -> RealVector,
        f: impl Fn(f64, f64) -> f64 + 'static,
    ) -> RealSeq {
        if self.has_storage() || rhs.has_storage() {
            // Storage on either side: vectorized path over the shorter length.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            let va = RealVector::new(a[..n].to_vec());
            let vb = RealVector::new(b[..n].to_vec());
            RealSeq::from_vector(vec_op(&va, &vb))
        } else {
            // No storage anywhere: stay lazy with a fused zip.
            self.zip(rhs, f)
        }
    }

    pub fn pointwise_multiply(self, rhs: RealSeq) -> RealSeq {
        self.combine(rhs, RealVector::mul, |x, y| x * y)
    }

    pub fn pointwise_divide(self, rhs: RealSeq) -> RealSeq {
        self.combine(rhs, RealVector::div, |x, y| x / y)
    }

    fn shift(self, s: f64) -> RealSeq {
        match self {
            // Analytic shifts.
            RealSeq::Range { first, last, .. } => {
                let n = (last as i64 - first as i64).unsigned_abs() as usize;
                RealSeq::grid(first as f64 + s, n, last as f64 + s)
            }
            RealSeq::Grid { lower, upper, n, .. } => RealSeq::grid(lower + s, n, upper + s),
            RealSeq::Repeat { value, n, .. } => RealSeq::repeat(n, value + s),
            // Storage: vectorized add-scalar.
            RealSeq::Vector { data, .. } => RealSeq::from_vector(data.add_scalar(s)),
            // Generic: fused lazy map.
            other => other.map(move |x| x + s),
        }
    }

    fn scale(self, s: f64) -> RealSeq {
        match self {
            RealSeq::Range { first, last, .. } => {
                let n = (last as i64 - first as i64).unsigned_abs() as usize;
                RealSeq::grid(first as f64 * s, n, last as f64 * s)
            }
            RealSeq::Grid { lower, upper, n, .. } => RealSeq::grid(lower * s, n, upper * s),
            RealSeq::Repeat { value, n, .. } => RealSeq::repeat(n, value * s),
            RealSeq::Vector { data, .. } => RealSeq::from_vector(data.scale(s)),
            other => other.map(move |x| x * s),
        }
    }
}

impl Add for RealSeq {
    type Output = RealSeq;

    fn add(self, rhs: RealSeq) -> RealSeq {
        self.combine(rhs, RealVector::add, |x, y| x + y)
    }
}

impl Sub for RealSeq {
    type Output = RealSeq;

    fn sub(self, rhs: RealSeq) -> RealSeq {
        self.combine(rhs, RealVector::sub, |x, y| x - y)
    }
}

/// `seq · seq` is the dot product.
impl Mul for RealSeq {
    type Output = f64;

    fn mul(self, rhs: RealSeq) -> f64 {
        self.dot(rhs)
    }
}

/// `seq / seq` is the pointwise division.
impl Div for RealSeq {
    type Output = RealSeq;

    fn div(self, rhs: RealSeq) -> RealSeq {
        self.pointwise_divide(rhs)
    }
}

impl Add<f64> for RealSeq {
    type Output = RealSeq;

    fn add(self, s: f64) -> RealSeq {
        self.shift(s)
    }
}

impl Add<RealSeq> for f64 {
    type Output = RealSeq;

    fn add(self, seq: RealSeq) -> RealSeq {
        seq.shift(self)
    }
}

impl Sub<f64> for RealSeq {
    type Output = RealSeq;

    fn sub(self, s: f64) -> RealSeq {
        self.shift(-s)
    }
}

impl Sub<RealSeq> for f64 {
    type Output = RealSeq;

    fn sub(self, seq: RealSeq) -> RealSeq {
        (-seq).shift(self)
    }
}

impl Mul<f64> for RealSeq {
    type Output = RealSeq;

    fn mul(self, s: f64) -> RealSeq {
        self.scale(s)
    }
}

impl Mul<RealSeq> for f64 {
    type Output = RealSeq;

    fn mul(self, seq: RealSeq) -> RealSeq {
        seq.scale(self)
    }
}

impl Div<f64> for RealSeq {
    type Output = RealSeq;

    fn div(self, s: f64) -> RealSeq {
        // Scalar division scales by the reciprocal; IEEE semantics apply.
        self.scale(1.0 / s)
    }
}

impl Div<RealSeq> for f64 {
    type Output = RealSeq;

    fn div(self, seq: RealSeq) -> RealSeq {
        match seq {
            RealSeq::Vector { data, .. } => {
                RealSeq::from_values(data.iter().map(|x| self / x).collect())
            }
            other => other.map(move |x| self / x),
        }
    }
}

impl Neg for RealSeq {
    type Output = RealSeq;

    fn neg(self) -> RealSeq {
        match self {
            // An ascending range negates into a descending one.
            RealSeq::Range { first, last, .. } => RealSeq::range(-first, -last),
            RealSeq::Grid { lower, upper, n, .. } => RealSeq::grid(-lower, n, -upper),
            RealSeq::Repeat { value, n, .. } => RealSeq::repeat(n, -value),
            RealSeq::Vector { data, .. } => RealSeq::from_vector(data.negate()),
            other => other.map(|x| -x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut s: RealSeq) -> Vec<f64> {
        s.materialize()
    }

    #[test]
    fn grid_materializes_evenly() {
        let s = RealSeq::grid(0.0, 4, 1.0);
        assert_eq!(drain(s), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn grid_sort_desc_leads_with_upper() {
        let mut s = RealSeq::grid(0.0, 4, 1.0).sort_desc();
        assert_eq!(s.first(), 1.0);
    }

    #[test]
    fn map_map_fuses_into_one_layer() {
        let s = RealSeq::range(1, 5).map(|x| x + 1.0).map(|x| x * 2.0);
        match &s {
            RealSeq::Mapped { source, .. } => {
                assert!(matches!(**source, RealSeq::Range { .. }));
            }
            _ => panic!("expected a single fused map layer"),
        }
        assert_eq!(drain(s), vec![4.0, 6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn filter_then_map_fuses() {
        let s = RealSeq::range(1, 10)
            .filter(|x| x % 2.0 == 0.0)
            .map(|x| x * x);
        match &s {
            RealSeq::FilteredMapped { source, .. } => {
                assert!(matches!(**source, RealSeq::Range { .. }));
            }
            _ => panic!("expected a fused filter-map"),
        }
        assert_eq!(drain(s), vec![4.0, 16.0, 36.0, 64.0, 100.0]);
    }

    #[test]
    fn reset_restores_the_canonical_stream() {
        let mut s = RealSeq::unfold(5, 1.0, |x| x * 2.0);
        s.next();
        s.next();
        s.reset();
        let mut out = Vec::new();
        while let Some(x) = s.next() {
            out.push(x);
        }
        assert_eq!(out, vec![1.0, 2.0, 4.0, 8.0, 16.0]);
    }

    #[test]
    fn unfold2_fibonacci() {
        let s = RealSeq::unfold2(8, 1.0, 1.0, |a, b| a + b);
        assert_eq!(drain(s), vec![1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]);
    }

    #[test]
    fn unfold_indexed_factorials() {
        let s = RealSeq::unfold_indexed(6, 1.0, |i, x| x * i as f64);
        assert_eq!(drain(s), vec![1.0, 1.0, 2.0, 6.0, 24.0, 120.0]);
    }

    #[test]
    fn zip_stops_at_the_shorter() {
        let s = RealSeq::range(1, 3).zip(RealSeq::range(10, 20), |a, b| a + b);
        assert_eq!(drain(s), vec![11.0, 13.0, 15.0]);
    }

    #[test]
    fn descending_range() {
        assert_eq!(drain(RealSeq::range(3, 1)), vec![3.0, 2.0, 1.0]);
        assert_eq!(drain(-RealSeq::range(1, 3)), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn sum_closed_forms() {
        assert_eq!(RealSeq::range(1, 100).sum(), 5050.0);
        assert_eq!(RealSeq::grid(0.0, 4, 1.0).sum(), 2.5);
        assert_eq!(RealSeq::repeat(4, 2.5).sum(), 10.0);
    }

    #[test]
    fn seq_plus_seq_matches_elementwise_sum() {
        let lazy = RealSeq::range(1, 5) + RealSeq::range(10, 14);
        assert!(matches!(lazy, RealSeq::Zipped { .. }));
        assert_eq!(drain(lazy), vec![11.0, 13.0, 15.0, 17.0, 19.0]);

        let stored = RealSeq::from_values(vec![1.0, 2.0]) + RealSeq::range(10, 14);
        assert!(stored.has_storage());
        assert_eq!(drain(stored), vec![11.0, 13.0]);
    }

    #[test]
    fn scalar_arithmetic_specializes() {
        let shifted = RealSeq::range(1, 4) + 0.5;
        assert!(matches!(shifted, RealSeq::Grid { .. }));
        assert_eq!(drain(shifted), vec![1.5, 2.5, 3.5, 4.5]);

        let scaled = RealSeq::grid(0.0, 2, 1.0) * 2.0;
        assert_eq!(drain(scaled), vec![0.0, 1.0, 2.0]);

        let repeat = RealSeq::repeat(3, 2.0) * 3.0;
        assert_eq!(drain(repeat), vec![6.0, 6.0, 6.0]);
    }

    #[test]
    fn dot_products_agree_across_branches() {
        let lazy = RealSeq::range(1, 3).dot(RealSeq::range(4, 6));
        let stored =
            RealSeq::from_values(vec![1.0, 2.0, 3.0]).dot(RealSeq::from_values(vec![4.0, 5.0, 6.0]));
        assert_eq!(lazy, 32.0);
        assert_eq!(stored, 32.0);
    }

    #[test]
    fn distinct_preserves_stream_order() {
        let s = RealSeq::from_values(vec![3.0, 1.0, 3.0, 2.0, 1.0]).distinct();
        assert_eq!(drain(s), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn min_max_and_empty_errors() {
        assert_eq!(RealSeq::range(3, 9).min().unwrap(), 3.0);
        assert_eq!(RealSeq::range(9, 3).max().unwrap(), 9.0);
        let mut empty = RealSeq::from_values(Vec::new());
        assert_eq!(empty.min(), Err(Error::EmptySequence("min")));
        assert!(empty.first().is_nan());
    }

    #[test]
    fn take_until_includes_the_sentinel() {
        let s = RealSeq::range(1, 10).until_value(4.0);
        assert_eq!(drain(s), vec![1.0, 2.0, 3.0, 4.0]);
        let s = RealSeq::range(1, 10).take_while(|x| x < 4.0);
        assert_eq!(drain(s), vec![1.0, 2.0, 3.0]);
        let s = RealSeq::range(1, 10).until(|x| x >= 4.0);
        assert_eq!(drain(s), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn indexing_and_slices() {
        let s = RealSeq::range(1, 10);
        assert_eq!(s.index(3).unwrap(), 4.0);
        assert_eq!(s.index_back(0).unwrap(), 10.0);
        assert!(s.index(10).is_err());

        let sliced = RealSeq::range(1, 10).range_of(2, 5).unwrap();
        assert_eq!(drain(sliced), vec![3.0, 4.0, 5.0]);

        let sliced = RealSeq::grid(0.0, 4, 1.0).range_of(1, 4).unwrap();
        assert_eq!(drain(sliced), vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn contains_on_progressions() {
        let mut r = RealSeq::range(1, 10);
        assert!(r.contains(7.0));
        assert!(!r.contains(7.5));
        let mut g = RealSeq::grid(0.0, 4, 1.0);
        assert!(g.contains(0.75));
        assert!(!g.contains(0.3));
    }

    #[test]
    fn ar_ma_reject_empty_coefficients() {
        assert!(RealSeq::ar(10, 1.0, &RealVector::default()).is_err());
        assert!(RealSeq::ma(10, 1.0, 0.0, &RealVector::default()).is_err());
    }

    #[test]
    fn ar_with_zero_coefficient_is_noise() {
        let src = Box::new(GaussianSource::with_seed(1.0, 42));
        let mut s = RealSeq::ar_with(100, &RealVector::new(vec![0.0]), src).unwrap();
        let v = s.materialize();
        assert_eq!(v.len(), 100);
        assert!(v.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn stats_of_a_range() {
        let acc = RealSeq::range(1, 5).stats();
        assert_eq!(acc.count(), 5);
        assert_eq!(acc.mean(), 3.0);
        assert_eq!(acc.min(), 1.0);
        assert_eq!(acc.max(), 5.0);
        assert!((acc.variance() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn materialize_matches_length() {
        let mut s = RealSeq::range(1, 7).map(|x| x * 2.0);
        assert!(s.has_length());
        let n = s.length();
        assert_eq!(s.materialize().len(), n);
    }

    #[test]
    fn filtered_length_is_destructive_fallback() {
        let mut s = RealSeq::range(1, 10).filter(|x| x % 2.0 == 0.0);
        assert!(!s.has_length());
        assert_eq!(s.length(), 5);
    }

    #[test]
    fn from_int_and_from_complex_cross_domains() {
        let s = RealSeq::from_int(IntSeq::range(1, 4), |k| k as f64 * 0.5);
        assert_eq!(drain(s), vec![0.5, 1.0, 1.5, 2.0]);

        let c = ComplexSeq::repeat(3, Complex64::new(3.0, 4.0));
        let s = RealSeq::from_complex(c, |z| z.norm());
        assert_eq!(drain(s), vec![5.0, 5.0, 5.0]);
    }
}
