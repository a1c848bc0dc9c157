use crate::error::{Error, Result};
use crate::fft::Spectrum;
use crate::random::{DefaultRandom, GaussianSource, NormalSource, RandomSource};
use crate::seq::{RealSeq, Sequence};
use crate::vector::ComplexVector;
use num_complex::Complex64;
use std::collections::HashSet;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

type Map1 = Rc<dyn Fn(Complex64) -> Complex64>;
type Map2 = Rc<dyn Fn(Complex64, Complex64) -> Complex64>;
type MapIdx = Rc<dyn Fn(usize, Complex64) -> Complex64>;
type Pred = Rc<dyn Fn(Complex64) -> bool>;

fn nan() -> Complex64 {
    Complex64::new(f64::NAN, f64::NAN)
}

/// Lazy sequence of `Complex64` values. The complex domain carries no
/// order, so there is no `min`/`max`/`sort`.
#[derive(Clone)]
pub enum ComplexSeq {
    /// `n+1` evenly spaced points on the segment `[lower, upper]`.
    Grid {
        lower: Complex64,
        upper: Complex64,
        n: usize,
        i: usize,
    },
    /// `n` copies of one value.
    Repeat {
        value: Complex64,
        n: usize,
        i: usize,
    },
    /// Backed by contiguous storage.
    Vector { data: ComplexVector, i: usize },
    /// `n` draws with independent uniform real and imaginary parts.
    Random {
        n: usize,
        i: usize,
        source: Box<dyn RandomSource>,
    },
    /// `n` draws with independent normal real and imaginary parts.
    Normal {
        n: usize,
        i: usize,
        source: Box<dyn NormalSource>,
    },
    /// `x[0] = seed; x[i+1] = f(x[i])`.
    Unfold {
        n: usize,
        i: usize,
        seed: Complex64,
        state: Complex64,
        f: Map1,
    },
    /// `x[0] = seed; x[i+1] = f(i+1, x[i])`.
    UnfoldIdx {
        n: usize,
        i: usize,
        seed: Complex64,
        state: Complex64,
        f: MapIdx,
    },
    /// Two seeds, `x[i+2] = f(x[i], x[i+1])`.
    Unfold2 {
        n: usize,
        i: usize,
        seeds: (Complex64, Complex64),
        state: (Complex64, Complex64),
        f: Map2,
    },
    Mapped {
        source: Box<ComplexSeq>,
        f: Map1,
    },
    Filtered {
        source: Box<ComplexSeq>,
        p: Pred,
    },
    FilteredMapped {
        source: Box<ComplexSeq>,
        p: Pred,
        f: Map1,
    },
    Zipped {
        a: Box<ComplexSeq>,
        b: Box<ComplexSeq>,
        f: Map2,
    },
    TakeWhile {
        source: Box<ComplexSeq>,
        p: Pred,
        done: bool,
    },
    UntilValue {
        source: Box<ComplexSeq>,
        sentinel: Complex64,
        done: bool,
    },
    UntilPred {
        source: Box<ComplexSeq>,
        p: Pred,
        done: bool,
    },
}

//
// Constructors.
//

impl ComplexSeq {
    pub fn grid(lower: Complex64, n: usize, upper: Complex64) -> ComplexSeq {
        ComplexSeq::Grid {
            lower,
            upper,
            n,
            i: 0,
        }
    }

    pub fn repeat(n: usize, value: Complex64) -> ComplexSeq {
        ComplexSeq::Repeat { value, n, i: 0 }
    }

    pub fn from_vector(data: ComplexVector) -> ComplexSeq {
        ComplexSeq::Vector { data, i: 0 }
    }

    pub fn from_values(values: Vec<Complex64>) -> ComplexSeq {
        Self::from_vector(ComplexVector::new(values))
    }

    pub fn random(n: usize) -> ComplexSeq {
        Self::random_with(n, Box::new(DefaultRandom::new()))
    }

    pub fn random_with(n: usize, source: Box<dyn RandomSource>) -> ComplexSeq {
        ComplexSeq::Random { n, i: 0, source }
    }

    pub fn normal_random(n: usize) -> ComplexSeq {
        Self::normal_random_with(n, Box::new(GaussianSource::standard()))
    }

    pub fn normal_random_with_variance(n: usize, variance: f64) -> ComplexSeq {
        Self::normal_random_with(n, Box::new(GaussianSource::new(variance)))
    }

    pub fn normal_random_with(n: usize, source: Box<dyn NormalSource>) -> ComplexSeq {
        ComplexSeq::Normal { n, i: 0, source }
    }

    pub fn unfold(
        n: usize,
        seed: Complex64,
        f: impl Fn(Complex64) -> Complex64 + 'static,
    ) -> ComplexSeq {
        ComplexSeq::Unfold {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold_indexed(
        n: usize,
        seed: Complex64,
        f: impl Fn(usize, Complex64) -> Complex64 + 'static,
    ) -> ComplexSeq {
        ComplexSeq::UnfoldIdx {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold2(
        n: usize,
        first: Complex64,
        second: Complex64,
        f: impl Fn(Complex64, Complex64) -> Complex64 + 'static,
    ) -> ComplexSeq {
        ComplexSeq::Unfold2 {
            n,
            i: 0,
            seeds: (first, second),
            state: (first, second),
            f: Rc::new(f),
        }
    }
}

impl ComplexSeq {
    pub(crate) fn exact_len(&self) -> Option<usize> {
        match self {
            ComplexSeq::Grid { n, .. } => Some(n + 1),
            ComplexSeq::Repeat { n, .. } => Some(*n),
            ComplexSeq::Vector { data, .. } => Some(data.len()),
            ComplexSeq::Random { n, .. }
            | ComplexSeq::Normal { n, .. }
            | ComplexSeq::Unfold { n, .. }
            | ComplexSeq::UnfoldIdx { n, .. }
            | ComplexSeq::Unfold2 { n, .. } => Some(*n),
            ComplexSeq::Mapped { source, .. } => source.exact_len(),
            ComplexSeq::Zipped { a, b, .. } => Some(a.exact_len()?.min(b.exact_len()?)),
            ComplexSeq::Filtered { .. }
            | ComplexSeq::FilteredMapped { .. }
            | ComplexSeq::TakeWhile { .. }
            | ComplexSeq::UntilValue { .. }
            | ComplexSeq::UntilPred { .. } => None,
        }
    }

    fn grid_delta(lower: Complex64, upper: Complex64, n: usize) -> Complex64 {
        if n == 0 {
            Complex64::default()
        } else {
            (upper - lower) / n as f64
        }
    }
}

impl Sequence for ComplexSeq {
    type Item = Complex64;

    fn next(&mut self) -> Option<Complex64> {
        match self {
            ComplexSeq::Grid { lower, upper, n, i } => {
                if *i > *n {
                    return None;
                }
                let v = *lower + Self::grid_delta(*lower, *upper, *n) * *i as f64;
                *i += 1;
                Some(v)
            }
            ComplexSeq::Repeat { value, n, i } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(*value)
            }
            ComplexSeq::Vector { data, i } => {
                if *i >= data.len() {
                    return None;
                }
                let v = data[*i];
                *i += 1;
                Some(v)
            }
            ComplexSeq::Random { n, i, source } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                let re = source.next_double();
                let im = source.next_double();
                Some(Complex64::new(re, im))
            }
            ComplexSeq::Normal { n, i, source } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                let (re, im) = source.next_pair();
                Some(Complex64::new(re, im))
            }
            ComplexSeq::Unfold {
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
            ComplexSeq::UnfoldIdx {
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
            ComplexSeq::Unfold2 { n, i, seeds, state, f } => {
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
            ComplexSeq::Mapped { source, f } => source.next().map(|z| f(z)),
            ComplexSeq::Filtered { source, p } => loop {
                match source.next() {
                    Some(z) if p(z) => return Some(z),
                    Some(_) => continue,
                    None => return None,
                }
            },
            ComplexSeq::FilteredMapped { source, p, f } => loop {
                match source.next() {
                    Some(z) if p(z) => return Some(f(z)),
                    Some(_) => continue,
                    None => return None,
                }
            },
            ComplexSeq::Zipped { a, b, f } => {
                let x = a.next()?;
                let y = b.next()?;
                Some(f(x, y))
            }
            ComplexSeq::TakeWhile { source, p, done } => {
                if *done {
                    return None;
                }
                match source.next() {
                    Some(z) if p(z) => Some(z),
                    _ => {
                        *done = true;
                        None
                    }
                }
            }
            ComplexSeq::UntilValue {
                source,
                sentinel,
                done,
            } => {
                if *done {
                    return None;
                }
                let z = source.next()?;
                if z == *sentinel {
                    *done = true;
                }
                Some(z)
            }
            ComplexSeq::UntilPred { source, p, done } => {
                if *done {
                    return None;
                }
                let z = source.next()?;
                if p(z) {
                    *done = true;
                }
                Some(z)
            }
        }
    }

    fn reset(&mut self) {
        match self {
            ComplexSeq::Grid { i, .. }
            | ComplexSeq::Repeat { i, .. }
            | ComplexSeq::Vector { i, .. }
            | ComplexSeq::Random { i, .. }
            | ComplexSeq::Normal { i, .. } => *i = 0,
            ComplexSeq::Unfold { i, seed, state, .. }
            | ComplexSeq::UnfoldIdx { i, seed, state, .. } => {
                *i = 0;
                *state = *seed;
            }
            ComplexSeq::Unfold2 { i, seeds, state, .. } => {
                *i = 0;
                *state = *seeds;
            }
            ComplexSeq::Mapped { source, .. }
            | ComplexSeq::Filtered { source, .. }
            | ComplexSeq::FilteredMapped { source, .. } => source.reset(),
            ComplexSeq::Zipped { a, b, .. } => {
                a.reset();
                b.reset();
            }
            ComplexSeq::TakeWhile { source, done, .. }
            | ComplexSeq::UntilValue { source, done, .. }
            | ComplexSeq::UntilPred { source, done, .. } => {
                source.reset();
                *done = false;
            }
        }
    }

    fn has_length(&self) -> bool {
        self.exact_len().is_some()
    }

    fn has_storage(&self) -> bool {
        matches!(self, ComplexSeq::Vector { .. })
    }

    fn length(&mut self) -> usize {
        if let Some(n) = self.exact_len() {
            return n;
        }
        let mut n = 0;
        while self.next().is_some() {
            n += 1;
        }
        n
    }

    fn materialize(&mut self) -> Vec<Complex64> {
        if let ComplexSeq::Vector { data, .. } = self {
            return data.as_slice().to_vec();
        }
        self.reset();
        let mut out = if self.has_length() {
            Vec::with_capacity(self.length())
        } else {
            Vec::new()
        };
        while let Some(z) = self.next() {
            out.push(z);
        }
        out
    }
}

//
// Combinators.
//

impl ComplexSeq {
    pub fn map(self, f: impl Fn(Complex64) -> Complex64 + 'static) -> ComplexSeq {
        let f: Map1 = Rc::new(f);
        match self {
            ComplexSeq::Mapped { source, f: g } => ComplexSeq::Mapped {
                source,
                f: Rc::new(move |z| f(g(z))),
            },
            ComplexSeq::FilteredMapped { source, p, f: g } => ComplexSeq::FilteredMapped {
                source,
                p,
                f: Rc::new(move |z| f(g(z))),
            },
            ComplexSeq::Filtered { source, p } => ComplexSeq::FilteredMapped { source, p, f },
            other => ComplexSeq::Mapped {
                source: Box::new(other),
                f,
            },
        }
    }

    pub fn filter(self, p: impl Fn(Complex64) -> bool + 'static) -> ComplexSeq {
        let p: Pred = Rc::new(p);
        match self {
            ComplexSeq::Filtered { source, p: q } => ComplexSeq::Filtered {
                source,
                p: Rc::new(move |z| q(z) && p(z)),
            },
            other => ComplexSeq::Filtered {
                source: Box::new(other),
                p,
            },
        }
    }

    pub fn zip(
        self,
        other: ComplexSeq,
        f: impl Fn(Complex64, Complex64) -> Complex64 + 'static,
    ) -> ComplexSeq {
        ComplexSeq::Zipped {
            a: Box::new(self),
            b: Box::new(other),
            f: Rc::new(f),
        }
    }

    pub fn take_while(self, p: impl Fn(Complex64) -> bool + 'static) -> ComplexSeq {
        ComplexSeq::TakeWhile {
            source: Box::new(self),
            p: Rc::new(p),
            done: false,
        }
    }

    pub fn until(self, p: impl Fn(Complex64) -> bool + 'static) -> ComplexSeq {
        ComplexSeq::UntilPred {
            source: Box::new(self),
            p: Rc::new(p),
            done: false,
        }
    }

    pub fn until_value(self, sentinel: Complex64) -> ComplexSeq {
        ComplexSeq::UntilValue {
            source: Box::new(self),
            sentinel,
            done: false,
        }
    }

    /// Real view of the element magnitudes.
    pub fn magnitudes(self) -> RealSeq {
        RealSeq::from_complex(self, |z| z.norm())
    }

    /// Real view of the element phases.
    pub fn phases(self) -> RealSeq {
        RealSeq::from_complex(self, |z| z.arg())
    }
}

//
// Random access, slicing, distinct.
//

impl ComplexSeq {
    pub fn index(&self, idx: usize) -> Result<Complex64> {
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => {
                if idx > *n {
                    return Err(Error::out_of_range(idx, n + 1));
                }
                Ok(*lower + Self::grid_delta(*lower, *upper, *n) * idx as f64)
            }
            ComplexSeq::Repeat { value, n, .. } => {
                if idx >= *n {
                    return Err(Error::out_of_range(idx, *n));
                }
                Ok(*value)
            }
            ComplexSeq::Vector { data, .. } => data.get(idx),
            _ => {
                let mut probe = self.clone();
                probe.reset();
                let mut seen = 0;
                while let Some(z) = probe.next() {
                    if seen == idx {
                        return Ok(z);
                    }
                    seen += 1;
                }
                Err(Error::out_of_range(idx, seen))
            }
        }
    }

    pub fn index_back(&self, idx: usize) -> Result<Complex64> {
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

    pub fn range_of(self, start: usize, end: usize) -> Result<ComplexSeq> {
        if start > end {
            return Err(Error::invalid("slice start after end"));
        }
        if start == end {
            return Ok(ComplexSeq::from_values(Vec::new()));
        }
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => {
                if end > n + 1 {
                    return Err(Error::out_of_range(end, n + 1));
                }
                let delta = Self::grid_delta(lower, upper, n);
                Ok(ComplexSeq::grid(
                    lower + delta * start as f64,
                    end - 1 - start,
                    lower + delta * (end - 1) as f64,
                ))
            }
            ComplexSeq::Repeat { value, n, .. } => {
                if end > n {
                    return Err(Error::out_of_range(end, n));
                }
                Ok(ComplexSeq::repeat(end - start, value))
            }
            ComplexSeq::Vector { data, .. } => Ok(ComplexSeq::from_vector(data.slice(start, end)?)),
            mut other => {
                let values = other.materialize();
                if end > values.len() {
                    return Err(Error::out_of_range(end, values.len()));
                }
                Ok(ComplexSeq::from_values(values[start..end].to_vec()))
            }
        }
    }

    /// Unique values in stream order.
    pub fn distinct(self) -> ComplexSeq {
        match self {
            ComplexSeq::Repeat { value, n, .. } => {
                if n == 0 {
                    ComplexSeq::from_values(Vec::new())
                } else {
                    ComplexSeq::from_values(vec![value])
                }
            }
            mut other => {
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for z in other.materialize() {
                    if seen.insert((z.re.to_bits(), z.im.to_bits())) {
                        out.push(z);
                    }
                }
                ComplexSeq::from_values(out)
            }
        }
    }
}

//
// Reductions and quantifiers.
//

impl ComplexSeq {
    /// First element, or `NaN+i·NaN` when the sequence is empty.
    pub fn first(&mut self) -> Complex64 {
        self.reset();
        self.next().unwrap_or_else(nan)
    }

    /// Last element, or `NaN+i·NaN` when the sequence is empty.
    pub fn last(&mut self) -> Complex64 {
        match self {
            ComplexSeq::Grid { .. } | ComplexSeq::Repeat { .. } | ComplexSeq::Vector { .. } => {
                self.index_back(0).unwrap_or_else(|_| nan())
            }
            _ => {
                self.reset();
                let mut last = nan();
                while let Some(z) = self.next() {
                    last = z;
                }
                last
            }
        }
    }

    pub fn sum(&mut self) -> Complex64 {
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => {
                (*lower + *upper) * ((*n as f64 + 1.0) / 2.0)
            }
            ComplexSeq::Repeat { value, n, .. } => *value * *n as f64,
            ComplexSeq::Vector { data, .. } => data.sum(),
            _ => {
                self.reset();
                let mut total = Complex64::default();
                while let Some(z) = self.next() {
                    total += z;
                }
                total
            }
        }
    }

    pub fn product(&mut self) -> Complex64 {
        match self {
            // Integer power of the repeated value.
            ComplexSeq::Repeat { value, n, .. } => value.powu(*n as u32),
            ComplexSeq::Vector { data, .. } => data.product(),
            _ => {
                self.reset();
                let mut total = Complex64::new(1.0, 0.0);
                while let Some(z) = self.next() {
                    total *= z;
                }
                total
            }
        }
    }

    pub fn all(&mut self, p: impl Fn(Complex64) -> bool) -> bool {
        self.reset();
        while let Some(z) = self.next() {
            if !p(z) {
                return false;
            }
        }
        true
    }

    pub fn any(&mut self, p: impl Fn(Complex64) -> bool) -> bool {
        self.reset();
        while let Some(z) = self.next() {
            if p(z) {
                return true;
            }
        }
        false
    }

    pub fn reduce(
        &mut self,
        seed: Complex64,
        f: impl Fn(Complex64, Complex64) -> Complex64,
    ) -> Complex64 {
        self.reset();
        let mut acc = seed;
        while let Some(z) = self.next() {
            acc = f(acc, z);
        }
        acc
    }

    pub fn contains(&mut self, v: Complex64) -> bool {
        match self {
            ComplexSeq::Repeat { value, n, .. } => *n > 0 && v == *value,
            ComplexSeq::Vector { data, .. } => data.contains(v),
            _ => self.any(|z| z == v),
        }
    }

    /// Hermitian dot product `Σ xᵢ·conj(yᵢ)`.
    pub fn dot(mut self, mut rhs: ComplexSeq) -> Complex64 {
        if self.has_storage() || rhs.has_storage() {
            // Vector path.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            return ComplexVector::new(a[..n].to_vec()).dot(&ComplexVector::new(b[..n].to_vec()));
        }
        // Lazy path: fused conjugating zip, then sum.
        self.zip(rhs, |x, y| x * y.conj()).sum()
    }

    pub fn to_vector(&mut self) -> ComplexVector {
        ComplexVector::new(self.materialize())
    }

    /// Complex forward FFT of the materialized sequence.
    pub fn fft(&mut self) -> Spectrum {
        let data = self.materialize();
        Spectrum::from_complex(data)
    }
}

//
// Operators: analytic specialization > vector path > fused lazy zip.
//

impl ComplexSeq {
    fn combine(
        mut self,
        mut rhs: ComplexSeq,
        vec_op: fn(&ComplexVector, &ComplexVector) -> ComplexVector,
        f: impl Fn(Complex64, Complex64) -> Complex64 + 'static,
    ) -> ComplexSeq {
        if self.has_storage() || rhs.has_storage() {
            // Storage on either side: vector path over the shorter length.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            let va = ComplexVector::new(a[..n].to_vec());
            let vb = ComplexVector::new(b[..n].to_vec());
            ComplexSeq::from_vector(vec_op(&va, &vb))
        } else {
            // Fused lazy zip.
            self.zip(rhs, f)
        }
    }

    pub fn pointwise_multiply(self, rhs: ComplexSeq) -> ComplexSeq {
        self.combine(rhs, ComplexVector::mul, |x, y| x * y)
    }

    pub fn pointwise_divide(self, rhs: ComplexSeq) -> ComplexSeq {
        self.combine(rhs, ComplexVector::div, |x, y| x / y)
    }

    fn shift(self, s: Complex64) -> ComplexSeq {
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => ComplexSeq::grid(lower + s, n, upper + s),
            ComplexSeq::Repeat { value, n, .. } => ComplexSeq::repeat(n, value + s),
            ComplexSeq::Vector { data, .. } => ComplexSeq::from_vector(data.add_scalar(s)),
            other => other.map(move |z| z + s),
        }
    }

    fn scale(self, s: Complex64) -> ComplexSeq {
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => ComplexSeq::grid(lower * s, n, upper * s),
            ComplexSeq::Repeat { value, n, .. } => ComplexSeq::repeat(n, value * s),
            ComplexSeq::Vector { data, .. } => ComplexSeq::from_vector(data.scale(s)),
            other => other.map(move |z| z * s),
        }
    }
}

impl Add for ComplexSeq {
    type Output = ComplexSeq;

    fn add(self, rhs: ComplexSeq) -> ComplexSeq {
        self.combine(rhs, ComplexVector::add, |x, y| x + y)
    }
}

impl Sub for ComplexSeq {
    type Output = ComplexSeq;

    fn sub(self, rhs: ComplexSeq) -> ComplexSeq {
        self.combine(rhs, ComplexVector::sub, |x, y| x - y)
    }
}

/// `seq · seq` is the Hermitian dot product.
impl Mul for ComplexSeq {
    type Output = Complex64;

    fn mul(self, rhs: ComplexSeq) -> Complex64 {
        self.dot(rhs)
    }
}

/// `seq / seq` is the pointwise division.
impl Div for ComplexSeq {
    type Output = ComplexSeq;

    fn div(self, rhs: ComplexSeq) -> ComplexSeq {
        self.pointwise_divide(rhs)
    }
}

impl Add<Complex64> for ComplexSeq {
    type Output = ComplexSeq;

    fn add(self, s: Complex64) -> ComplexSeq {
        self.shift(s)
    }
}

impl Sub<Complex64> for ComplexSeq {
    type Output = ComplexSeq;

    fn sub(self, s: Complex64) -> ComplexSeq {
        self.shift(-s)
    }
}

impl Mul<Complex64> for ComplexSeq {
    type Output = ComplexSeq;

    fn mul(self, s: Complex64) -> ComplexSeq {
        self.scale(s)
    }
}

impl Div<Complex64> for ComplexSeq {
    type Output = ComplexSeq;

    fn div(self, s: Complex64) -> ComplexSeq {
        self.scale(s.finv())
    }
}

impl Neg for ComplexSeq {
    type Output = ComplexSeq;

    fn neg(self) -> ComplexSeq {
        match self {
            ComplexSeq::Grid { lower, upper, n, .. } => ComplexSeq::grid(-lower, n, -upper),
            ComplexSeq::Repeat { value, n, .. } => ComplexSeq::repeat(n, -value),
            ComplexSeq::Vector { data, .. } => ComplexSeq::from_vector(data.negate()),
            other => other.map(|z| -z),
        }
    }
}
