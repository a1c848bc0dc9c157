use crate::error::{Error, Result};
use crate::random::{DefaultRandom, RandomSource};
use crate::seq::Sequence;
use crate::stats::Accumulator;
use crate::vector::{ComplexVector, IntVector, RealVector};
use num_complex::Complex64;
use std::collections::HashSet;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

type Map1 = Rc<dyn Fn(i32) -> i32>;
type Map2 = Rc<dyn Fn(i32, i32) -> i32>;
type MapIdx = Rc<dyn Fn(usize, i32) -> i32>;
type Pred = Rc<dyn Fn(i32) -> bool>;

/// Lazy sequence of `i32` values.
///
/// Reductions (`sum`, `product`, `dot`) widen to `i64`; elements stay `i32`.
#[derive(Clone)]
pub enum IntSeq {
    /// Integers `[first, last]`, ascending or descending.
    Range { first: i32, last: i32, i: usize },
    /// Stepped progression `first, first+step, …` bounded by `last`.
    /// A negative step is the negated form and only arises internally.
    Grid {
        first: i32,
        last: i32,
        step: i32,
        i: usize,
    },
    /// `n` copies of one value.
    Repeat { value: i32, n: usize, i: usize },
    /// Backed by contiguous storage.
    Vector { data: IntVector, i: usize },
    /// `n` uniform draws in `[lo, hi)`.
    Random {
        n: usize,
        lo: i32,
        hi: i32,
        i: usize,
        source: Box<dyn RandomSource>,
    },
    /// `x[0] = seed; x[i+1] = f(x[i])`.
    Unfold {
        n: usize,
        i: usize,
        seed: i32,
        state: i32,
        f: Map1,
    },
    /// `x[0] = seed; x[i+1] = f(i+1, x[i])`.
    UnfoldIdx {
        n: usize,
        i: usize,
        seed: i32,
        state: i32,
        f: MapIdx,
    },
    /// Two seeds, `x[i+2] = f(x[i], x[i+1])`.
    Unfold2 {
        n: usize,
        i: usize,
        seeds: (i32, i32),
        state: (i32, i32),
        f: Map2,
    },
    Mapped {
        source: Box<IntSeq>,
        f: Map1,
    },
    Filtered {
        source: Box<IntSeq>,
        p: Pred,
    },
    FilteredMapped {
        source: Box<IntSeq>,
        p: Pred,
        f: Map1,
    },
    Zipped {
        a: Box<IntSeq>,
        b: Box<IntSeq>,
        f: Map2,
    },
    /// Successive indices at which a value occurs in a real vector.
    FindReal {
        data: RealVector,
        target: f64,
        i: usize,
    },
    /// Successive indices satisfying a predicate over a real vector.
    FindRealWhere {
        data: RealVector,
        p: Rc<dyn Fn(f64) -> bool>,
        i: usize,
    },
    /// Successive indices at which a value occurs in a complex vector.
    FindComplex {
        data: ComplexVector,
        target: Complex64,
        i: usize,
    },
    /// Successive indices satisfying a predicate over a complex vector.
    FindComplexWhere {
        data: ComplexVector,
        p: Rc<dyn Fn(Complex64) -> bool>,
        i: usize,
    },
}

//
// Constructors.
//

impl IntSeq {
    pub fn range(first: i32, last: i32) -> IntSeq {
        IntSeq::Range { first, last, i: 0 }
    }

    /// Stepped progression; the step must be positive.
    pub fn grid(first: i32, step: i32, last: i32) -> Result<IntSeq> {
        if step <= 0 {
            return Err(Error::invalid("grid step must be positive"));
        }
        Ok(IntSeq::Grid {
            first,
            last,
            step,
            i: 0,
        })
    }

    pub fn repeat(n: usize, value: i32) -> IntSeq {
        IntSeq::Repeat { value, n, i: 0 }
    }

    pub fn from_vector(data: IntVector) -> IntSeq {
        IntSeq::Vector { data, i: 0 }
    }

    pub fn from_values(values: Vec<i32>) -> IntSeq {
        Self::from_vector(IntVector::new(values))
    }

    pub fn random(n: usize, lo: i32, hi: i32) -> IntSeq {
        Self::random_with(n, lo, hi, Box::new(DefaultRandom::new()))
    }

    pub fn random_with(n: usize, lo: i32, hi: i32, source: Box<dyn RandomSource>) -> IntSeq {
        IntSeq::Random {
            n,
            lo,
            hi,
            i: 0,
            source,
        }
    }

    pub fn unfold(n: usize, seed: i32, f: impl Fn(i32) -> i32 + 'static) -> IntSeq {
        IntSeq::Unfold {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold_indexed(n: usize, seed: i32, f: impl Fn(usize, i32) -> i32 + 'static) -> IntSeq {
        IntSeq::UnfoldIdx {
            n,
            i: 0,
            seed,
            state: seed,
            f: Rc::new(f),
        }
    }

    pub fn unfold2(
        n: usize,
        first: i32,
        second: i32,
        f: impl Fn(i32, i32) -> i32 + 'static,
    ) -> IntSeq {
        IntSeq::Unfold2 {
            n,
            i: 0,
            seeds: (first, second),
            state: (first, second),
            f: Rc::new(f),
        }
    }

    /// Indices at which `target` occurs in `data`, in stream order.
    pub fn find(data: RealVector, target: f64) -> IntSeq {
        IntSeq::FindReal { data, target, i: 0 }
    }

    pub fn find_where(data: RealVector, p: impl Fn(f64) -> bool + 'static) -> IntSeq {
        IntSeq::FindRealWhere {
            data,
            p: Rc::new(p),
            i: 0,
        }
    }

    pub fn find_complex(data: ComplexVector, target: Complex64) -> IntSeq {
        IntSeq::FindComplex { data, target, i: 0 }
    }

    pub fn find_complex_where(
        data: ComplexVector,
        p: impl Fn(Complex64) -> bool + 'static,
    ) -> IntSeq {
        IntSeq::FindComplexWhere {
            data,
            p: Rc::new(p),
            i: 0,
        }
    }
}

//
// Progression helpers.
//

fn grid_count(first: i32, last: i32, step: i32) -> usize {
    if step > 0 {
        if last < first {
            0
        } else {
            ((last as i64 - first as i64) / step as i64) as usize + 1
        }
    } else if last > first {
        0
    } else {
        ((first as i64 - last as i64) / (-step) as i64) as usize + 1
    }
}

fn grid_value(first: i32, step: i32, i: usize) -> i32 {
    (first as i64 + step as i64 * i as i64) as i32
}

impl IntSeq {
    pub(crate) fn exact_len(&self) -> Option<usize> {
        match self {
            IntSeq::Range { first, last, .. } => {
                Some((*last as i64 - *first as i64).unsigned_abs() as usize + 1)
            }
            IntSeq::Grid {
                first, last, step, ..
            } => Some(grid_count(*first, *last, *step)),
            IntSeq::Repeat { n, .. } => Some(*n),
            IntSeq::Vector { data, .. } => Some(data.len()),
            IntSeq::Random { n, .. }
            | IntSeq::Unfold { n, .. }
            | IntSeq::UnfoldIdx { n, .. }
            | IntSeq::Unfold2 { n, .. } => Some(*n),
            IntSeq::Mapped { source, .. } => source.exact_len(),
            IntSeq::Zipped { a, b, .. } => Some(a.exact_len()?.min(b.exact_len()?)),
            IntSeq::Filtered { .. }
            | IntSeq::FilteredMapped { .. }
            | IntSeq::FindReal { .. }
            | IntSeq::FindRealWhere { .. }
            | IntSeq::FindComplex { .. }
            | IntSeq::FindComplexWhere { .. } => None,
        }
    }
}

impl Sequence for IntSeq {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        match self {
            IntSeq::Range { first, last, i } => {
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
                Some(v as i32)
            }
            IntSeq::Grid {
                first, last, step, i,
            } => {
                if *i >= grid_count(*first, *last, *step) {
                    return None;
                }
                let v = grid_value(*first, *step, *i);
                *i += 1;
                Some(v)
            }
            IntSeq::Repeat { value, n, i } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(*value)
            }
            IntSeq::Vector { data, i } => {
                if *i >= data.len() {
                    return None;
                }
                let v = data[*i];
                *i += 1;
                Some(v)
            }
            IntSeq::Random {
                n,
                lo,
                hi,
                i,
                source,
            } => {
                if *i >= *n {
                    return None;
                }
                *i += 1;
                Some(source.next_int(*lo, *hi))
            }
            IntSeq::Unfold {
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
            IntSeq::UnfoldIdx {
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
            IntSeq::Unfold2 { n, i, seeds, state, f } => {
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
            IntSeq::Mapped { source, f } => source.next().map(|x| f(x)),
            IntSeq::Filtered { source, p } => loop {
                match source.next() {
                    Some(x) if p(x) => return Some(x),
                    Some(_) => continue,
                    None => return None,
                }
            },
            IntSeq::FilteredMapped { source, p, f } => loop {
                match source.next() {
                    Some(x) if p(x) => return Some(f(x)),
                    Some(_) => continue,
                    None => return None,
                }
            },
            IntSeq::Zipped { a, b, f } => {
                let x = a.next()?;
                let y = b.next()?;
                Some(f(x, y))
            }
            IntSeq::FindReal { data, target, i } => {
                while *i < data.len() {
                    let at = *i;
                    *i += 1;
                    if data[at] == *target {
                        return Some(at as i32);
                    }
                }
                None
            }
            IntSeq::FindRealWhere { data, p, i } => {
                while *i < data.len() {
                    let at = *i;
                    *i += 1;
                    if p(data[at]) {
                        return Some(at as i32);
                    }
                }
                None
            }
            IntSeq::FindComplex { data, target, i } => {
                while *i < data.len() {
                    let at = *i;
                    *i += 1;
                    if data[at] == *target {
                        return Some(at as i32);
                    }
                }
                None
            }
            IntSeq::FindComplexWhere { data, p, i } => {
                while *i < data.len() {
                    let at = *i;
                    *i += 1;
                    if p(data[at]) {
                        return Some(at as i32);
                    }
                }
                None
            }
        }
    }

    fn reset(&mut self) {
        match self {
            IntSeq::Range { i, .. }
            | IntSeq::Grid { i, .. }
            | IntSeq::Repeat { i, .. }
            | IntSeq::Vector { i, .. }
            | IntSeq::Random { i, .. }
            | IntSeq::FindReal { i, .. }
            | IntSeq::FindRealWhere { i, .. }
            | IntSeq::FindComplex { i, .. }
            | IntSeq::FindComplexWhere { i, .. } => *i = 0,
            IntSeq::Unfold { i, seed, state, .. } | IntSeq::UnfoldIdx { i, seed, state, .. } => {
                *i = 0;
                *state = *seed;
            }
            IntSeq::Unfold2 { i, seeds, state, .. } => {
                *i = 0;
                *state = *seeds;
            }
            IntSeq::Mapped { source, .. }
            | IntSeq::Filtered { source, .. }
            | IntSeq::FilteredMapped { source, .. } => source.reset(),
            IntSeq::Zipped { a, b, .. } => {
                a.reset();
                b.reset();
            }
        }
    }

    fn has_length(&self) -> bool {
        self.exact_len().is_some()
    }

    fn has_storage(&self) -> bool {
        matches!(self, IntSeq::Vector { .. })
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

    fn materialize(&mut self) -> Vec<i32> {
        if let IntSeq::Vector { data, .. } = self {
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

impl IntSeq {
    /// Applies `f` to every element; fuses with an existing map layer.
    pub fn map(self, f: impl Fn(i32) -> i32 + 'static) -> IntSeq {
        let f: Map1 = Rc::new(f);
        match self {
            IntSeq::Mapped { source, f: g } => IntSeq::Mapped {
                source,
                f: Rc::new(move |x| f(g(x))),
            },
            IntSeq::FilteredMapped { source, p, f: g } => IntSeq::FilteredMapped {
                source,
                p,
                f: Rc::new(move |x| f(g(x))),
            },
            IntSeq::Filtered { source, p } => IntSeq::FilteredMapped { source, p, f },
            other => IntSeq::Mapped {
                source: Box::new(other),
                f,
            },
        }
    }

    pub fn filter(self, p: impl Fn(i32) -> bool + 'static) -> IntSeq {
        let p: Pred = Rc::new(p);
        match self {
            IntSeq::Filtered { source, p: q } => IntSeq::Filtered {
                source,
                p: Rc::new(move |x| q(x) && p(x)),
            },
            other => IntSeq::Filtered {
                source: Box::new(other),
                p,
            },
        }
    }

    pub fn zip(self, other: IntSeq, f: impl Fn(i32, i32) -> i32 + 'static) -> IntSeq {
        IntSeq::Zipped {
            a: Box::new(self),
            b: Box::new(other),
            f: Rc::new(f),
        }
    }
}

//
// Random access, slicing, ordering.
//

impl IntSeq {
    pub fn index(&self, idx: usize) -> Result<i32> {
        match self {
            IntSeq::Range { first, last, .. } => {
                let count = (*last as i64 - *first as i64).unsigned_abs() as usize + 1;
                if idx >= count {
                    return Err(Error::out_of_range(idx, count));
                }
                Ok(if last >= first {
                    (*first as i64 + idx as i64) as i32
                } else {
                    (*first as i64 - idx as i64) as i32
                })
            }
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(*first, *last, *step);
                if idx >= count {
                    return Err(Error::out_of_range(idx, count));
                }
                Ok(grid_value(*first, *step, idx))
            }
            IntSeq::Repeat { value, n, .. } => {
                if idx >= *n {
                    return Err(Error::out_of_range(idx, *n));
                }
                Ok(*value)
            }
            IntSeq::Vector { data, .. } => data.get(idx),
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

    pub fn index_back(&self, idx: usize) -> Result<i32> {
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

    pub fn range_of(self, start: usize, end: usize) -> Result<IntSeq> {
        if start > end {
            return Err(Error::invalid("slice start after end"));
        }
        if start == end {
            return Ok(IntSeq::from_values(Vec::new()));
        }
        match self {
            IntSeq::Range { first, last, .. } => {
                let count = (last as i64 - first as i64).unsigned_abs() as usize + 1;
                if end > count {
                    return Err(Error::out_of_range(end, count));
                }
                let (a, b) = if last >= first {
                    (first + start as i32, first + end as i32 - 1)
                } else {
                    (first - start as i32, first - (end as i32 - 1))
                };
                Ok(IntSeq::range(a, b))
            }
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(first, last, step);
                if end > count {
                    return Err(Error::out_of_range(end, count));
                }
                Ok(IntSeq::Grid {
                    first: grid_value(first, step, start),
                    last: grid_value(first, step, end - 1),
                    step,
                    i: 0,
                })
            }
            IntSeq::Repeat { value, n, .. } => {
                if end > n {
                    return Err(Error::out_of_range(end, n));
                }
                Ok(IntSeq::repeat(end - start, value))
            }
            IntSeq::Vector { data, .. } => Ok(IntSeq::from_vector(data.slice(start, end)?)),
            mut other => {
                let values = other.materialize();
                if end > values.len() {
                    return Err(Error::out_of_range(end, values.len()));
                }
                Ok(IntSeq::from_values(values[start..end].to_vec()))
            }
        }
    }

    /// Unique values in stream order.
    pub fn distinct(self) -> IntSeq {
        match self {
            IntSeq::Range { first, last, .. } => IntSeq::range(first, last),
            IntSeq::Grid { .. } => {
                let mut g = self;
                g.reset();
                g
            }
            IntSeq::Repeat { value, n, .. } => {
                if n == 0 {
                    IntSeq::from_values(Vec::new())
                } else {
                    IntSeq::from_values(vec![value])
                }
            }
            mut other => {
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for x in other.materialize() {
                    if seen.insert(x) {
                        out.push(x);
                    }
                }
                IntSeq::from_values(out)
            }
        }
    }

    pub fn sort(self) -> IntSeq {
        match self {
            IntSeq::Range { first, last, .. } => IntSeq::range(first.min(last), first.max(last)),
            IntSeq::Grid {
                first, last, step, ..
            } => {
                if step > 0 {
                    IntSeq::Grid {
                        first,
                        last,
                        step,
                        i: 0,
                    }
                } else {
                    let count = grid_count(first, last, step);
                    IntSeq::Grid {
                        first: grid_value(first, step, count.saturating_sub(1)),
                        last: first,
                        step: -step,
                        i: 0,
                    }
                }
            }
            IntSeq::Repeat { value, n, .. } => IntSeq::repeat(n, value),
            mut other => {
                let mut values = other.materialize();
                values.sort_unstable();
                IntSeq::from_values(values)
            }
        }
    }

    pub fn sort_desc(self) -> IntSeq {
        match self {
            IntSeq::Range { first, last, .. } => IntSeq::range(first.max(last), first.min(last)),
            IntSeq::Grid {
                first, last, step, ..
            } => {
                if step < 0 {
                    IntSeq::Grid {
                        first,
                        last,
                        step,
                        i: 0,
                    }
                } else {
                    let count = grid_count(first, last, step);
                    IntSeq::Grid {
                        first: grid_value(first, step, count.saturating_sub(1)),
                        last: first,
                        step: -step,
                        i: 0,
                    }
                }
            }
            IntSeq::Repeat { value, n, .. } => IntSeq::repeat(n, value),
            mut other => {
                let mut values = other.materialize();
                values.sort_unstable_by(|a, b| b.cmp(a));
                IntSeq::from_values(values)
            }
        }
    }
}

//
// Reductions and quantifiers.
//

impl IntSeq {
    /// First element, or `0` when the sequence is empty.
    pub fn first(&mut self) -> i32 {
        self.reset();
        self.next().unwrap_or(0)
    }

    /// Last element, or `0` when the sequence is empty.
    pub fn last(&mut self) -> i32 {
        match self {
            IntSeq::Range { .. }
            | IntSeq::Grid { .. }
            | IntSeq::Repeat { .. }
            | IntSeq::Vector { .. } => self.index_back(0).unwrap_or(0),
            _ => {
                self.reset();
                let mut last = 0;
                while let Some(x) = self.next() {
                    last = x;
                }
                last
            }
        }
    }

    pub fn sum(&mut self) -> i64 {
        match self {
            // Arithmetic-progression closed forms.
            IntSeq::Range { first, last, .. } => {
                let count = (*last as i64 - *first as i64).unsigned_abs() as i64 + 1;
                count * (*first as i64 + *last as i64) / 2
            }
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(*first, *last, *step) as i64;
                count * (2 * *first as i64 + *step as i64 * (count - 1)) / 2
            }
            IntSeq::Repeat { value, n, .. } => *value as i64 * *n as i64,
            // Storage: vector reduction.
            IntSeq::Vector { data, .. } => data.sum(),
            _ => {
                self.reset();
                let mut total = 0i64;
                while let Some(x) = self.next() {
                    total += x as i64;
                }
                total
            }
        }
    }

    pub fn product(&mut self) -> i64 {
        match self {
            IntSeq::Repeat { value, n, .. } => (*value as i64).pow(*n as u32),
            IntSeq::Vector { data, .. } => data.product(),
            _ => {
                self.reset();
                let mut total = 1i64;
                while let Some(x) = self.next() {
                    total *= x as i64;
                }
                total
            }
        }
    }

    pub fn min(&mut self) -> Result<i32> {
        match self {
            IntSeq::Range { first, last, .. } => Ok(*first.min(last)),
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(*first, *last, *step);
                if count == 0 {
                    return Err(Error::EmptySequence("min"));
                }
                let end = grid_value(*first, *step, count - 1);
                Ok((*first).min(end))
            }
            IntSeq::Repeat { value, n, .. } => {
                if *n == 0 {
                    Err(Error::EmptySequence("min"))
                } else {
                    Ok(*value)
                }
            }
            IntSeq::Vector { data, .. } => data.min(),
            _ => {
                self.reset();
                let mut best: Option<i32> = None;
                while let Some(x) = self.next() {
                    best = Some(best.map_or(x, |b| b.min(x)));
                }
                best.ok_or(Error::EmptySequence("min"))
            }
        }
    }

    pub fn max(&mut self) -> Result<i32> {
        match self {
            IntSeq::Range { first, last, .. } => Ok(*first.max(last)),
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(*first, *last, *step);
                if count == 0 {
                    return Err(Error::EmptySequence("max"));
                }
                let end = grid_value(*first, *step, count - 1);
                Ok((*first).max(end))
            }
            IntSeq::Repeat { value, n, .. } => {
                if *n == 0 {
                    Err(Error::EmptySequence("max"))
                } else {
                    Ok(*value)
                }
            }
            IntSeq::Vector { data, .. } => data.max(),
            _ => {
                self.reset();
                let mut best: Option<i32> = None;
                while let Some(x) = self.next() {
                    best = Some(best.map_or(x, |b| b.max(x)));
                }
                best.ok_or(Error::EmptySequence("max"))
            }
        }
    }

    pub fn all(&mut self, p: impl Fn(i32) -> bool) -> bool {
        self.reset();
        while let Some(x) = self.next() {
            if !p(x) {
                return false;
            }
        }
        true
    }

    pub fn any(&mut self, p: impl Fn(i32) -> bool) -> bool {
        self.reset();
        while let Some(x) = self.next() {
            if p(x) {
                return true;
            }
        }
        false
    }

    pub fn reduce(&mut self, seed: i32, f: impl Fn(i32, i32) -> i32) -> i32 {
        self.reset();
        let mut acc = seed;
        while let Some(x) = self.next() {
            acc = f(acc, x);
        }
        acc
    }

    pub fn contains(&mut self, v: i32) -> bool {
        match self {
            IntSeq::Range { first, last, .. } => {
                v >= *first.min(last) && v <= *first.max(last)
            }
            IntSeq::Grid {
                first, last, step, ..
            } => {
                let count = grid_count(*first, *last, *step);
                if count == 0 {
                    return false;
                }
                let end = grid_value(*first, *step, count - 1);
                let (lo, hi) = ((*first).min(end), (*first).max(end));
                v >= lo && v <= hi && (v as i64 - *first as i64) % *step as i64 == 0
            }
            IntSeq::Repeat { value, n, .. } => *n > 0 && v == *value,
            IntSeq::Vector { data, .. } => data.contains(v),
            _ => self.any(|x| x == v),
        }
    }

    pub fn stats(&mut self) -> Accumulator {
        self.reset();
        let mut acc = Accumulator::new();
        while let Some(x) = self.next() {
            acc.push(x as f64);
        }
        acc
    }

    /// Dot product, widened to `i64`.
    pub fn dot(mut self, mut rhs: IntSeq) -> i64 {
        if self.has_storage() || rhs.has_storage() {
            // Vector path.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            return IntVector::new(a[..n].to_vec()).dot(&IntVector::new(b[..n].to_vec()));
        }
        // Lazy path: lockstep consumption, widening while accumulating.
        self.reset();
        rhs.reset();
        let mut total = 0i64;
        while let (Some(x), Some(y)) = (self.next(), rhs.next()) {
            total += x as i64 * y as i64;
        }
        total
    }

    pub fn to_vector(&mut self) -> IntVector {
        IntVector::new(self.materialize())
    }
}

//
// Operators: analytic specialization > vector path > fused lazy zip.
//

impl IntSeq {
    fn combine(
        mut self,
        mut rhs: IntSeq,
        vec_op: fn(&IntVector, &IntVector) -> IntVector,
        f: impl Fn(i32, i32) -> i32 + 'static,
    ) -> IntSeq {
        if self.has_storage() || rhs.has_storage() {
            // Storage on either side: vector path over the shorter length.
            let a = self.materialize();
            let b = rhs.materialize();
            let n = a.len().min(b.len());
            let va = IntVector::new(a[..n].to_vec());
            let vb = IntVector::new(b[..n].to_vec());
            IntSeq::from_vector(vec_op(&va, &vb))
        } else {
            // Fused lazy zip.
            self.zip(rhs, f)
        }
    }

    pub fn pointwise_multiply(self, rhs: IntSeq) -> IntSeq {
        self.combine(rhs, IntVector::mul, |x, y| x * y)
    }

    pub fn pointwise_divide(self, rhs: IntSeq) -> IntSeq {
        self.combine(rhs, IntVector::div, |x, y| x / y)
    }

    fn shift(self, s: i32) -> IntSeq {
        match self {
            // Analytic shifts keep the progression shape.
            IntSeq::Range { first, last, .. } => IntSeq::range(first + s, last + s),
            IntSeq::Grid {
                first, last, step, ..
            } => IntSeq::Grid {
                first: first + s,
                last: last + s,
                step,
                i: 0,
            },
            IntSeq::Repeat { value, n, .. } => IntSeq::repeat(n, value + s),
            // Storage path.
            IntSeq::Vector { data, .. } => IntSeq::from_vector(data.add_scalar(s)),
            other => other.map(move |x| x + s),
        }
    }

    fn scale(self, s: i32) -> IntSeq {
        match self {
            IntSeq::Range { first, last, .. } => {
                if s == 0 {
                    let count = (last as i64 - first as i64).unsigned_abs() as usize + 1;
                    IntSeq::repeat(count, 0)
                } else {
                    // A descending range walks by −1, so its scaled step
                    // flips sign with the direction.
                    let step = if last >= first { s } else { -s };
                    IntSeq::Grid {
                        first: first * s,
                        last: last * s,
                        step,
                        i: 0,
                    }
                }
            }
            IntSeq::Grid {
                first, last, step, ..
            } => {
                if s == 0 {
                    IntSeq::repeat(grid_count(first, last, step), 0)
                } else {
                    IntSeq::Grid {
                        first: first * s,
                        last: last * s,
                        step: step * s,
                        i: 0,
                    }
                }
            }
            IntSeq::Repeat { value, n, .. } => IntSeq::repeat(n, value * s),
            IntSeq::Vector { data, .. } => IntSeq::from_vector(data.scale(s)),
            other => other.map(move |x| x * s),
        }
    }
}

impl Add for IntSeq {
    type Output = IntSeq;

    fn add(self, rhs: IntSeq) -> IntSeq {
        self.combine(rhs, IntVector::add, |x, y| x + y)
    }
}

impl Sub for IntSeq {
    type Output = IntSeq;

    fn sub(self, rhs: IntSeq) -> IntSeq {
        self.combine(rhs, IntVector::sub, |x, y| x - y)
    }
}

/// `seq · seq` is the dot product.
impl Mul for IntSeq {
    type Output = i64;

    fn mul(self, rhs: IntSeq) -> i64 {
        self.dot(rhs)
    }
}

/// `seq / seq` is the pointwise division.
impl Div for IntSeq {
    type Output = IntSeq;

    fn div(self, rhs: IntSeq) -> IntSeq {
        self.pointwise_divide(rhs)
    }
}

impl Add<i32> for IntSeq {
    type Output = IntSeq;

    fn add(self, s: i32) -> IntSeq {
        self.shift(s)
    }
}

impl Add<IntSeq> for i32 {
    type Output = IntSeq;

    fn add(self, seq: IntSeq) -> IntSeq {
        seq.shift(self)
    }
}

impl Sub<i32> for IntSeq {
    type Output = IntSeq;

    fn sub(self, s: i32) -> IntSeq {
        self.shift(-s)
    }
}

impl Sub<IntSeq> for i32 {
    type Output = IntSeq;

    fn sub(self, seq: IntSeq) -> IntSeq {
        (-seq).shift(self)
    }
}

impl Mul<i32> for IntSeq {
    type Output = IntSeq;

    fn mul(self, s: i32) -> IntSeq {
        self.scale(s)
    }
}

impl Mul<IntSeq> for i32 {
    type Output = IntSeq;

    fn mul(self, seq: IntSeq) -> IntSeq {
        seq.scale(self)
    }
}

impl Div<i32> for IntSeq {
    type Output = IntSeq;

    fn div(self, s: i32) -> IntSeq {
        match self {
            IntSeq::Vector { data, .. } => {
                IntSeq::from_values(data.iter().map(|x| x / s).collect())
            }
            other => other.map(move |x| x / s),
        }
    }
}

impl Neg for IntSeq {
    type Output = IntSeq;

    fn neg(self) -> IntSeq {
        match self {
            IntSeq::Range { first, last, .. } => IntSeq::range(-first, -last),
            IntSeq::Grid {
                first, last, step, ..
            } => IntSeq::Grid {
                first: -first,
                last: -last,
                step: -step,
                i: 0,
            },
            IntSeq::Repeat { value, n, .. } => IntSeq::repeat(n, -value),
            IntSeq::Vector { data, .. } => IntSeq::from_vector(data.negate()),
            other => other.map(|x| -x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut s: IntSeq) -> Vec<i32> {
        s.materialize()
    }

    #[test]
    fn range_sum_product_index() {
        let mut r = IntSeq::range(1, 10);
        assert_eq!(r.sum(), 55);
        assert_eq!(r.product(), 3_628_800);
        assert_eq!(r.index(3).unwrap(), 4);
    }

    #[test]
    fn even_squares_sum_widens() {
        let total = IntSeq::range(1, 1000)
            .filter(|x| x % 2 == 0)
            .map(|x| x * x)
            .sum();
        assert_eq!(total, 166_666_500_000);
    }

    #[test]
    fn repeat_laws() {
        let mut r = IntSeq::repeat(5, 3);
        assert_eq!(r.product(), 243);
        assert_eq!(drain(IntSeq::repeat(5, 3).distinct()), vec![3]);
    }

    #[test]
    fn stepped_grid() {
        let g = IntSeq::grid(1, 3, 11).unwrap();
        assert_eq!(drain(g.clone()), vec![1, 4, 7, 10]);
        let mut g2 = g.clone();
        assert_eq!(g2.sum(), 22);
        assert!(g2.contains(7));
        assert!(!g2.contains(8));
        assert!(IntSeq::grid(1, -2, 9).is_err());
        assert!(IntSeq::grid(1, 0, 9).is_err());
    }

    #[test]
    fn negated_grid_roundtrips_through_sort() {
        let g = -IntSeq::grid(1, 3, 11).unwrap();
        assert_eq!(drain(g.clone()), vec![-1, -4, -7, -10]);
        assert_eq!(drain(g.clone().sort()), vec![-10, -7, -4, -1]);
        assert_eq!(drain(g.sort_desc()), vec![-1, -4, -7, -10]);
    }

    #[test]
    fn fusion_matches_real_engine() {
        let s = IntSeq::range(1, 5).map(|x| x + 1).map(|x| x * 2);
        match &s {
            IntSeq::Mapped { source, .. } => {
                assert!(matches!(**source, IntSeq::Range { .. }));
            }
            _ => panic!("expected one fused map layer"),
        }
        assert_eq!(drain(s), vec![4, 6, 8, 10, 12]);
    }

    #[test]
    fn scaling_respects_direction() {
        assert_eq!(drain(IntSeq::range(3, 1) * 2), vec![6, 4, 2]);
        assert_eq!(drain(IntSeq::range(1, 3) * -2), vec![-2, -4, -6]);
    }

    #[test]
    fn scalar_scale_by_zero_collapses_to_repeat() {
        let s = IntSeq::range(1, 4) * 0;
        assert!(matches!(s, IntSeq::Repeat { value: 0, n: 4, .. }));
    }

    #[test]
    fn index_finders_walk_matches() {
        let data = RealVector::new(vec![1.0, 5.0, 2.0, 5.0, 5.0]);
        let s = IntSeq::find(data.clone(), 5.0);
        assert_eq!(drain(s), vec![1, 3, 4]);

        let s = IntSeq::find_where(data, |x| x > 1.5);
        assert_eq!(drain(s), vec![1, 2, 3, 4]);

        let cdata = ComplexVector::new(vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 1.0),
            Complex64::new(0.0, 0.0),
        ]);
        let s = IntSeq::find_complex(cdata, Complex64::new(0.0, 0.0));
        assert_eq!(drain(s), vec![0, 2]);
    }

    #[test]
    fn random_draws_respect_bounds() {
        let src = Box::new(crate::random::DefaultRandom::with_seed(3));
        let mut s = IntSeq::random_with(200, -4, 4, src);
        assert!(s.all(|x| (-4..4).contains(&x)));
    }

    #[test]
    fn zip_and_arithmetic() {
        let s = IntSeq::range(1, 3) + IntSeq::range(10, 12);
        assert_eq!(drain(s), vec![11, 13, 15]);
        assert_eq!(IntSeq::range(1, 3) * IntSeq::range(4, 6), 32);

        let stored = IntSeq::from_values(vec![1, 2, 3]) - IntSeq::range(0, 2);
        assert!(stored.has_storage());
        assert_eq!(drain(stored), vec![1, 1, 1]);
    }

    #[test]
    fn empty_sequence_sentinels() {
        let mut s = IntSeq::from_values(Vec::new());
        assert_eq!(s.first(), 0);
        assert_eq!(s.last(), 0);
        assert_eq!(s.sum(), 0);
        assert_eq!(s.product(), 1);
        assert!(s.min().is_err());
    }
}
