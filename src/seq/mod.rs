//! Lazy numeric sequences.
//!
//! Each element domain (`i32`, `f64`, `Complex64`) has a tagged-variant
//! engine implementing the common [`Sequence`] protocol, with per-variant
//! analytic fast paths for reductions and operators. Sequence graphs are
//! trees: combinators own their upstream sources.

mod complex;
mod int;
mod real;

pub use complex::ComplexSeq;
pub use int::IntSeq;
pub use real::RealSeq;

/// Common stream protocol shared by the three sequence engines.
///
/// A sequence starts *Pristine*, moves to *Consuming* on the first `next`
/// and to *Exhausted* when `next` reports end-of-stream; `reset` restores
/// *Pristine* from any state.
pub trait Sequence {
    type Item: Copy;

    /// Advance the cursor, returning the next value or end-of-stream.
    fn next(&mut self) -> Option<Self::Item>;

    /// Restore the cursor to its initial position. Fused combinators
    /// forward the reset to all upstream sources.
    fn reset(&mut self);

    /// True when `length` is exact and non-destructive.
    fn has_length(&self) -> bool;

    /// True when the sequence is backed by contiguous storage that can be
    /// returned without iteration cost. Implies `has_length`.
    fn has_storage(&self) -> bool;

    /// Element count. Exact and cheap when `has_length`; otherwise falls
    /// back to draining the stream, so callers that intend to keep
    /// consuming must not rely on it.
    fn length(&mut self) -> usize;

    /// Eagerly evaluate into a fresh array of `length()` values.
    fn materialize(&mut self) -> Vec<Self::Item> {
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
