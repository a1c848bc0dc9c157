use thiserror::Error;

/// Errors surfaced by sequence operations and FFT entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Indexing or slicing a sequence at an invalid position.
    #[error("index {index} out of range for sequence of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// `min`/`max` on a sequence that yields nothing.
    #[error("empty sequence has no {0}")]
    EmptySequence(&'static str),

    /// A constructor argument outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
