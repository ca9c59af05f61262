use derive_more::{Display, Error};

/// A vector-store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for vector-store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Attempted to persist a record with an empty embedding. Callers are
    /// expected to skip such files instead of storing them.
    #[display("record for {_0} has no embedding")]
    EmptyEmbedding(#[error(not(source))] String),
    /// The backing index could not be reached or answered incoherently.
    #[display("vector store backend error: {_0}")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
