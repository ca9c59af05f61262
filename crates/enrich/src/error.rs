use derive_more::{Display, Error};

/// An enrichment error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories for the enrichment backends.
///
/// All of these are scoped to the file being enriched. The pipeline records
/// them against that file and moves on; none of them abort a run.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("caption backend error: {_0}")]
    Caption(#[error(not(source))] String),
    #[display("embedding backend error: {_0}")]
    Embedding(#[error(not(source))] String),
    #[display("frame extraction error: {_0}")]
    Frame(#[error(not(source))] String),
    #[display("enrichment backend timed out")]
    Timeout,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Backend calls go over the network, so everything here is worth one
    /// more attempt on a later run.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
