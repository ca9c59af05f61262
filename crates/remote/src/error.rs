//! Remote Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A remote store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The delta cursor has been invalidated by the remote (listing history
    /// expired). Not a failure: the sync engine answers this with a full
    /// resync.
    #[display("cursor reset by remote")]
    CursorReset,
    /// No file exists at the given path.
    #[display("remote file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The remote asked us to slow down.
    #[display("rate limited by remote")]
    RateLimited,
    /// The call exceeded its configured deadline.
    #[display("remote call timed out")]
    Timeout,
    /// Transport-level failure (connection refused, TLS, DNS).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Path contains invalid characters or escapes the listing root.
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// The remote answered with something we could not interpret.
    #[display("protocol error: {_0}")]
    Protocol(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout | Self::Network(_))
    }
}
