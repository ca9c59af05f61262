use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A run is already active. Surface to the caller immediately, never
    /// queue behind the current run.
    #[display("another processing run is already active")]
    Conflict,
    /// The remote store failed in a way the sync engine could not absorb.
    #[display("remote store error")]
    Remote,
    /// The local inventory failed. Fatal for the operation that needed it.
    #[display("inventory store error")]
    Store,
    /// The vector index failed.
    #[display("vector store error")]
    Vector,
    /// Enrichment failed for one file. Recorded against that file; sibling
    /// files in the batch are unaffected.
    #[display("enrichment failed for {_0}")]
    Enrichment(#[error(not(source))] String),
    /// The run was stopped on request. A control signal, not a failure.
    #[display("processing run stopped")]
    Stopped,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote | Self::Enrichment(_))
    }
}
