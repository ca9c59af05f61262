//! The glimpse pipeline: delta sync, dedup, enrichment, and run control.
//!
//! # Architecture
//! - [`sync::SyncEngine`] pages the remote listing into the inventory,
//!   continuing from a persisted cursor when it can and falling back to a
//!   full resync when it cannot.
//! - [`dedup::DedupPolicy`] decides per file whether enrichment work is
//!   needed at all.
//! - [`process::FileProcessor`] runs the caption/tags/embedding workflow
//!   for one file; [`coordinator::Coordinator`] fans it out in bounded
//!   batches under the run state machine in [`run`].

pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod process;
pub mod run;
pub mod sync;

pub use crate::coordinator::{Coordinator, RunHandle, RunReport};
pub use crate::dedup::{DedupDecision, DedupPolicy};
pub use crate::process::{FileOutcome, FileProcessor};
pub use crate::run::{ProcessingRun, RunControl, RunStatus};
pub use crate::sync::{MediaFilter, SyncEngine, SyncOutcome};
