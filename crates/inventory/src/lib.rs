//! SQLite inventory mirroring the remote media listing.
//!
//! The inventory is not the source of truth; the remote store is. If the
//! database is deleted, the next sync pass rebuilds it from a full listing.
//!
//! # Architecture
//! - **Files**: one row per remote media file, keyed by normalized path.
//!   Upserts are idempotent so sync pages can be re-applied safely.
//! - **Metadata**: key/value bookkeeping (last sync timestamps, the delta
//!   cursor), readable and writable independently of file rows.

mod cursor;
mod db;
pub mod error;
mod models;
mod repo;

pub use crate::cursor::CursorStore;
pub use crate::db::Database;
pub use crate::models::{InventoryFile, InventoryStats, SyncCursor};
pub use crate::repo::Repository;
