use clap::{Parser, Subcommand, ValueEnum};
use glimpse_remote::FileKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "glimpse", version, about = "Mirror a remote media store and enrich it with captions, tags, and embeddings")]
pub struct Cli {
    /// Path to the configuration file. Defaults to the platform config dir.
    #[arg(long, short = 'c', global = true, env = "GLIMPSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synchronize the local inventory with the remote listing.
    Sync,
    /// Run the enrichment pipeline.
    Process {
        /// What to process.
        #[arg(long, value_enum, default_value_t = ProcessMode::Smart)]
        mode: ProcessMode,
        /// Restrict the run to one media kind.
        #[arg(long)]
        kind: Option<MediaKind>,
    },
    /// Show the state of the current (or last) processing run.
    Status,
    /// Show inventory statistics.
    Stats,
    /// Wipe the local inventory and sync cursor. The next sync is a full
    /// resync; the vector index is untouched.
    ClearCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProcessMode {
    /// Sync, then enrich everything after a full resync or only the
    /// changes after a delta.
    Smart,
    /// Enrich every inventory row without syncing.
    All,
    /// Sync, then enrich only what changed.
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Image,
    Video,
}

impl From<MediaKind> for FileKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image,
            MediaKind::Video => Self::Video,
        }
    }
}
