//! Wiring: configuration to collaborators to coordinator.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use glimpse_config::Config;
use glimpse_enrich::mock::{MockCaptioner, MockEmbedder, MockFrameExtractor};
use glimpse_enrich::FramePolicy;
use glimpse_inventory::{CursorStore, Database, Repository};
use glimpse_pipeline::{Coordinator, DedupPolicy, FileProcessor, MediaFilter, SyncEngine};
use glimpse_remote::client::MockRemote;
use glimpse_remote::RemoteHandle;
use glimpse_vector::MemoryVectorStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct App {
    pub db: Database,
    pub repo: Repository,
    pub coordinator: Arc<Coordinator>,
}

impl App {
    pub async fn build(config_file: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_file).or_raise(|| ErrorKind::Config)?;
        let db_path = config.database_path().or_raise(|| ErrorKind::Config)?;
        debug!(path = %db_path.display(), "opening inventory database");
        let db = Database::connect(&db_path).await.or_raise(|| ErrorKind::Store)?;
        let repo = Repository::from(&db);
        let remote = Self::remote_for(&config)?;

        let filter = MediaFilter {
            image_extensions: config.media.image_extensions.clone(),
            video_extensions: config.media.video_extensions.clone(),
        };
        let root_prefix = match config.remote.root_prefix.is_empty() {
            true => None,
            false => Some(config.remote.root_prefix.clone()),
        };
        let sync = SyncEngine::new(
            remote.clone(),
            repo.clone(),
            CursorStore::from(&db),
            filter,
            root_prefix,
        );
        let processor = FileProcessor::new(
            remote,
            Arc::new(MockCaptioner::new()),
            Arc::new(MockEmbedder::new()),
            Arc::new(MockFrameExtractor::new()),
            Arc::new(MemoryVectorStore::new()),
            DedupPolicy {
                skip_duplicates: config.processing.skip_duplicates,
                track_fingerprint: config.processing.track_fingerprint,
            },
            FramePolicy {
                interval_secs: config.video.frame_interval_secs,
                max_frames: config.video.max_frames,
            },
            config.captioning.use_thumbnails,
            config.captioning.thumbnail_size,
        );
        let coordinator = Arc::new(Coordinator::new(
            sync,
            repo.clone(),
            processor,
            config.processing.batch_size,
            std::time::Duration::from_secs(config.processing.file_timeout_secs),
            config.processing.analysis_enabled,
        ));
        Ok(Self { db, repo, coordinator })
    }

    /// The configured remote connector. Real connectors register here;
    /// the in-process mock is the only built-in. The connector classifies
    /// against the configured media sets, so a non-default extension is
    /// listed rather than dropped at the source.
    fn remote_for(config: &Config) -> Result<RemoteHandle> {
        match config.remote.provider.as_str() {
            "mock" => Ok(Arc::new(MockRemote::new().with_extensions(
                config.media.image_extensions.iter().map(String::as_str),
                config.media.video_extensions.iter().map(String::as_str),
            ))),
            other => Err(exn::Exn::from(ErrorKind::UnknownProvider(other.to_string()))),
        }
    }
}
