//! Layered configuration for the glimpse pipeline.
//!
//! Settings are merged from three layers, later layers winning:
//!
//! 1. compiled-in defaults,
//! 2. a TOML file (explicit path, or the platform config directory),
//! 3. `GLIMPSE_`-prefixed environment variables, with `__` separating
//!    nesting levels (e.g. `GLIMPSE_PROCESSING__BATCH_SIZE=10`).

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use glimpse_remote::{ThumbnailSize, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "GLIMPSE_";
const QUALIFIER: (&str, &str, &str) = ("", "", "glimpse");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub remote: RemoteConfig,
    pub database: DatabaseConfig,
    pub processing: ProcessingConfig,
    pub captioning: CaptioningConfig,
    pub video: VideoConfig,
    pub media: MediaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            database: DatabaseConfig::default(),
            processing: ProcessingConfig::default(),
            captioning: CaptioningConfig::default(),
            video: VideoConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Which remote connector to use. Only the in-process "mock" provider
    /// ships with the binary; deployments plug real connectors in here.
    pub provider: String,
    /// Folder prefix all listings are restricted to. Empty means the root.
    pub root_prefix: String,
    /// Upper bound on any single remote call.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { provider: "mock".to_string(), root_prefix: String::new(), timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Explicit path to the inventory database. When unset, the platform
    /// data directory is used.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Files enriched concurrently per batch.
    pub batch_size: usize,
    /// Skip files whose content fingerprint was already processed.
    pub skip_duplicates: bool,
    /// Record fingerprints of processed content for future dedup decisions.
    pub track_fingerprint: bool,
    /// Master switch for the enrichment stage. Sync still runs when false.
    pub analysis_enabled: bool,
    /// Deadline for enriching a single file, covering all backend calls it
    /// makes. A file that exceeds it is recorded as failed; the run goes on.
    pub file_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            skip_duplicates: true,
            track_fingerprint: true,
            analysis_enabled: true,
            file_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptioningConfig {
    /// Caption from remote-generated thumbnails instead of full-size
    /// content. Cheaper, and sufficient for scene description.
    pub use_thumbnails: bool,
    pub thumbnail_size: ThumbnailSize,
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self { use_thumbnails: true, thumbnail_size: ThumbnailSize::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Seconds between sampled frames in long videos.
    pub frame_interval_secs: f64,
    /// Hard cap on frames captioned per video.
    pub max_frames: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { frame_interval_secs: 10.0, max_frames: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Extensions treated as images (lowercase, no leading dot).
    pub image_extensions: Vec<String>,
    /// Extensions treated as videos (lowercase, no leading dot).
    pub video_extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load and validate configuration from all layers.
    ///
    /// `file` overrides the platform config file location; pass `None` to use
    /// `<config dir>/glimpse/config.toml`. A missing file is not an error,
    /// the defaults and environment still apply.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(explicit) => explicit.to_path_buf(),
            None => Self::default_config_file()?,
        };
        tracing::debug!(file = %file.display(), "loading configuration");
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&file))
            // GLIMPSE_CONFIG selects the file itself (handled by the CLI),
            // it is not a settings key.
            .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
            .extract()
            .map_err(|err| exn::Exn::from(ErrorKind::Load(err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints figment cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.processing.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("processing.batch_size must be at least 1".to_string()));
        }
        if self.video.max_frames == 0 {
            exn::bail!(ErrorKind::Invalid("video.max_frames must be at least 1".to_string()));
        }
        if !self.video.frame_interval_secs.is_finite() || self.video.frame_interval_secs <= 0.0 {
            exn::bail!(ErrorKind::Invalid("video.frame_interval_secs must be positive".to_string()));
        }
        if self.remote.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("remote.timeout_secs must be at least 1".to_string()));
        }
        if self.processing.file_timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("processing.file_timeout_secs must be at least 1".to_string()));
        }
        if self.media.image_extensions.is_empty() && self.media.video_extensions.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one media extension must be configured".to_string()));
        }
        for ext in self.media.image_extensions.iter().chain(&self.media.video_extensions) {
            if ext.starts_with('.') || *ext != ext.to_lowercase() {
                exn::bail!(ErrorKind::Invalid(format!(
                    "extension {ext:?} must be lowercase without a leading dot"
                )));
            }
        }
        Ok(())
    }

    /// Resolved path of the inventory database, creating parent directories
    /// as needed.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = match &self.database.path {
            Some(explicit) => explicit.clone(),
            None => Self::data_dir()?.join("inventory.db"),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .or_raise(|| ErrorKind::Load(format!("could not create {}", parent.display())))?;
        }
        Ok(path)
    }

    fn default_config_file() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from(QUALIFIER.0, QUALIFIER.1, QUALIFIER.2)
            .ok_or_else(|| exn::Exn::from(ErrorKind::NoDataDirectory))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    fn data_dir() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from(QUALIFIER.0, QUALIFIER.1, QUALIFIER.2)
            .ok_or_else(|| exn::Exn::from(ErrorKind::NoDataDirectory))?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.processing.batch_size, 25);
        assert!(config.processing.skip_duplicates);
        assert_eq!(config.video.max_frames, 5);
        assert!(config.media.image_extensions.iter().any(|e| e == "jpg"));
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [processing]
                batch_size = 4
                skip_duplicates = false

                [captioning]
                thumbnail_size = "large"
                "#,
            )?;
            let config = Config::load(Some(Path::new("config.toml"))).expect("config loads");
            assert_eq!(config.processing.batch_size, 4);
            assert!(!config.processing.skip_duplicates);
            assert_eq!(config.captioning.thumbnail_size, ThumbnailSize::Large);
            // untouched sections keep their defaults
            assert_eq!(config.video.max_frames, 5);
            Ok(())
        });
    }

    #[test]
    fn test_env_layer_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[processing]\nbatch_size = 4\n")?;
            jail.set_env("GLIMPSE_PROCESSING__BATCH_SIZE", "9");
            jail.set_env("GLIMPSE_REMOTE__ROOT_PREFIX", "Photos");
            let config = Config::load(Some(Path::new("config.toml"))).expect("config loads");
            assert_eq!(config.processing.batch_size, 9);
            assert_eq!(config.remote.root_prefix, "Photos");
            Ok(())
        });
    }

    #[rstest]
    #[case::zero_batch("[processing]\nbatch_size = 0\n")]
    #[case::zero_frames("[video]\nmax_frames = 0\n")]
    #[case::bad_interval("[video]\nframe_interval_secs = -1.0\n")]
    #[case::dotted_extension("[media]\nimage_extensions = [\".jpg\"]\n")]
    fn test_invalid_values_rejected(#[case] toml: &str) {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", toml)?;
            let err = Config::load(Some(Path::new("config.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(Path::new("does-not-exist.toml"))).expect("config loads");
            assert_eq!(config.processing.batch_size, 25);
            Ok(())
        });
    }
}
