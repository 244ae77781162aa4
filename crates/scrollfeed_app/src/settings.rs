use std::fs;
use std::path::{Path, PathBuf};

use feed_logging::{feed_info, feed_warn};
use scrollfeed_core::{ConfigOverrides, ContentType, MemoryPolicy, DEFAULT_CLEANUP_THRESHOLD};
use scrollfeed_engine::{HttpSettings, PerformanceThresholds, DEFAULT_CACHE_TTL};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_SETTINGS_FILE: &str = "scrollfeed.ron";

#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::de::SpannedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MemorySettings {
    pub cleanup_threshold: usize,
    /// Defaults to five pages of the resolved page size.
    pub keep_recent: Option<usize>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            keep_recent: None,
        }
    }
}

impl MemorySettings {
    pub fn policy(&self, page_size: usize) -> MemoryPolicy {
        let defaults = MemoryPolicy::for_page_size(page_size);
        MemoryPolicy {
            cleanup_threshold: self.cleanup_threshold,
            keep_recent: self.keep_recent.unwrap_or(defaults.keep_recent),
        }
    }
}

/// Loader settings read from a RON file next to the binary's working dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoaderSettings {
    pub content_type: ContentType,
    pub overrides: ConfigOverrides,
    pub memory: MemorySettings,
    pub thresholds: PerformanceThresholds,
    pub http: HttpSettings,
    pub cache_ttl_secs: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            content_type: ContentType::Campaigns,
            overrides: ConfigOverrides::default(),
            memory: MemorySettings::default(),
            thresholds: PerformanceThresholds::default(),
            http: HttpSettings::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

/// Reads settings from `path`. A missing file yields the defaults.
pub(crate) fn load_settings(path: &Path) -> Result<LoaderSettings, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            feed_warn!("No settings at {:?}; using defaults", path);
            return Ok(LoaderSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings = ron::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    feed_info!("Loaded settings from {:?}", path);
    Ok(settings)
}
