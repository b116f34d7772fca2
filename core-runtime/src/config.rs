//! # Settings & Configuration
//!
//! Provides configuration management for the watcher core.
//!
//! ## Overview
//!
//! Two layers make up the configuration system:
//!
//! - **`SettingsStore`**: the persistence seam. The core only assumes
//!   key/value get/set/save semantics; hosts may back it with anything.
//!   [`JsonSettingsStore`] is the bundled JSON-file implementation.
//! - **`WatcherConfig`**: the typed configuration object assembled from a
//!   store and passed explicitly to each component at construction. No
//!   component reads ambient global state.
//!
//! All writes to a [`JsonSettingsStore`] are routed through a single owning
//! task via a command channel, so concurrent callers (e.g. a token-refresh
//! callback racing a scan finishing) can never interleave a partial save.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{JsonSettingsStore, WatcherConfig};
//!
//! let settings = JsonSettingsStore::open("/path/to/settings.json");
//! let config = WatcherConfig::load(&settings).await?;
//! let roots = config.require_directories()?;
//! ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// Settings seam
// =============================================================================

/// Key/value settings persistence seam.
///
/// Hosts provide an implementation; the core reads and writes a handful of
/// well-known keys through it and calls [`save`](SettingsStore::save) at
/// natural checkpoints (never mid-operation).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve a list of strings
    async fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Store a list of strings
    async fn set_string_list(&self, key: &str, values: &[String]) -> Result<()>;

    /// Flush pending changes to stable storage
    async fn save(&self) -> Result<()>;
}

/// Commands processed by the settings owner task
enum SettingsCommand {
    Get {
        key: String,
        reply: oneshot::Sender<Option<Value>>,
    },
    Set {
        key: String,
        value: Value,
    },
    Save {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable handle to a running [`JsonSettingsStore`] owner task.
///
/// Implements [`SettingsStore`] by message passing; every handle talks to the
/// same owner, which serializes all reads, writes, and saves.
#[derive(Clone)]
pub struct SettingsHandle {
    tx: mpsc::Sender<SettingsCommand>,
}

impl SettingsHandle {
    async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SettingsCommand::Get {
                key: key.to_string(),
                reply,
            })
            .await
            .map_err(|_| Error::SettingsUnavailable)?;
        rx.await.map_err(|_| Error::SettingsUnavailable)
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.tx
            .send(SettingsCommand::Set {
                key: key.to_string(),
                value,
            })
            .await
            .map_err(|_| Error::SettingsUnavailable)
    }
}

#[async_trait]
impl SettingsStore for SettingsHandle {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_value(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, Value::String(value.to_string())).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get_value(key).await?.and_then(|v| v.as_bool()))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, Value::Bool(value)).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_value(key).await?.and_then(|v| v.as_i64()))
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_value(key, Value::from(value)).await
    }

    async fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.get_value(key).await?.and_then(|v| {
            v.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
        }))
    }

    async fn set_string_list(&self, key: &str, values: &[String]) -> Result<()> {
        self.set_value(key, Value::from(values.to_vec())).await
    }

    async fn save(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SettingsCommand::Save { reply })
            .await
            .map_err(|_| Error::SettingsUnavailable)?;
        rx.await.map_err(|_| Error::SettingsUnavailable)?
    }
}

/// JSON-file settings store.
///
/// The file holds a single JSON object. Unknown keys are preserved across
/// load/save cycles so host-owned settings survive core updates. A missing or
/// malformed file yields an empty store rather than an error.
pub struct JsonSettingsStore;

impl JsonSettingsStore {
    /// Load the settings file and spawn the owning task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> SettingsHandle {
        let path = path.into();
        let values = Self::load_values(&path);
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(Self::run_owner(path, values, rx));
        SettingsHandle { tx }
    }

    fn load_values(path: &Path) -> Map<String, Value> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Settings file not found, starting empty");
                return Map::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings, starting empty");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => {
                info!(path = %path.display(), keys = map.len(), "Loaded settings");
                map
            }
            Ok(_) => {
                warn!(path = %path.display(), "Settings file is not a JSON object, starting empty");
                Map::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings file is malformed, starting empty");
                Map::new()
            }
        }
    }

    async fn run_owner(
        path: PathBuf,
        mut values: Map<String, Value>,
        mut rx: mpsc::Receiver<SettingsCommand>,
    ) {
        while let Some(command) = rx.recv().await {
            match command {
                SettingsCommand::Get { key, reply } => {
                    let _ = reply.send(values.get(&key).cloned());
                }
                SettingsCommand::Set { key, value } => {
                    values.insert(key, value);
                }
                SettingsCommand::Save { reply } => {
                    let _ = reply.send(Self::write_values(&path, &values).await);
                }
            }
        }
        debug!(path = %path.display(), "Settings owner task finished");
    }

    async fn write_values(path: &Path, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(values.clone()))?;
        tokio::fs::write(path, json).await?;
        debug!(path = %path.display(), keys = values.len(), "Saved settings");
        Ok(())
    }
}

// =============================================================================
// Typed configuration
// =============================================================================

const KEY_MUSIC_DIRECTORIES: &str = "music_directories";
const KEY_SKIP_SYNCED_LYRICS: &str = "skip_synced_lyrics";
const KEY_USER_AGENT: &str = "user_agent";
const KEY_CATALOG_RATE_LIMIT_MS: &str = "catalog_rate_limit_ms";
const KEY_MAX_FETCH_WORKERS: &str = "max_fetch_workers";

/// Default inter-call delay for rate-limited catalog services
const DEFAULT_CATALOG_RATE_LIMIT: Duration = Duration::from_millis(1100);

/// Default ceiling on parallel fetch workers
const DEFAULT_MAX_FETCH_WORKERS: usize = 8;

/// Typed watcher configuration, assembled from a [`SettingsStore`].
///
/// Constructed once at startup and passed to each component explicitly.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Top-level music directories to scan, each with its own hash cache
    pub music_directories: Vec<PathBuf>,

    /// Skip lyric fetching for files that already have a synced sidecar
    pub skip_synced_lyrics: bool,

    /// User-Agent sent to external catalog services
    pub user_agent: String,

    /// Minimum delay between calls to rate-limited catalog services
    pub catalog_rate_limit: Duration,

    /// Upper bound on parallel fetch workers
    pub max_fetch_workers: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            music_directories: Vec::new(),
            skip_synced_lyrics: true,
            user_agent: format!("musewatch/{}", env!("CARGO_PKG_VERSION")),
            catalog_rate_limit: DEFAULT_CATALOG_RATE_LIMIT,
            max_fetch_workers: DEFAULT_MAX_FETCH_WORKERS,
        }
    }
}

impl WatcherConfig {
    /// Assemble the configuration from a settings store, falling back to
    /// defaults for absent keys.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self> {
        let defaults = Self::default();

        let music_directories = store
            .get_string_list(KEY_MUSIC_DIRECTORIES)
            .await?
            .map(|dirs| dirs.into_iter().map(PathBuf::from).collect())
            .unwrap_or(defaults.music_directories);

        let skip_synced_lyrics = store
            .get_bool(KEY_SKIP_SYNCED_LYRICS)
            .await?
            .unwrap_or(defaults.skip_synced_lyrics);

        let user_agent = store
            .get_string(KEY_USER_AGENT)
            .await?
            .unwrap_or(defaults.user_agent);

        let catalog_rate_limit = store
            .get_i64(KEY_CATALOG_RATE_LIMIT_MS)
            .await?
            .map(|ms| Duration::from_millis(ms.max(0) as u64))
            .unwrap_or(defaults.catalog_rate_limit);

        let max_fetch_workers = store
            .get_i64(KEY_MAX_FETCH_WORKERS)
            .await?
            .map(|n| n.max(1) as usize)
            .unwrap_or(defaults.max_fetch_workers);

        Ok(Self {
            music_directories,
            skip_synced_lyrics,
            user_agent,
            catalog_rate_limit,
            max_fetch_workers,
        })
    }

    /// Write the configuration back to a settings store and save it.
    pub async fn persist(&self, store: &dyn SettingsStore) -> Result<()> {
        let dirs: Vec<String> = self
            .music_directories
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        store.set_string_list(KEY_MUSIC_DIRECTORIES, &dirs).await?;
        store
            .set_bool(KEY_SKIP_SYNCED_LYRICS, self.skip_synced_lyrics)
            .await?;
        store.set_string(KEY_USER_AGENT, &self.user_agent).await?;
        store
            .set_i64(
                KEY_CATALOG_RATE_LIMIT_MS,
                self.catalog_rate_limit.as_millis() as i64,
            )
            .await?;
        store
            .set_i64(KEY_MAX_FETCH_WORKERS, self.max_fetch_workers as i64)
            .await?;
        store.save().await
    }

    /// The configured scan roots, or a distinct "not configured" signal the
    /// host can turn into a prompt rather than an error log.
    pub fn require_directories(&self) -> Result<&[PathBuf]> {
        if self.music_directories.is_empty() {
            return Err(Error::NoDirectoriesConfigured);
        }
        Ok(&self.music_directories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatcherConfig::default();
        assert!(config.music_directories.is_empty());
        assert!(config.skip_synced_lyrics);
        assert_eq!(config.catalog_rate_limit, Duration::from_millis(1100));
        assert_eq!(config.max_fetch_workers, 8);
    }

    #[test]
    fn test_require_directories_empty() {
        let config = WatcherConfig::default();
        assert!(matches!(
            config.require_directories(),
            Err(Error::NoDirectoriesConfigured)
        ));
    }

    #[test]
    fn test_require_directories_present() {
        let config = WatcherConfig {
            music_directories: vec![PathBuf::from("/music")],
            ..Default::default()
        };
        assert_eq!(config.require_directories().unwrap().len(), 1);
    }
}
