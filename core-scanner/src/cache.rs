//! Per-root hash cache
//!
//! Each scanned root owns one JSON cache file mapping root-relative paths to
//! `{digest, mtime, size}`. An entry is trusted only while its (mtime, size)
//! pair still matches the live file; any mismatch forces recomputation.
//! Corrupt or malformed content is treated as absent and rebuilt silently.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Hidden per-root data directory
pub const CACHE_DIR_NAME: &str = ".musewatch";

/// Cache file name inside the data directory
pub const CACHE_FILE_NAME: &str = "track-hashes.json";

/// Cached fingerprint for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hex-encoded SHA-256 digest
    pub digest: String,
    /// Modification time, seconds since the epoch
    pub mtime: f64,
    /// File size in bytes
    pub size: u64,
}

impl CacheEntry {
    /// An entry is only trustworthy while the live file still matches it.
    pub fn matches(&self, mtime: f64, size: u64) -> bool {
        self.mtime == mtime && self.size == size
    }
}

/// Modification time of a file as float seconds, `0.0` when unavailable.
pub fn mtime_secs(metadata: &Metadata) -> f64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Hash cache for a single root directory.
///
/// Never shared across roots; mutated only by the sequential scan loop
/// processing its root.
#[derive(Debug)]
pub struct HashCache {
    cache_path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl HashCache {
    /// Load the cache for `root`, tolerating a missing or corrupt file.
    pub fn load(root: &Path) -> Self {
        let cache_path = root.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME);
        let entries = Self::load_entries(&cache_path);
        Self {
            cache_path,
            entries,
        }
    }

    fn load_entries(cache_path: &Path) -> HashMap<String, CacheEntry> {
        let raw = match std::fs::read_to_string(cache_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %cache_path.display(), "Hash cache not found, starting empty");
                return HashMap::new();
            }
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "Failed to read hash cache, rebuilding");
                return HashMap::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "Hash cache is malformed, rebuilding");
                return HashMap::new();
            }
        };

        let Value::Object(map) = value else {
            warn!(path = %cache_path.display(), "Hash cache is not a JSON object, rebuilding");
            return HashMap::new();
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (rel_path, raw_entry) in map {
            match serde_json::from_value::<CacheEntry>(raw_entry) {
                Ok(entry) => {
                    entries.insert(rel_path, entry);
                }
                Err(e) => {
                    // One bad entry forces a rehash of that file only
                    warn!(path = %rel_path, error = %e, "Corrupt hash cache entry, dropping");
                }
            }
        }

        info!(path = %cache_path.display(), entries = entries.len(), "Loaded hash cache");
        entries
    }

    /// Look up the cached entry for a root-relative path.
    pub fn entry(&self, rel_path: &str) -> Option<&CacheEntry> {
        self.entries.get(rel_path)
    }

    /// Record a freshly computed digest.
    pub fn insert(&mut self, rel_path: impl Into<String>, digest: String, mtime: f64, size: u64) {
        self.entries.insert(
            rel_path.into(),
            CacheEntry {
                digest,
                mtime,
                size,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the in-memory entries to the cache file.
    ///
    /// After a partial scan this is a partial-but-consistent save: it carries
    /// entries for exactly the files that were actually processed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.cache_path, json)?;
        debug!(path = %self.cache_path.display(), entries = self.entries.len(), "Saved hash cache");
        Ok(())
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.cache_path
    }
}
