//! Known-release persistence
//!
//! JSON object mapping external artist ids to the release-group ids already
//! seen for them. The set grows monotonically; reconciliation saves it after
//! every artist so an interruption loses at most the in-progress one.

use crate::error::Result;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Previously-seen release groups per artist
#[derive(Debug)]
pub struct KnownReleaseSet {
    path: PathBuf,
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl KnownReleaseSet {
    /// Load the set, tolerating a missing or malformed file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_entries(&path);
        Self { path, entries }
    }

    fn load_entries(path: &Path) -> BTreeMap<String, BTreeSet<String>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No known-releases file, starting empty");
                return BTreeMap::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read known releases, starting empty");
                return BTreeMap::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Known releases file is malformed, starting empty");
                return BTreeMap::new();
            }
        };

        let Value::Object(map) = value else {
            warn!(path = %path.display(), "Known releases file is not a JSON object, starting empty");
            return BTreeMap::new();
        };

        let mut entries = BTreeMap::new();
        for (artist_id, ids) in map {
            let Value::Array(ids) = ids else {
                warn!(artist = %artist_id, "Invalid known-release entry, dropping");
                continue;
            };
            let set: BTreeSet<String> = ids
                .into_iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect();
            entries.insert(artist_id, set);
        }

        info!(path = %path.display(), artists = entries.len(), "Loaded known releases");
        entries
    }

    /// Whether a release group was already seen for an artist.
    pub fn contains(&self, artist_id: &str, release_group_id: &str) -> bool {
        self.entries
            .get(artist_id)
            .map(|set| set.contains(release_group_id))
            .unwrap_or(false)
    }

    /// Record a release group for an artist.
    ///
    /// Returns `true` when the id was not seen before.
    pub fn record(&mut self, artist_id: &str, release_group_id: &str) -> bool {
        self.entries
            .entry(artist_id.to_string())
            .or_default()
            .insert(release_group_id.to_string())
    }

    /// Number of artists with recorded releases.
    pub fn artist_count(&self) -> usize {
        self.entries.len()
    }

    /// Persist the set to its backing file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), artists = self.entries.len(), "Saved known releases");
        Ok(())
    }
}
