//! Scan resume state
//!
//! Maps each root directory to a cursor into its deterministically sorted
//! file list. In memory the cursor is an explicit [`RootProgress`] enum; on
//! disk it is a JSON object of `root → integer`, where a positive integer
//! means "stopped having fully processed files `[0, cursor)`", `0` means the
//! root completed this run, and an absent key means the root was never
//! started. A scan that runs to natural completion persists an empty object.

use crate::error::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Progress of a single root within a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootProgress {
    /// No file of this root has been processed
    NotStarted,
    /// Files `[0, index)` are processed; `index` is next
    InProgress(usize),
    /// Every file of this root was processed this run
    Complete,
}

/// Resume cursors for all configured roots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    roots: HashMap<String, RootProgress>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(root: &Path) -> String {
        root.display().to_string()
    }

    /// Progress for a root; absent roots are `NotStarted`.
    pub fn progress(&self, root: &Path) -> RootProgress {
        self.roots
            .get(&Self::key(root))
            .copied()
            .unwrap_or(RootProgress::NotStarted)
    }

    /// Record progress for a root. `NotStarted` removes the entry.
    pub fn set_progress(&mut self, root: &Path, progress: RootProgress) {
        match progress {
            RootProgress::NotStarted => {
                self.roots.remove(&Self::key(root));
            }
            other => {
                self.roots.insert(Self::key(root), other);
            }
        }
    }

    /// Index of the next unprocessed file in a root.
    pub fn resume_index(&self, root: &Path) -> usize {
        match self.progress(root) {
            RootProgress::InProgress(index) => index,
            _ => 0,
        }
    }

    /// Whether any root has an in-progress cursor worth resuming.
    pub fn is_resumable(&self) -> bool {
        self.roots
            .values()
            .any(|p| matches!(p, RootProgress::InProgress(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Drop all cursors; an empty state signals full completion.
    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// Keep only in-progress cursors belonging to the given roots.
    ///
    /// Applied when resuming, so stale completions and cursors for
    /// since-removed roots never leak into a new run.
    pub fn pruned_for(&self, roots: &[PathBuf]) -> Self {
        let configured: HashSet<String> = roots.iter().map(|r| Self::key(r)).collect();
        let roots = self
            .roots
            .iter()
            .filter(|(key, progress)| {
                configured.contains(*key) && matches!(progress, RootProgress::InProgress(_))
            })
            .map(|(key, progress)| (key.clone(), *progress))
            .collect();
        Self { roots }
    }

    /// The wire form: root → cursor, `0` meaning "completed this run".
    pub fn to_cursor_map(&self) -> BTreeMap<String, u64> {
        self.roots
            .iter()
            .filter_map(|(key, progress)| match progress {
                RootProgress::InProgress(index) => Some((key.clone(), *index as u64)),
                RootProgress::Complete => Some((key.clone(), 0)),
                RootProgress::NotStarted => None,
            })
            .collect()
    }

    /// Rebuild from the wire form.
    pub fn from_cursor_map(map: impl IntoIterator<Item = (String, u64)>) -> Self {
        let roots = map
            .into_iter()
            .map(|(key, cursor)| {
                let progress = if cursor == 0 {
                    RootProgress::Complete
                } else {
                    RootProgress::InProgress(cursor as usize)
                };
                (key, progress)
            })
            .collect();
        Self { roots }
    }

    /// Load persisted state, tolerating a missing or malformed file.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No scan state file, starting fresh");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read scan state, starting fresh");
                return Self::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Scan state is malformed, starting fresh");
                return Self::new();
            }
        };

        let Value::Object(map) = value else {
            warn!(path = %path.display(), "Scan state is not a JSON object, starting fresh");
            return Self::new();
        };

        let entries = map.into_iter().filter_map(|(key, value)| {
            match value.as_u64() {
                Some(cursor) => Some((key, cursor)),
                None => {
                    warn!(root = %key, "Invalid scan state cursor, dropping");
                    None
                }
            }
        });

        let state = Self::from_cursor_map(entries);
        info!(path = %path.display(), roots = state.roots.len(), "Loaded scan state");
        state
    }

    /// Persist the state in its wire form.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.to_cursor_map())?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), roots = self.roots.len(), "Saved scan state");
        Ok(())
    }
}
