//! # Scan Orchestration
//!
//! The resumable state machine driving gathering and per-file processing
//! across all configured roots.
//!
//! ## State machine
//!
//! ```text
//! Idle → Gathering → Processing(root) → Finalizing(root) → [next root]
//!                                                        → Completed
//!        (cancellation at root and file granularity) ─────→ StoppedPartial
//! ```
//!
//! Gathering sorts every directory level lexicographically, so each root's
//! file list is identical across runs and an integer cursor is a valid
//! resume point. The cursor advances immediately after each record is
//! emitted; a crash loses at most the in-flight cache write, never scan
//! progress. Finalizing persists the root's hash cache whether the root
//! completed or was interrupted.
//!
//! ## Usage
//!
//! ```ignore
//! use core_scanner::{ScanEvent, ScanOrchestrator, ScanState};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let orchestrator = ScanOrchestrator::new(vec!["/music".into()]);
//! let (tx, mut rx) = mpsc::channel(64);
//! let cancel = CancellationToken::new();
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             ScanEvent::Track(record) => println!("{}", record.title),
//!             ScanEvent::Progress { message, .. } => println!("{}", message),
//!             ScanEvent::Finished { summary, .. } => println!("{:?}", summary),
//!         }
//!     }
//! });
//!
//! let (state, summary) = orchestrator.run(ScanState::new(), &cancel, &tx).await;
//! ```

use crate::cache::{mtime_secs, HashCache};
use crate::error::Result;
use crate::hasher;
use crate::record::{TrackRecord, TrackStatus, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use crate::sidecar;
use crate::state::{RootProgress, ScanState};
use crate::tags::{SupportedFormat, TagExtractor};
use chrono::{DateTime, Utc};
use core_runtime::WatcherConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Correlation id for one scan run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a scan run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every configured root was processed to the end
    Completed,
    /// Cancellation stopped the run; the returned state resumes it
    StoppedPartial,
}

/// Counters and timing for one scan run
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub scan_id: ScanId,
    pub outcome: ScanOutcome,
    /// Files gathered across all roots, including already-processed ones
    pub total_files: usize,
    /// Files processed and emitted this run
    pub processed: usize,
    /// Files skipped because a resume cursor already covered them
    pub resumed: usize,
    /// Emitted records carrying an error detail
    pub errors: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Events streamed to the host while a scan runs
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Periodic progress: files done, files total, human-readable message
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// One file finished processing
    Track(TrackRecord),
    /// The run reached a terminal state; `state` is empty on full completion
    Finished {
        state: ScanState,
        summary: ScanSummary,
    },
}

/// Digest computation seam; hosts can wrap the default to count or stub calls.
pub type HashFn = Arc<dyn Fn(&Path) -> std::io::Result<String> + Send + Sync>;

/// Drives resumable scans over the configured roots.
///
/// Owns the per-root hash caches and the live scan state for the duration of
/// a run; processing within a root is strictly sequential.
pub struct ScanOrchestrator {
    roots: Vec<PathBuf>,
    extractor: TagExtractor,
    hash_fn: HashFn,
}

impl ScanOrchestrator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            extractor: TagExtractor::new(),
            hash_fn: Arc::new(|path| hasher::hash_file(path)),
        }
    }

    /// Build from the watcher configuration, surfacing the distinct
    /// "nothing configured" signal.
    pub fn from_config(config: &WatcherConfig) -> Result<Self> {
        Ok(Self::new(config.require_directories()?.to_vec()))
    }

    /// Replace the digest function.
    pub fn with_hash_fn(mut self, hash_fn: HashFn) -> Self {
        self.hash_fn = hash_fn;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Run a scan, resuming from `resume` where it carries cursors for the
    /// configured roots. Pass `ScanState::new()` for a fresh scan.
    ///
    /// Events are streamed as they happen; the host must drain the channel
    /// concurrently. The returned state equals the one in the final
    /// [`ScanEvent::Finished`] event: empty after natural completion,
    /// otherwise exactly the cursors to supply back on resume.
    pub async fn run(
        &self,
        resume: ScanState,
        cancel: &CancellationToken,
        events: &mpsc::Sender<ScanEvent>,
    ) -> (ScanState, ScanSummary) {
        let scan_id = ScanId::new();
        let started_at = Utc::now();
        info!(%scan_id, roots = self.roots.len(), "Scan started");

        let mut state = resume.pruned_for(&self.roots);
        if state.is_resumable() {
            info!(%scan_id, "Resuming from saved cursors");
        }

        // Gathering: deterministic per-root file lists
        let mut plan: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
        let mut total_files = 0usize;
        for root in &self.roots {
            if cancel.is_cancelled() {
                break;
            }
            if !root.is_dir() {
                warn!(root = %root.display(), "Skipping invalid scan root");
                continue;
            }
            self.emit_progress(events, 0, 0, format!("Gathering files in: {}", root.display()))
                .await;
            match gather_files(root, cancel) {
                Some(files) => {
                    total_files += files.len();
                    plan.push((root.clone(), files));
                }
                None => {
                    info!(root = %root.display(), "Gathering cancelled, omitting root");
                }
            }
        }

        let mut current = 0usize;
        let mut processed = 0usize;
        let mut resumed = 0usize;
        let mut errors = 0usize;

        if !cancel.is_cancelled() {
            if total_files == 0 {
                info!(%scan_id, "No media files found in configured roots");
            } else {
                self.emit_progress(
                    events,
                    0,
                    total_files,
                    format!("Found {} files, starting processing", total_files),
                )
                .await;
            }

            // Processing + Finalizing, one root at a time
            for (root, files) in &plan {
                if cancel.is_cancelled() {
                    break;
                }

                let mut cache = HashCache::load(root);
                let start = state.resume_index(root).min(files.len());
                if start > 0 {
                    info!(root = %root.display(), start, "Resuming root from saved cursor");
                    current += start;
                    resumed += start;
                }

                let mut stopped = false;
                for (index, file) in files.iter().enumerate().skip(start) {
                    if cancel.is_cancelled() {
                        stopped = true;
                        break;
                    }

                    let record = self.process_file(file, root, &mut cache);
                    if record.error.is_some() {
                        errors += 1;
                    }

                    let _ = events.send(ScanEvent::Track(record)).await;
                    current += 1;
                    processed += 1;
                    // Advance the cursor only after the record is out
                    state.set_progress(root, RootProgress::InProgress(index + 1));
                    self.emit_progress(
                        events,
                        current,
                        total_files,
                        format!("{} of {} files scanned", current, total_files),
                    )
                    .await;
                }

                if stopped {
                    info!(root = %root.display(), "Scan stopped, saving partial hash cache");
                } else {
                    state.set_progress(root, RootProgress::Complete);
                    debug!(root = %root.display(), "Finished processing root");
                }
                if let Err(e) = cache.save() {
                    warn!(root = %root.display(), error = %e, "Failed to persist hash cache");
                }
                if stopped {
                    break;
                }
            }
        }

        let outcome = if cancel.is_cancelled() {
            ScanOutcome::StoppedPartial
        } else {
            // Natural completion: an empty state distinguishes "done" from
            // "not yet started" at the collection level
            state.clear();
            ScanOutcome::Completed
        };

        let summary = ScanSummary {
            scan_id,
            outcome,
            total_files,
            processed,
            resumed,
            errors,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %scan_id,
            outcome = ?summary.outcome,
            processed = summary.processed,
            errors = summary.errors,
            "Scan finished"
        );

        let _ = events
            .send(ScanEvent::Finished {
                state: state.clone(),
                summary: summary.clone(),
            })
            .await;

        (state, summary)
    }

    /// Process one file: stat, lyric probe, digest (cached or fresh), tags.
    ///
    /// Each stage fails independently without aborting the file; the record's
    /// status reflects the first failure encountered.
    fn process_file(&self, path: &Path, root: &Path, cache: &mut HashCache) -> TrackRecord {
        debug!(path = %path.display(), "Processing file");

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not stat file");
                return TrackRecord::file_error(path, format!("File error: {}", e));
            }
        };
        let mtime = mtime_secs(&metadata);
        let size = metadata.len();
        let rel_path = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());

        let mut record = TrackRecord::new(path);
        record.lyrics = sidecar::probe(path);

        match cache.entry(&rel_path).cloned() {
            Some(entry) if entry.matches(mtime, size) => {
                debug!(path = %path.display(), "File unchanged, using cached digest");
                record.digest = entry.digest;
            }
            cached => {
                let prior_digest = cached.map(|entry| entry.digest);
                match (self.hash_fn)(path) {
                    Ok(digest) => {
                        if let Some(previous) = prior_digest {
                            if previous != digest {
                                warn!(path = %path.display(), "Digest differs from cache");
                                record.status = TrackStatus::HashMismatch;
                                record.error =
                                    Some("File modified, digest differs from cache".to_string());
                            }
                        }
                        // The cache tracks the new truth either way
                        cache.insert(rel_path, digest.clone(), mtime, size);
                        record.digest = digest;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Could not compute content digest");
                        record.status = TrackStatus::HashFailed;
                        record.error = Some(format!("Could not compute content digest: {}", e));
                    }
                }
            }
        }

        let tags = self.extractor.extract(path);
        record.artist = tags.artist;
        record.album = tags.album;
        record.title = tags.title;
        record.track_number = tags.track_number;

        if record.error.is_none() {
            if record.artist == UNKNOWN_ARTIST || record.album == UNKNOWN_ALBUM {
                record.status = TrackStatus::MissingTags;
                record.error = Some("Artist or Album tag is missing".to_string());
            } else {
                record.status = TrackStatus::Ok;
            }
        }

        record
    }

    async fn emit_progress(
        &self,
        events: &mpsc::Sender<ScanEvent>,
        current: usize,
        total: usize,
        message: String,
    ) {
        let _ = events
            .send(ScanEvent::Progress {
                current,
                total,
                message,
            })
            .await;
    }
}

/// Enumerate a root's media files in deterministic order.
///
/// Entries are sorted lexicographically at every directory level, so two
/// gathers of the same tree always yield the same list regardless of the
/// order the filesystem reports entries in. Returns `None` when cancelled
/// mid-walk; the partially gathered root is omitted from processing.
fn gather_files(root: &Path, cancel: &CancellationToken) -> Option<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        if cancel.is_cancelled() {
            return None;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Error walking directory");
                continue;
            }
        };
        if entry.file_type().is_file() && SupportedFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Some(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_id_display_is_uuid() {
        let id = ScanId::new();
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_gather_skips_unsupported_and_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("a.flac"), b"x").unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"x").unwrap();
        let cache_dir = dir.path().join(".musewatch");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("track-hashes.json"), "{}").unwrap();

        let cancel = CancellationToken::new();
        let files = gather_files(dir.path(), &cancel).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.flac", "b.mp3"]);
    }

    #[test]
    fn test_gather_cancelled_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(gather_files(dir.path(), &cancel).is_none());
    }
}
