//! Parallel lyric fetch job
//!
//! Runs lyric search over a batch of scanned tracks through the bounded
//! fetch pool. Synced lyrics are searched first; plain lyrics only for files
//! that have no sidecar at all. Hits are persisted immediately and the
//! updated record is streamed back to the host in completion order.

use crate::provider::{LyricsProvider, LyricsQuery};
use core_fetch::FetchPool;
use core_runtime::WatcherConfig;
use core_scanner::{sidecar, LyricsStatus, TrackRecord};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fetches lyrics for scanned tracks and persists sidecars.
pub struct LyricFetchJob {
    provider: Arc<dyn LyricsProvider>,
    pool: FetchPool,
    skip_synced: bool,
}

impl LyricFetchJob {
    /// Create a job using the watcher's worker cap and skip policy.
    pub fn new(provider: Arc<dyn LyricsProvider>, config: &WatcherConfig) -> Self {
        Self {
            provider,
            pool: FetchPool::new(config.max_fetch_workers),
            skip_synced: config.skip_synced_lyrics,
        }
    }

    /// Override the skip-if-synced policy.
    pub fn with_skip_synced(mut self, skip_synced: bool) -> Self {
        self.skip_synced = skip_synced;
        self
    }

    /// Fetch lyrics for every record, streaming updated records to `updates`
    /// as sidecars land on disk. Returns the number of records updated.
    pub async fn run(
        &self,
        records: Vec<TrackRecord>,
        cancel: &CancellationToken,
        updates: mpsc::Sender<TrackRecord>,
    ) -> usize {
        info!(
            files = records.len(),
            workers = self.pool.worker_count(),
            "Starting lyric fetch"
        );

        let provider = Arc::clone(&self.provider);
        let skip_synced = self.skip_synced;
        let updated = self
            .pool
            .run_streaming(
                records,
                cancel,
                move |record| {
                    let provider = Arc::clone(&provider);
                    async move { fetch_one(provider, record, skip_synced).await }
                },
                updates,
            )
            .await;

        info!(updated, "Lyric fetch finished");
        updated
    }
}

/// Search and persist lyrics for a single track.
///
/// Returns the updated record when a sidecar was written, `None` otherwise.
/// Failures are logged and skip only this track.
async fn fetch_one(
    provider: Arc<dyn LyricsProvider>,
    mut record: TrackRecord,
    skip_synced: bool,
) -> Option<TrackRecord> {
    if skip_synced && record.lyrics == LyricsStatus::Synced {
        return None;
    }

    let query = LyricsQuery::from_record(&record);

    // Synced first, it supersedes an existing plain sidecar
    match provider.search_synced(&query).await {
        Ok(Some(content)) => match sidecar::write(&record.path, &content, true) {
            Ok(status) => {
                record.lyrics = status;
                return Some(record);
            }
            Err(e) => {
                warn!(file = %record.file_name, error = %e, "Failed to save synced lyrics");
            }
        },
        Ok(None) => {}
        Err(e) => {
            warn!(file = %record.file_name, error = %e, "Synced lyric search failed");
        }
    }

    // Plain lyrics only for files with no lyrics at all
    if record.lyrics == LyricsStatus::None {
        match provider.search_plain(&query).await {
            Ok(Some(content)) => match sidecar::write(&record.path, &content, false) {
                Ok(status) => {
                    record.lyrics = status;
                    return Some(record);
                }
                Err(e) => {
                    warn!(file = %record.file_name, error = %e, "Failed to save plain lyrics");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(file = %record.file_name, error = %e, "Plain lyric search failed");
            }
        }
    }

    None
}
