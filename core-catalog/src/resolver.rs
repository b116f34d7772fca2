//! Artist identity resolution
//!
//! Resolves the artist names seen during a scan to catalog identifiers in
//! bounded parallel, pacing each worker to stay inside the catalog's rate
//! budget. Misses and per-name failures are logged and skipped; a batch
//! always yields whatever identities could be found.

use crate::client::{ArtistIdentity, MusicBrainzClient};
use core_fetch::FetchPool;
use core_runtime::WatcherConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sentinel matching the scanner's unknown-artist tag; never worth a lookup
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Bounded-parallel artist-name → catalog-id lookup
pub struct ArtistResolver {
    client: Arc<MusicBrainzClient>,
    pool: FetchPool,
}

impl ArtistResolver {
    pub fn new(client: Arc<MusicBrainzClient>, config: &WatcherConfig) -> Self {
        Self {
            client,
            pool: FetchPool::new(config.max_fetch_workers).with_pace(config.catalog_rate_limit),
        }
    }

    /// Resolve a batch of artist display names.
    ///
    /// Results arrive in completion order; the unknown-artist sentinel and
    /// blank names are skipped without a lookup.
    pub async fn resolve(
        &self,
        names: impl IntoIterator<Item = String>,
        cancel: &CancellationToken,
    ) -> Vec<ArtistIdentity> {
        let names: Vec<String> = names
            .into_iter()
            .filter(|name| name != UNKNOWN_ARTIST && !name.trim().is_empty())
            .collect();

        info!(
            artists = names.len(),
            workers = self.pool.worker_count(),
            "Resolving artist identities"
        );

        let client = Arc::clone(&self.client);
        let identities = self
            .pool
            .run(names, cancel, move |name| {
                let client = Arc::clone(&client);
                async move {
                    match client.search_artist(&name).await {
                        Ok(Some(identity)) => Some(identity),
                        Ok(None) => {
                            info!(artist = %name, "No catalog match for artist");
                            None
                        }
                        Err(e) => {
                            warn!(artist = %name, error = %e, "Artist search failed, skipping");
                            None
                        }
                    }
                }
            })
            .await;

        info!(resolved = identities.len(), "Artist resolution finished");
        identities
    }
}
