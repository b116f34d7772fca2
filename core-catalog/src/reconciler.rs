//! Release reconciliation
//!
//! Merges each artist's current release groups against the persisted known
//! set and emits only the new ones. Artists are processed sequentially with
//! the catalog pacing delay between them; the known set is saved after every
//! artist so a mid-batch interruption loses at most the in-progress one.

use crate::client::{ArtistIdentity, MusicBrainzClient};
use crate::error::{CatalogError, Result};
use crate::known::KnownReleaseSet;
use core_runtime::WatcherConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fallback when a release group carries no date
const UNKNOWN_DATE: &str = "Unknown Date";

/// A release group not previously seen for its artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRelease {
    pub id: String,
    pub title: String,
    /// First release date as reported by the catalog, `"Unknown Date"` when
    /// absent
    pub date: String,
    pub artist: String,
    pub artist_id: String,
    /// Browsable catalog URL for the release group
    pub url: String,
}

/// Computes release novelty per artist against the persisted known set.
pub struct ReleaseReconciler {
    client: Arc<MusicBrainzClient>,
    known_path: PathBuf,
    pace: Duration,
}

impl ReleaseReconciler {
    pub fn new(
        client: Arc<MusicBrainzClient>,
        known_path: impl Into<PathBuf>,
        config: &WatcherConfig,
    ) -> Self {
        Self {
            client,
            known_path: known_path.into(),
            pace: config.catalog_rate_limit,
        }
    }

    /// Reconcile the given artists, returning new releases sorted by release
    /// date descending.
    ///
    /// Dates are compared as literal strings, so undated releases sort by
    /// the fallback text. A missing bearer token aborts with
    /// [`CatalogError::NotAuthenticated`]; any other per-artist failure is
    /// logged and skips that artist only.
    pub async fn reconcile(
        &self,
        artists: &[ArtistIdentity],
        cancel: &CancellationToken,
    ) -> Result<Vec<DiscoveredRelease>> {
        let mut known = KnownReleaseSet::load(&self.known_path);
        let mut discovered = Vec::new();

        info!(artists = artists.len(), "Checking artists for new releases");

        for artist in artists {
            if cancel.is_cancelled() {
                info!("Release reconciliation stopped");
                break;
            }

            info!(artist = %artist.name, id = %artist.id, "Checking artist releases");

            let groups = match self.client.release_groups(&artist.id).await {
                Ok(groups) => groups,
                Err(CatalogError::NotAuthenticated) => return Err(CatalogError::NotAuthenticated),
                Err(e) => {
                    warn!(artist = %artist.name, error = %e, "Release listing failed, skipping artist");
                    tokio::time::sleep(self.pace).await;
                    continue;
                }
            };

            let mut new_count = 0usize;
            for group in groups {
                if !known.record(&artist.id, &group.id) {
                    continue;
                }
                new_count += 1;
                let date = group
                    .first_release_date
                    .filter(|date| !date.is_empty())
                    .unwrap_or_else(|| UNKNOWN_DATE.to_string());
                info!(
                    artist = %artist.name,
                    title = %group.title,
                    date = %date,
                    kind = group.primary_type.as_deref().unwrap_or("Album"),
                    "New release discovered"
                );
                discovered.push(DiscoveredRelease {
                    url: format!("https://musicbrainz.org/release-group/{}", group.id),
                    id: group.id,
                    title: group.title,
                    date,
                    artist: artist.name.clone(),
                    artist_id: artist.id.clone(),
                });
            }

            if new_count == 0 {
                info!(artist = %artist.name, "No new releases");
            }

            // Save after every artist; interruption loses at most this one
            if let Err(e) = known.save() {
                warn!(artist = %artist.name, error = %e, "Failed to persist known releases");
            }

            tokio::time::sleep(self.pace).await;
        }

        // Literal string comparison; undated entries sort by the fallback
        // text
        discovered.sort_by(|a, b| b.date.cmp(&a.date));

        info!(new_releases = discovered.len(), "Release reconciliation finished");
        Ok(discovered)
    }
}
