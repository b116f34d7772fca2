//! Lyric search providers
//!
//! Synced (LRC) and plain lyric search behind an async seam. The bundled
//! implementation talks to LRCLib, which serves both forms from a single
//! lookup endpoint.

use crate::error::{LyricsError, Result};
use async_trait::async_trait;
use core_runtime::{HttpClient, HttpMethod, HttpRequest};
use core_scanner::TrackRecord;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Search parameters for one track
#[derive(Debug, Clone)]
pub struct LyricsQuery {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
}

impl LyricsQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Build a query from a scanned track record.
    pub fn from_record(record: &TrackRecord) -> Self {
        Self::new(record.artist.clone(), record.title.clone())
            .with_album(record.album.clone())
    }
}

/// Trait for lyric search implementations
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Search for synced (timestamped) lyrics
    ///
    /// # Returns
    /// * `Ok(Some(content))` if synced lyrics were found
    /// * `Ok(None)` if the service has none for this track
    /// * `Err` on API or network failure
    async fn search_synced(&self, query: &LyricsQuery) -> Result<Option<String>>;

    /// Search for plain-text lyrics
    async fn search_plain(&self, query: &LyricsQuery) -> Result<Option<String>>;
}

/// LRCLib provider - free, open-source lyric database
pub struct LrcLibProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl LrcLibProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: "https://lrclib.net/api".to_string(),
        }
    }

    /// Point the provider at a different endpoint (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn lookup(&self, query: &LyricsQuery) -> Result<Option<LrcLibResponse>> {
        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist),
            urlencoding::encode(&query.title)
        );
        if let Some(album) = &query.album {
            url.push_str(&format!("&album_name={}", urlencoding::encode(album)));
        }

        debug!(url = %url, "Searching LRCLib");

        let request = HttpRequest::new(HttpMethod::Get, &url);
        let response = self.http_client.execute(request).await?;

        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(LyricsError::SearchFailed(format!(
                "LRCLib API error: HTTP {}",
                response.status
            )));
        }

        let parsed: LrcLibResponse = response
            .json()
            .map_err(|e| LyricsError::SearchFailed(format!("Parse error: {}", e)))?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl LyricsProvider for LrcLibProvider {
    async fn search_synced(&self, query: &LyricsQuery) -> Result<Option<String>> {
        Ok(self
            .lookup(query)
            .await?
            .and_then(|r| r.synced_lyrics)
            .filter(|content| !content.is_empty()))
    }

    async fn search_plain(&self, query: &LyricsQuery) -> Result<Option<String>> {
        Ok(self
            .lookup(query)
            .await?
            .and_then(|r| r.plain_lyrics)
            .filter(|content| !content.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct LrcLibResponse {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_record() {
        let mut record = TrackRecord::new("/music/a.mp3");
        record.artist = "Some Band".to_string();
        record.title = "Some Song".to_string();
        record.album = "Some Album".to_string();

        let query = LyricsQuery::from_record(&record);
        assert_eq!(query.artist, "Some Band");
        assert_eq!(query.title, "Some Song");
        assert_eq!(query.album.as_deref(), Some("Some Album"));
    }
}
