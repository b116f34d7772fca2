//! MusicBrainz API Client
//!
//! Artist search and release-group listing over the HTTP seam.
//!
//! MusicBrainz requires every client to identify itself with a proper
//! User-Agent and enforces a rate budget of roughly one request per second
//! for anonymous and identified clients. Callers pace their requests (the
//! resolver through its pool, the reconciler between artists); this client
//! stays a thin wire layer.

use crate::auth::TokenProvider;
use crate::error::{CatalogError, Result};
use core_runtime::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// MusicBrainz API base URL
const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for release-group listing
const BROWSE_LIMIT: u32 = 100;

/// (artist display name, external catalog identifier) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistIdentity {
    pub name: String,
    pub id: String,
}

/// One release group as listed for an artist
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroupRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub primary_type: Option<String>,
    #[serde(default)]
    pub first_release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReleaseGroupResponse {
    #[serde(default)]
    release_groups: Vec<ReleaseGroupRef>,
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn TokenProvider>,
    user_agent: String,
    base_url: String,
}

impl MusicBrainzClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `token_provider` - bearer tokens for authenticated endpoints
    /// * `user_agent` - identifying string (format: "AppName/Version (Contact)")
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_provider: Arc<dyn TokenProvider>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            user_agent: user_agent.into(),
            base_url: MUSICBRAINZ_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search for an artist by display name, returning the best match.
    ///
    /// Works anonymously; a 503 (maintenance or shed load) is treated as
    /// "no match" with a warning rather than an error.
    pub async fn search_artist(&self, name: &str) -> Result<Option<ArtistIdentity>> {
        let query = format!("artist:\"{}\"", Self::escape_query(name));
        let url = format!(
            "{}/artist/?query={}&fmt=json&limit=1",
            self.base_url,
            urlencoding::encode(&query)
        );

        debug!(url = %url, "Searching catalog artist");

        let request = HttpRequest::new(HttpMethod::Get, &url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;

        if response.status == 503 {
            warn!("Catalog service unavailable (503)");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(CatalogError::Api(format!(
                "Artist search failed: HTTP {}",
                response.status
            )));
        }

        let search: ArtistSearchResponse = response.json()?;
        Ok(search.artists.into_iter().next().map(|entry| ArtistIdentity {
            name: name.to_string(),
            id: entry.id,
        }))
    }

    /// List an artist's release groups, restricted to albums, EPs, and
    /// singles.
    ///
    /// Requires a bearer token; a missing token surfaces as
    /// [`CatalogError::NotAuthenticated`] so the host can prompt for login
    /// instead of logging an error.
    pub async fn release_groups(&self, artist_id: &str) -> Result<Vec<ReleaseGroupRef>> {
        let token = self
            .token_provider
            .bearer_token()
            .await?
            .ok_or(CatalogError::NotAuthenticated)?;

        let url = format!(
            "{}/release-group?artist={}&type=album%7Cep%7Csingle&fmt=json&limit={}",
            self.base_url, artist_id, BROWSE_LIMIT
        );

        debug!(url = %url, "Listing artist release groups");

        let request = HttpRequest::new(HttpMethod::Get, &url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .bearer_token(token)
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(CatalogError::Api(format!(
                "Release group listing failed: HTTP {}",
                response.status
            )));
        }

        let listing: ReleaseGroupResponse = response.json()?;
        Ok(listing.release_groups)
    }

    /// Escapes special characters in Lucene query syntax.
    fn escape_query(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('+', "\\+")
            .replace('-', "\\-")
            .replace('!', "\\!")
            .replace('(', "\\(")
            .replace(')', "\\)")
            .replace('{', "\\{")
            .replace('}', "\\}")
            .replace('[', "\\[")
            .replace(']', "\\]")
            .replace('^', "\\^")
            .replace('~', "\\~")
            .replace('*', "\\*")
            .replace('?', "\\?")
            .replace(':', "\\:")
            .replace('/', "\\/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query() {
        assert_eq!(MusicBrainzClient::escape_query("AC/DC"), "AC\\/DC");
        assert_eq!(
            MusicBrainzClient::escape_query("Artist (feat. Other)"),
            "Artist \\(feat. Other\\)"
        );
        assert_eq!(
            MusicBrainzClient::escape_query("Who? What!"),
            "Who\\? What\\!"
        );
    }

    #[test]
    fn test_release_group_deserializes_kebab_case() {
        let json = r#"{
            "id": "rg-1",
            "title": "First Album",
            "primary-type": "Album",
            "first-release-date": "2020-03-01"
        }"#;
        let group: ReleaseGroupRef = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, "rg-1");
        assert_eq!(group.primary_type.as_deref(), Some("Album"));
        assert_eq!(group.first_release_date.as_deref(), Some("2020-03-01"));
    }
}
