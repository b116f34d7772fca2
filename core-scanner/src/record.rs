//! Track record model
//!
//! One [`TrackRecord`] is created per discovered file and filled in as each
//! processing stage completes. Records are streamed to the host as they
//! finish; a fresh (non-resumed) scan replaces the whole set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sentinel used when no artist tag is present
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Sentinel used when no album tag is present
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Sentinel used when no title tag is present
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Default zero-padded track number
pub const DEFAULT_TRACK_NUMBER: &str = "00";

/// Processing outcome for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Not yet processed
    Pending,
    /// Hashed and fully tagged
    Ok,
    /// Artist or album tag is missing
    MissingTags,
    /// Content digest differs from the cached one
    HashMismatch,
    /// Content digest could not be computed
    HashFailed,
    /// The file could not be read at all
    FileError,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Pending => "pending",
            TrackStatus::Ok => "ok",
            TrackStatus::MissingTags => "missing_tags",
            TrackStatus::HashMismatch => "hash_mismatch",
            TrackStatus::HashFailed => "hash_failed",
            TrackStatus::FileError => "file_error",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lyric sidecar state for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsStatus {
    /// No lyric sidecar present
    None,
    /// Plain-text sidecar present
    Plain,
    /// Synced (timestamped) sidecar present
    Synced,
}

impl LyricsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LyricsStatus::None => "none",
            LyricsStatus::Plain => "plain",
            LyricsStatus::Synced => "synced",
        }
    }
}

impl std::fmt::Display for LyricsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One indexed media file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Absolute path to the media file
    pub path: PathBuf,
    /// File name without directories
    pub file_name: String,
    pub artist: String,
    pub album: String,
    /// Zero-padded 2-digit track number, `"00"` when unknown
    pub track_number: String,
    pub title: String,
    /// Hex-encoded content digest, empty when hashing failed
    pub digest: String,
    pub status: TrackStatus,
    pub lyrics: LyricsStatus,
    /// Detail for the failure that set a non-`Ok` status
    pub error: Option<String>,
}

impl TrackRecord {
    /// Create a pending record for a discovered file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            track_number: DEFAULT_TRACK_NUMBER.to_string(),
            title: UNKNOWN_TITLE.to_string(),
            digest: String::new(),
            status: TrackStatus::Pending,
            lyrics: LyricsStatus::None,
            error: None,
        }
    }

    /// Create a record for a file that could not be read at all.
    pub fn file_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let mut record = Self::new(path);
        record.status = TrackStatus::FileError;
        record.error = Some(message.into());
        record
    }

    /// Whether the artist tag carries a real value rather than the sentinel.
    pub fn has_known_artist(&self) -> bool {
        self.artist != UNKNOWN_ARTIST && !self.artist.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = TrackRecord::new("/music/artist/01 - song.mp3");
        assert_eq!(record.file_name, "01 - song.mp3");
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert_eq!(record.track_number, "00");
        assert_eq!(record.status, TrackStatus::Pending);
        assert_eq!(record.lyrics, LyricsStatus::None);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_file_error_record() {
        let record = TrackRecord::file_error("/music/broken.mp3", "permission denied");
        assert_eq!(record.status, TrackStatus::FileError);
        assert_eq!(record.error.as_deref(), Some("permission denied"));
        assert!(record.digest.is_empty());
    }

    #[test]
    fn test_has_known_artist() {
        let mut record = TrackRecord::new("/music/a.mp3");
        assert!(!record.has_known_artist());
        record.artist = "Some Band".to_string();
        assert!(record.has_known_artist());
    }
}
