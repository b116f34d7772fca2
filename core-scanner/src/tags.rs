//! Audio tag extraction
//!
//! Reads artist/album/title/track from the supported container formats using
//! `lofty`. Containers spell the same semantic field under different keys, so
//! every field is looked up through an ordered candidate list and the first
//! non-empty hit wins. Extraction never fails a file: any read error degrades
//! to a filename-derived title and the unknown sentinels.

use crate::record::{DEFAULT_TRACK_NUMBER, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE};
use lofty::config::ParseOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::path::Path;
use tracing::warn;

/// Candidate keys per semantic field, in priority order
const ARTIST_KEYS: &[ItemKey] = &[ItemKey::TrackArtist, ItemKey::AlbumArtist];
const ALBUM_KEYS: &[ItemKey] = &[ItemKey::AlbumTitle];
const TITLE_KEYS: &[ItemKey] = &[ItemKey::TrackTitle];
const TRACK_KEYS: &[ItemKey] = &[ItemKey::TrackNumber];

/// Closed set of container formats the scanner understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    Mp3,
    Flac,
    M4a,
    Ogg,
}

impl SupportedFormat {
    /// Classify a path by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "m4a" | "mp4" => Some(Self::M4a),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }
}

/// Tag values for one file, with fallbacks already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Zero-padded 2-digit track number, `"00"` when unknown
    pub track_number: String,
}

impl TrackTags {
    /// Tags for a file whose container could not be read at all.
    fn fallback(path: &Path) -> Self {
        Self {
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            title: title_from_stem(path),
            track_number: DEFAULT_TRACK_NUMBER.to_string(),
        }
    }
}

/// Audio tag extractor
pub struct TagExtractor {
    parse_options: ParseOptions,
}

impl TagExtractor {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Extract tags from a file, degrading instead of failing.
    pub fn extract(&self, path: &Path) -> TrackTags {
        let tag = match self.read_primary_tag(path) {
            Ok(Some(tag)) => tag,
            Ok(None) => {
                warn!(path = %path.display(), "No tags found, using filename as title");
                return TrackTags::fallback(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tag read error, using filename as title");
                return TrackTags::fallback(path);
            }
        };

        let artist =
            first_tag_value(&tag, ARTIST_KEYS).unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let album = first_tag_value(&tag, ALBUM_KEYS).unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
        let title = first_tag_value(&tag, TITLE_KEYS).unwrap_or_else(|| title_from_stem(path));
        let track_number = format_track_number(first_tag_value(&tag, TRACK_KEYS));

        TrackTags {
            artist,
            album,
            title,
            track_number,
        }
    }

    fn read_primary_tag(&self, path: &Path) -> lofty::error::Result<Option<Tag>> {
        let tagged = Probe::open(path)?.options(self.parse_options).read()?;
        Ok(tagged.primary_tag().or_else(|| tagged.first_tag()).cloned())
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// First non-empty value among the candidate keys, trimmed.
fn first_tag_value(tag: &Tag, keys: &[ItemKey]) -> Option<String> {
    keys.iter().find_map(|key| {
        tag.get_string(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Normalize a raw track-number value.
///
/// Accepts the `"N/total"` form, keeps the numeric prefix, and zero-pads to
/// two digits; anything non-numeric yields `"00"`.
fn format_track_number(raw: Option<String>) -> String {
    if let Some(raw) = raw {
        let number = raw.split('/').next().unwrap_or("").trim();
        if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
            return format!("{:0>2}", number);
        }
    }
    DEFAULT_TRACK_NUMBER.to_string()
}

/// Title derived from the filename stem.
///
/// A stem shaped like `"01 - Song Title"` is cleaned up to `"Song Title"`.
fn title_from_stem(path: &Path) -> String {
    let stem = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.trim().is_empty() => stem,
        _ => return UNKNOWN_TITLE.to_string(),
    };

    if let Some((prefix, rest)) = stem.split_once(" - ") {
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
            return rest.to_string();
        }
    }

    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_format_from_path() {
        assert_eq!(
            SupportedFormat::from_path(Path::new("a.mp3")),
            Some(SupportedFormat::Mp3)
        );
        assert_eq!(
            SupportedFormat::from_path(Path::new("a.FLAC")),
            Some(SupportedFormat::Flac)
        );
        assert_eq!(
            SupportedFormat::from_path(Path::new("a.m4a")),
            Some(SupportedFormat::M4a)
        );
        assert_eq!(
            SupportedFormat::from_path(Path::new("a.mp4")),
            Some(SupportedFormat::M4a)
        );
        assert_eq!(
            SupportedFormat::from_path(Path::new("a.ogg")),
            Some(SupportedFormat::Ogg)
        );
        assert_eq!(SupportedFormat::from_path(Path::new("a.wav")), None);
        assert_eq!(SupportedFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_format_track_number() {
        assert_eq!(format_track_number(Some("1".to_string())), "01");
        assert_eq!(format_track_number(Some("7/12".to_string())), "07");
        assert_eq!(format_track_number(Some("12".to_string())), "12");
        assert_eq!(format_track_number(Some("123".to_string())), "123");
        assert_eq!(format_track_number(Some("A".to_string())), "00");
        assert_eq!(format_track_number(Some("".to_string())), "00");
        assert_eq!(format_track_number(None), "00");
    }

    #[test]
    fn test_title_from_stem() {
        assert_eq!(
            title_from_stem(Path::new("/m/01 - Some Song.mp3")),
            "Some Song"
        );
        assert_eq!(
            title_from_stem(Path::new("/m/12 - A - B.flac")),
            "A - B"
        );
        assert_eq!(title_from_stem(Path::new("/m/Plain Title.ogg")), "Plain Title");
        assert_eq!(
            title_from_stem(Path::new("/m/Intro - Live.mp3")),
            "Intro - Live"
        );
    }

    #[test]
    fn test_extract_unreadable_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02 - Broken Song.mp3");
        std::fs::write(&path, b"this is not real audio data").unwrap();

        let tags = TagExtractor::new().extract(&path);
        assert_eq!(tags.artist, UNKNOWN_ARTIST);
        assert_eq!(tags.album, UNKNOWN_ALBUM);
        assert_eq!(tags.title, "Broken Song");
        assert_eq!(tags.track_number, "00");
    }
}
