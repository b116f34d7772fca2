//! Lyric sidecar files
//!
//! Lyrics live next to the media file, sharing its stem: `.lrc` for synced
//! (timestamped) lyrics, `.txt` for plain text. Synced supersedes plain, so
//! writing a synced sidecar removes a coexisting plain one.

use crate::record::LyricsStatus;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension for synced (LRC format) lyric sidecars
pub const SYNCED_LYRIC_EXT: &str = "lrc";

/// Extension for plain-text lyric sidecars
pub const PLAIN_LYRIC_EXT: &str = "txt";

/// Classify the lyric sidecar state of a media file.
///
/// A synced sidecar wins over a plain one when both exist.
pub fn probe(media_path: &Path) -> LyricsStatus {
    if media_path.with_extension(SYNCED_LYRIC_EXT).is_file() {
        return LyricsStatus::Synced;
    }
    if media_path.with_extension(PLAIN_LYRIC_EXT).is_file() {
        return LyricsStatus::Plain;
    }
    LyricsStatus::None
}

/// Path a sidecar of the given kind would occupy for a media file.
pub fn sidecar_path(media_path: &Path, synced: bool) -> PathBuf {
    let extension = if synced {
        SYNCED_LYRIC_EXT
    } else {
        PLAIN_LYRIC_EXT
    };
    media_path.with_extension(extension)
}

/// Persist lyric content next to a media file.
///
/// Writing synced lyrics deletes an existing plain sidecar; a failure to
/// delete is logged but does not fail the write.
pub fn write(media_path: &Path, content: &str, synced: bool) -> io::Result<LyricsStatus> {
    let path = sidecar_path(media_path, synced);
    std::fs::write(&path, content)?;
    debug!(path = %path.display(), synced, "Wrote lyric sidecar");

    if synced {
        let plain = sidecar_path(media_path, false);
        if plain.exists() {
            if let Err(e) = std::fs::remove_file(&plain) {
                warn!(path = %plain.display(), error = %e, "Could not remove superseded plain sidecar");
            }
        }
        return Ok(LyricsStatus::Synced);
    }

    Ok(LyricsStatus::Plain)
}
