//! # Lyrics Fetching
//!
//! Searches external services for lyrics and persists them as sidecar files
//! next to the media they belong to.
//!
//! ## Overview
//!
//! - **Provider seam** (`provider`): synced and plain lyric search behind an
//!   async trait, with an LRCLib implementation
//! - **Fetch job** (`job`): runs lyric search for a batch of scanned tracks
//!   through a bounded worker pool, writing sidecars on hits and streaming
//!   updated records back to the host
//!
//! Synced lyrics supersede plain ones: saving a synced sidecar removes an
//! existing plain sidecar for the same file.
//!
//! ## Usage
//!
//! ```ignore
//! use core_lyrics::{LrcLibProvider, LyricFetchJob};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(LrcLibProvider::new(http_client));
//! let job = LyricFetchJob::new(provider, &config);
//! let updated = job.run(records, &cancel, updates_tx).await;
//! ```

pub mod error;
pub mod job;
pub mod provider;

pub use error::{LyricsError, Result};
pub use job::LyricFetchJob;
pub use provider::{LrcLibProvider, LyricsProvider, LyricsQuery};
