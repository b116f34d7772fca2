//! # Library Scanner
//!
//! Incrementally indexes configured music directories: walks each root in a
//! deterministic order, fingerprints files by content, extracts tags, probes
//! for lyric sidecars, and streams results to the host. Scans tolerate
//! interruption at any point and resume exactly where they left off.
//!
//! ## Overview
//!
//! - **Content hashing** (`hasher`): streams a file through SHA-256
//! - **Hash cache** (`cache`): one persisted table per root, keyed by
//!   relative path, detecting unchanged files without rehashing
//! - **Tag extraction** (`tags`): artist/album/title/track via `lofty`, with
//!   filename fallbacks
//! - **Lyric sidecars** (`sidecar`): probe and persist `.lrc`/`.txt`
//!   companions
//! - **Resume state** (`state`): per-root cursors into deterministically
//!   sorted file lists
//! - **Orchestration** (`orchestrator`): the resumable scan state machine
//!   driving all of the above
//!
//! ## Usage
//!
//! ```ignore
//! use core_scanner::{ScanOrchestrator, ScanState};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let orchestrator = ScanOrchestrator::new(vec!["/music".into()]);
//! let (tx, mut rx) = mpsc::channel(64);
//! let cancel = CancellationToken::new();
//!
//! let (state, summary) = orchestrator
//!     .run(ScanState::new(), &cancel, &tx)
//!     .await;
//! ```

pub mod cache;
pub mod error;
pub mod hasher;
pub mod orchestrator;
pub mod record;
pub mod sidecar;
pub mod state;
pub mod tags;

pub use cache::{CacheEntry, HashCache};
pub use error::{Result, ScanError};
pub use orchestrator::{
    HashFn, ScanEvent, ScanId, ScanOrchestrator, ScanOutcome, ScanSummary,
};
pub use record::{LyricsStatus, TrackRecord, TrackStatus};
pub use state::{RootProgress, ScanState};
pub use tags::{SupportedFormat, TagExtractor, TrackTags};
