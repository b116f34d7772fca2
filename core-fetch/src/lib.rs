//! # Bounded Fetch Pool
//!
//! Generic parallel-task runner with a capped worker count, used for
//! independent per-item network lookups (lyric search, artist identity
//! resolution).
//!
//! ## Overview
//!
//! A [`FetchPool`] runs one async task per work item across at most K worker
//! loops. Results are emitted in completion order, not submission order. A
//! shared [`CancellationToken`] is observed before each item is scheduled and
//! again before its body runs; in-flight items always finish, so external
//! state written by a task is never left half-done by the pool itself.
//!
//! Workers that talk to rate-limited services pace themselves with a fixed
//! inter-call delay, making effective throughput roughly
//! `workers / pace`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_fetch::FetchPool;
//! use tokio_util::sync::CancellationToken;
//!
//! let pool = FetchPool::new(8);
//! let cancel = CancellationToken::new();
//! let results = pool
//!     .run(names, &cancel, |name| async move { lookup(&name).await })
//!     .await;
//! ```

mod pool;

pub use pool::FetchPool;
