//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the library watcher core:
//! - Logging and tracing infrastructure
//! - Configuration management (key/value settings seam + typed config)
//! - HTTP client abstraction with a reqwest-backed implementation
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the domain crates depend on.
//! It establishes the logging conventions, the settings persistence seam,
//! and the HTTP seam used for all external catalog and lyrics calls.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;

pub use config::{JsonSettingsStore, SettingsHandle, SettingsStore, WatcherConfig};
pub use error::{Error, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
