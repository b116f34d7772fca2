//! # Catalog Integration
//!
//! Resolves scanned artists against the MusicBrainz catalog and reconciles
//! their current release groups against a persisted "known releases" set,
//! surfacing only new output.
//!
//! ## Overview
//!
//! - **Auth seam** (`auth`): the core only needs "obtain a bearer token";
//!   the OAuth browser/callback plumbing lives in the host
//! - **Client** (`client`): artist search and release-group listing over the
//!   HTTP seam, with the catalog's required User-Agent
//! - **Resolver** (`resolver`): bounded-parallel artist-name → catalog-id
//!   lookup with rate-limit pacing
//! - **Known releases** (`known`): persisted per-artist release-group id
//!   sets, grown monotonically
//! - **Reconciler** (`reconciler`): per-artist novelty detection with
//!   per-artist persistence, so interruption loses at most one artist
//!
//! ## Usage
//!
//! ```ignore
//! use core_catalog::{ArtistResolver, MusicBrainzClient, ReleaseReconciler};
//! use std::sync::Arc;
//!
//! let client = Arc::new(MusicBrainzClient::new(http, tokens, user_agent));
//! let resolver = ArtistResolver::new(Arc::clone(&client), &config);
//! let identities = resolver.resolve(artist_names, &cancel).await;
//!
//! let reconciler = ReleaseReconciler::new(client, known_path, &config);
//! let new_releases = reconciler.reconcile(&identities, &cancel).await?;
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod known;
pub mod reconciler;
pub mod resolver;

pub use auth::{StaticTokenProvider, TokenProvider};
pub use client::{ArtistIdentity, MusicBrainzClient, ReleaseGroupRef};
pub use error::{CatalogError, Result};
pub use known::KnownReleaseSet;
pub use reconciler::{DiscoveredRelease, ReleaseReconciler};
pub use resolver::ArtistResolver;
