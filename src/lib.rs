//! Playlist Backup Library
//!
//! This library backs up a user's playlists and tracks from a remote music
//! service to local disk. Runs are resumable: a track whose file already
//! exists is never fetched again, and partially downloaded files never
//! appear at their final path.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Remote catalog trait, Yandex Music adapter, playlist collection
//! - [`config`] - YAML or TOML configuration file
//! - [`download`] - Backup engine, HTTP transport with retry, local layout
//! - [`model`] - Playlist and track types
//! - [`playlist_file`] - Playlist metadata files
//! - [`tagger`] - Audio tag writing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod model;
pub mod playlist_file;
pub mod tagger;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, CollectError, YandexCatalog, collect_playlists};
pub use config::{Config, ConfigError};
pub use download::{
    BackupEngine, DownloadError, EngineError, EngineOptions, HttpClient, LocalStore, RetryPolicy,
    RunObserver, RunStats, Transport, TrackOutcome,
};
pub use model::{Playlist, PlaylistSummary, Track};
pub use tagger::{Id3Tagger, TagError, TagFailurePolicy, Tagger};
