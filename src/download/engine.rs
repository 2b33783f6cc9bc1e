//! Backup engine: turns playlists into local metadata files and audio files.
//!
//! Tracks are processed strictly one at a time with a fixed pause between
//! them. The tracks directory is enumerated once per run and the listing is
//! the only record of completed work, so an interrupted run can simply be
//! started again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use playlist_backup::catalog::YandexCatalog;
//! use playlist_backup::download::{BackupEngine, EngineOptions, HttpClient, LocalStore};
//! use playlist_backup::tagger::Id3Tagger;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = YandexCatalog::connect("token", "https://api.music.yandex.net").await?;
//! let engine = BackupEngine::new(
//!     Arc::new(catalog),
//!     Arc::new(HttpClient::new()),
//!     Arc::new(Id3Tagger::new()),
//!     LocalStore::new("playlists", "tracks"),
//!     EngineOptions::new(3),
//! );
//! let stats = engine.backup(&CancellationToken::new()).await?;
//! println!("Downloaded: {}, Skipped: {}", stats.downloaded(), stats.skipped());
//! # Ok(())
//! # }
//! ```

mod error;
mod staging;
mod stats;

pub use error::{EngineError, TrackError};
pub use stats::{PlaylistStats, RunStats, TrackOutcome};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::constants::DEFAULT_PAUSE;
use super::store::{LocalStore, ScanResult};
use super::Transport;
use crate::catalog::{Catalog, collect_playlists};
use crate::model::{Playlist, Track};
use crate::playlist_file::save_playlist;
use crate::tagger::{TagFailurePolicy, Tagger};

/// Receives progress events from the engine.
///
/// All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    /// Called once before the first playlist with the total track count.
    fn run_started(&self, _total_tracks: usize) {}

    /// Called when processing of a playlist begins.
    fn playlist_started(&self, _playlist: &Playlist) {}

    /// Called after each track with its outcome.
    fn track_finished(&self, _track: &Track, _outcome: TrackOutcome) {}

    /// Called once when the run ends without a fatal error.
    fn run_finished(&self, _stats: &RunStats) {}
}

struct SilentObserver;

impl RunObserver for SilentObserver {}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Sleep between tracks.
    pub pause: Duration,
    /// What to do when tagging fails.
    pub tag_policy: TagFailurePolicy,
    /// Catalog id of the favorites collection.
    pub favorites_id: u64,
}

impl EngineOptions {
    /// Options with the default pause and tag policy.
    #[must_use]
    pub fn new(favorites_id: u64) -> Self {
        Self {
            pause: DEFAULT_PAUSE,
            tag_policy: TagFailurePolicy::default(),
            favorites_id,
        }
    }

    /// Sets the pause between tracks.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the tag failure policy.
    #[must_use]
    pub fn with_tag_policy(mut self, tag_policy: TagFailurePolicy) -> Self {
        self.tag_policy = tag_policy;
        self
    }
}

/// Sequential, resumable playlist backup.
pub struct BackupEngine {
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn Transport>,
    tagger: Arc<dyn Tagger>,
    store: LocalStore,
    options: EngineOptions,
    observer: Arc<dyn RunObserver>,
}

impl BackupEngine {
    /// Creates an engine from its collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        transport: Arc<dyn Transport>,
        tagger: Arc<dyn Tagger>,
        store: LocalStore,
        options: EngineOptions,
    ) -> Self {
        debug!(
            pause_ms = options.pause.as_millis(),
            tag_policy = ?options.tag_policy,
            favorites_id = options.favorites_id,
            "creating backup engine"
        );
        Self {
            catalog,
            transport,
            tagger,
            store,
            options,
            observer: Arc::new(SilentObserver),
        }
    }

    /// Attaches a progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the output layout.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Collects the user's playlists (favorites included) and runs the backup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Collect`] if the catalog cannot be read, plus
    /// anything [`run`](Self::run) returns.
    #[instrument(skip_all)]
    pub async fn backup(&self, cancel: &CancellationToken) -> Result<RunStats, EngineError> {
        let collected = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(RunStats::canceled()),
            collected = collect_playlists(self.catalog.as_ref(), self.options.favorites_id) => collected,
        };
        let playlists = collected?;
        self.run(&playlists, cancel).await
    }

    /// Writes every playlist file and downloads every missing track, in order.
    ///
    /// Cancellation is not an error: the returned stats report
    /// [`RunStats::was_canceled`] and every file written so far is complete.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for directory, scan, playlist file, transport,
    /// disk and (strict) tagging failures. Earlier tracks stay on disk.
    #[instrument(skip_all, fields(playlists = playlists.len()))]
    pub async fn run(
        &self,
        playlists: &[Playlist],
        cancel: &CancellationToken,
    ) -> Result<RunStats, EngineError> {
        if cancel.is_cancelled() {
            return Ok(RunStats::canceled());
        }

        self.create_dirs().await?;
        let mut scan = self.scan_existing().await?;

        let total_tracks = playlists.iter().map(|p| p.tracks.len()).sum();
        info!(total_tracks, "starting backup");
        self.observer.run_started(total_tracks);

        let mut stats = RunStats::default();
        'playlists: for playlist in playlists {
            if cancel.is_cancelled() {
                stats.mark_canceled();
                break;
            }
            info!(playlist = %playlist.name, tracks = playlist.tracks.len(), "processing playlist");
            self.observer.playlist_started(playlist);

            save_playlist(playlist, &self.store.playlist_path(playlist))
                .await
                .map_err(|source| EngineError::SavePlaylist {
                    playlist: playlist.name.clone(),
                    source,
                })?;

            let mut playlist_stats = PlaylistStats::new(&playlist.name);
            for track in &playlist.tracks {
                if cancel.is_cancelled() {
                    stats.push(playlist_stats);
                    stats.mark_canceled();
                    break 'playlists;
                }

                let outcome = self.process_track(playlist, track, &mut scan, cancel).await?;
                info!(track = %track, %outcome, "track finished");
                self.observer.track_finished(track, outcome);
                playlist_stats.record(outcome);

                if outcome == TrackOutcome::Canceled {
                    stats.push(playlist_stats);
                    stats.mark_canceled();
                    break 'playlists;
                }

                self.pause(cancel).await;
            }

            info!(
                playlist = %playlist.name,
                downloaded = playlist_stats.downloaded,
                skipped = playlist_stats.skipped,
                unavailable = playlist_stats.unavailable,
                "playlist complete"
            );
            stats.push(playlist_stats);
        }

        info!(
            downloaded = stats.downloaded(),
            skipped = stats.skipped(),
            unavailable = stats.unavailable(),
            canceled = stats.was_canceled(),
            "backup finished"
        );
        self.observer.run_finished(&stats);
        Ok(stats)
    }

    /// Classifies every track without touching the network or the disk.
    ///
    /// Tracks that would be fetched are counted as downloaded in the result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scan`] if the tracks directory cannot be read.
    #[instrument(skip_all, fields(playlists = playlists.len()))]
    pub async fn plan(&self, playlists: &[Playlist]) -> Result<RunStats, EngineError> {
        let scan = self.store.scan().await.map_err(|source| EngineError::Scan {
            path: self.store.tracks_dir().to_path_buf(),
            source,
        })?;

        let mut stats = RunStats::default();
        for playlist in playlists {
            let mut playlist_stats = PlaylistStats::new(&playlist.name);
            for track in &playlist.tracks {
                let outcome = if scan.contains(&self.store.track_path(track)) {
                    TrackOutcome::SkippedExisting
                } else if track.available {
                    TrackOutcome::Downloaded
                } else {
                    TrackOutcome::Unavailable
                };
                info!(playlist = %playlist.name, track = %track, %outcome, "planned");
                playlist_stats.record(outcome);
            }
            stats.push(playlist_stats);
        }
        Ok(stats)
    }

    async fn create_dirs(&self) -> Result<(), EngineError> {
        for dir in [self.store.playlists_dir(), self.store.tracks_dir()] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| EngineError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn scan_existing(&self) -> Result<ScanResult, EngineError> {
        let scan = self.store.scan().await.map_err(|source| EngineError::Scan {
            path: self.store.tracks_dir().to_path_buf(),
            source,
        })?;
        for partial in &scan.stale_partials {
            remove_stale_partial(partial).await;
        }
        Ok(scan)
    }

    #[instrument(skip_all, fields(track_id = track.id, track = %track))]
    async fn process_track(
        &self,
        playlist: &Playlist,
        track: &Track,
        scan: &mut ScanResult,
        cancel: &CancellationToken,
    ) -> Result<TrackOutcome, EngineError> {
        let target = self.store.track_path(track);
        if scan.contains(&target) {
            debug!("already present");
            return Ok(TrackOutcome::SkippedExisting);
        }
        if !track.available {
            return Ok(TrackOutcome::Unavailable);
        }

        let resolved = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(TrackOutcome::Canceled),
            resolved = self.catalog.resolve_download_url(track.id) => resolved,
        };
        let url = match resolved {
            Ok(url) => url,
            Err(error) => {
                info!(error = %error, "download URL unavailable");
                return Ok(TrackOutcome::Unavailable);
            }
        };

        let fatal = |source| EngineError::Track {
            playlist: playlist.name.clone(),
            track: track.display_name(),
            source,
        };

        match staging::fetch_atomically(self.transport.as_ref(), &url, &target, cancel).await {
            Ok(_) => {}
            Err(TrackError::Fetch(error)) if error.is_canceled() => {
                return Ok(TrackOutcome::Canceled);
            }
            Err(source) => return Err(fatal(source)),
        }
        scan.existing.insert(target.clone());

        if let Err(error) = self
            .tagger
            .set_tags(&target, &track.title, &track.artists)
            .await
        {
            match self.options.tag_policy {
                TagFailurePolicy::Warn => warn!(error = %error, "failed to tag track, continuing"),
                TagFailurePolicy::Abort => return Err(fatal(TrackError::Tag(error))),
            }
        }

        Ok(TrackOutcome::Downloaded)
    }

    async fn pause(&self, cancel: &CancellationToken) {
        if self.options.pause.is_zero() {
            return;
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(self.options.pause) => {}
        }
    }
}

async fn remove_stale_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed stale staging file"),
        Err(error) => warn!(path = %path.display(), error = %error, "failed to remove stale staging file"),
    }
}
