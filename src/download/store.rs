//! Local output layout and the resumability oracle.
//!
//! The tracks directory listing is the only record of completed work: a
//! track is done when a file with its display name exists there. Paths are
//! pure functions of the configured directories and the entity.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::constants::{PLAYLIST_EXTENSION, STAGING_PREFIX, STAGING_SUFFIX, TRACK_EXTENSION};
use crate::model::{Playlist, Track};

/// Result of a single enumeration of the tracks directory.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Final track paths already on disk.
    pub existing: HashSet<PathBuf>,
    /// Staging files left behind by an interrupted run.
    pub stale_partials: Vec<PathBuf>,
}

impl ScanResult {
    /// Returns true when `path` was present at scan time.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }
}

/// Maps playlists and tracks to their output paths.
#[derive(Debug, Clone)]
pub struct LocalStore {
    playlists_dir: PathBuf,
    tracks_dir: PathBuf,
}

impl LocalStore {
    /// Creates a store rooted at the given output directories.
    #[must_use]
    pub fn new(playlists_dir: impl Into<PathBuf>, tracks_dir: impl Into<PathBuf>) -> Self {
        Self {
            playlists_dir: playlists_dir.into(),
            tracks_dir: tracks_dir.into(),
        }
    }

    /// Directory holding playlist metadata files.
    #[must_use]
    pub fn playlists_dir(&self) -> &Path {
        &self.playlists_dir
    }

    /// Directory holding track audio files.
    #[must_use]
    pub fn tracks_dir(&self) -> &Path {
        &self.tracks_dir
    }

    /// `<tracks_dir>/<display name>.mp3`
    #[must_use]
    pub fn track_path(&self, track: &Track) -> PathBuf {
        self.tracks_dir
            .join(format!("{}.{TRACK_EXTENSION}", track.display_name()))
    }

    /// `<playlists_dir>/<lowercased name>.yaml`
    #[must_use]
    pub fn playlist_path(&self, playlist: &Playlist) -> PathBuf {
        self.playlists_dir.join(format!(
            "{}.{PLAYLIST_EXTENSION}",
            playlist.name.to_lowercase()
        ))
    }

    /// Enumerates the tracks directory once.
    ///
    /// Staging files are reported separately and never count as existing
    /// tracks. A missing directory scans as empty.
    ///
    /// # Errors
    ///
    /// Returns any IO error other than `NotFound` raised while reading the
    /// directory.
    #[instrument(skip(self), fields(dir = %self.tracks_dir.display()))]
    pub async fn scan(&self) -> Result<ScanResult, std::io::Error> {
        let mut result = ScanResult::default();
        let mut entries = match tokio::fs::read_dir(&self.tracks_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(result),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let path = self.tracks_dir.join(&name);
            if is_staging_name(&name.to_string_lossy()) {
                result.stale_partials.push(path);
            } else {
                result.existing.insert(path);
            }
        }

        debug!(
            existing = result.existing.len(),
            stale_partials = result.stale_partials.len(),
            "scanned tracks directory"
        );
        Ok(result)
    }
}

fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}
