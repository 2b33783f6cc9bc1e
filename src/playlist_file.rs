//! Playlist metadata files.
//!
//! Each playlist is written as a YAML document next to the other
//! playlists. Files are overwritten on every run; they are cheap to
//! regenerate and never consulted for resumability.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::Playlist;

/// Errors produced while writing a playlist file.
#[derive(Debug, Error)]
pub enum PlaylistFileError {
    /// I/O error writing the playlist file to disk.
    #[error("I/O error writing playlist file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML serialization error (shouldn't occur for well-formed structs).
    #[error("YAML serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Writes `playlist` to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns [`PlaylistFileError`] if serialization or the write fails.
#[instrument(skip(playlist), fields(playlist = %playlist.name, path = %path.display()))]
pub async fn save_playlist(playlist: &Playlist, path: &Path) -> Result<(), PlaylistFileError> {
    let data = serde_yaml::to_string(playlist)?;
    tokio::fs::write(path, data).await?;
    debug!(tracks = playlist.tracks.len(), "playlist file written");
    Ok(())
}
