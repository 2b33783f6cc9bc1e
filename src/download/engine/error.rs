use std::path::PathBuf;

use crate::catalog::CollectError;
use crate::download::DownloadError;
use crate::playlist_file::PlaylistFileError;
use crate::tagger::TagError;

/// Fatal error that aborts a backup run.
///
/// Expected per-track conditions (already present, unavailable, canceled)
/// never surface here; they are counted in [`RunStats`](super::RunStats).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An output directory could not be created.
    #[error("create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The tracks directory could not be enumerated.
    #[error("scan tracks directory {path}: {source}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Playlists could not be collected from the catalog.
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// A playlist metadata file could not be written.
    #[error("save playlist '{playlist}': {source}")]
    SavePlaylist {
        /// Playlist name.
        playlist: String,
        /// Underlying serializer error.
        #[source]
        source: PlaylistFileError,
    },

    /// A track failed in a way that stops the run.
    #[error("playlist '{playlist}', track '{track}': {source}")]
    Track {
        /// Playlist name.
        playlist: String,
        /// Track display name.
        track: String,
        /// What went wrong.
        #[source]
        source: TrackError,
    },
}

/// Fatal failure while downloading a single track.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// The transport failed to deliver the payload.
    #[error("download failed: {0}")]
    Fetch(#[source] DownloadError),

    /// The staging file could not be created.
    #[error("create staging file: {0}")]
    Stage(#[source] std::io::Error),

    /// The staging file could not be synced or moved into place.
    #[error("commit track file: {0}")]
    Commit(#[source] std::io::Error),

    /// Tags could not be written and the policy is strict.
    #[error("tagging failed: {0}")]
    Tag(#[source] TagError),
}
