use std::fmt;

/// Result of processing a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Payload fetched and committed to its final path.
    Downloaded,
    /// A file for the track was already present; no network call was made.
    SkippedExisting,
    /// The service cannot provide the track.
    Unavailable,
    /// Cancellation fired while the track was in progress.
    Canceled,
}

impl fmt::Display for TrackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Downloaded => "downloaded",
            Self::SkippedExisting => "skipped",
            Self::Unavailable => "unavailable",
            Self::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

/// Per-playlist outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistStats {
    /// Playlist name.
    pub name: String,
    /// Tracks downloaded in this run.
    pub downloaded: usize,
    /// Tracks skipped because their file already existed.
    pub skipped: usize,
    /// Tracks the service could not provide.
    pub unavailable: usize,
}

impl PlaylistStats {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: TrackOutcome) {
        match outcome {
            TrackOutcome::Downloaded => self.downloaded += 1,
            TrackOutcome::SkippedExisting => self.skipped += 1,
            TrackOutcome::Unavailable => self.unavailable += 1,
            TrackOutcome::Canceled => {}
        }
    }
}

/// Aggregated statistics from a backup run.
///
/// Playlists appear in processing order. When the run was canceled, the
/// last entry covers the playlist that was interrupted.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    playlists: Vec<PlaylistStats>,
    canceled: bool,
}

impl RunStats {
    pub(crate) fn canceled() -> Self {
        Self {
            playlists: Vec::new(),
            canceled: true,
        }
    }

    pub(crate) fn push(&mut self, playlist: PlaylistStats) {
        self.playlists.push(playlist);
    }

    pub(crate) fn mark_canceled(&mut self) {
        self.canceled = true;
    }

    /// Per-playlist counters.
    #[must_use]
    pub fn playlists(&self) -> &[PlaylistStats] {
        &self.playlists
    }

    /// Returns the number of tracks downloaded.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.playlists.iter().map(|p| p.downloaded).sum()
    }

    /// Returns the number of tracks skipped as already present.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.playlists.iter().map(|p| p.skipped).sum()
    }

    /// Returns the number of unavailable tracks.
    #[must_use]
    pub fn unavailable(&self) -> usize {
        self.playlists.iter().map(|p| p.unavailable).sum()
    }

    /// Returns the number of tracks accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded() + self.skipped() + self.unavailable()
    }

    /// True when the run stopped early because of cancellation.
    #[must_use]
    pub fn was_canceled(&self) -> bool {
        self.canceled
    }
}
