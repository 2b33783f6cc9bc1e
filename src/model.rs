//! Playlist and track types shared by the catalog, the engine and the
//! playlist serializer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of artists kept in a track's display name.
pub const DISPLAY_ARTISTS: usize = 3;

/// A single remote audio item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identity of the track.
    pub id: u64,
    /// Track title as reported by the catalog.
    pub title: String,
    /// Performing artists, in catalog order.
    pub artists: Vec<String>,
    /// Whether the catalog reports the track as playable.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Track {
    /// Creates an available track.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artists,
            available: true,
        }
    }

    /// Marks the track as unavailable.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Returns the display name, which doubles as the on-disk file key.
    ///
    /// Format is `"<artists> - <title>"` with at most [`DISPLAY_ARTISTS`]
    /// artists joined by `", "`. Every `/` is replaced with `-` so the name
    /// is a single path component.
    #[must_use]
    pub fn display_name(&self) -> String {
        let artists = &self.artists[..self.artists.len().min(DISPLAY_ARTISTS)];
        format!("{} - {}", artists.join(", "), self.title).replace('/', "-")
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// A named, ordered collection of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Catalog identity (the configured constant for favorites).
    pub id: u64,
    /// Playlist title.
    pub name: String,
    /// Tracks in catalog order.
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Creates a playlist.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            id,
            name: name.into(),
            tracks,
        }
    }
}

/// Listing entry returned by the catalog before tracks are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    /// Catalog identity.
    pub id: u64,
    /// Playlist title.
    pub title: String,
}

impl PlaylistSummary {
    /// Creates a listing entry.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}
