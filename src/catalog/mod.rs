//! Remote music catalog access.
//!
//! - [`Catalog`] - Async trait the engine consumes
//! - [`YandexCatalog`] - Implementation for the Yandex Music API
//! - [`collect_playlists`] - Builds the full playlist list, favorites included

mod error;
mod yandex;

pub use error::CatalogError;
pub use yandex::{DEFAULT_API_URL, YandexCatalog};

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::model::{Playlist, PlaylistSummary};

/// Title given to the favorites pseudo-playlist.
pub const FAVORITES_TITLE: &str = "Favorites";

/// Read access to the user's playlists on a remote service.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Lists the user's own playlists, without tracks.
    async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError>;

    /// Fetches a playlist with its tracks in service order.
    async fn get_playlist(&self, id: u64) -> Result<Playlist, CatalogError>;

    /// Resolves a direct download URL for a track's audio payload.
    async fn resolve_download_url(&self, track_id: u64) -> Result<String, CatalogError>;
}

/// Error raised while collecting playlists, naming the playlist involved.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Listing the playlists failed.
    #[error("list playlists: {0}")]
    List(#[source] CatalogError),

    /// Fetching one playlist failed.
    #[error("get playlist '{title}': {source}")]
    Playlist {
        /// Title of the playlist from the listing.
        title: String,
        /// Underlying catalog error.
        #[source]
        source: CatalogError,
    },
}

/// Lists the user's playlists, appends the favorites pseudo-playlist and
/// fetches every playlist's tracks, preserving listing order.
///
/// The playlist name comes from the listing entry, so favorites is always
/// named [`FAVORITES_TITLE`].
///
/// # Errors
///
/// Returns [`CollectError`] on the first catalog failure.
#[instrument(skip(catalog))]
pub async fn collect_playlists(
    catalog: &dyn Catalog,
    favorites_id: u64,
) -> Result<Vec<Playlist>, CollectError> {
    let mut summaries = catalog.list_playlists().await.map_err(CollectError::List)?;
    summaries.push(PlaylistSummary::new(favorites_id, FAVORITES_TITLE));

    let mut playlists = Vec::with_capacity(summaries.len());
    for summary in summaries {
        info!(playlist = %summary.title, "fetching playlist");
        let fetched = catalog
            .get_playlist(summary.id)
            .await
            .map_err(|source| CollectError::Playlist {
                title: summary.title.clone(),
                source,
            })?;
        playlists.push(Playlist::new(summary.id, summary.title, fetched.tracks));
    }

    Ok(playlists)
}
