//! Atomic track writes.
//!
//! The payload is streamed into a hidden `.part` file in the target's
//! directory and renamed into place only after a complete, synced copy.
//! `NamedTempFile` removes the staging file on every other exit path.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::TrackError;
use crate::download::Transport;
use crate::download::constants::{STAGING_PREFIX, STAGING_SUFFIX};

/// Fetches `url` into `target` atomically and returns the byte count.
pub(super) async fn fetch_atomically(
    transport: &dyn Transport,
    url: &str,
    target: &Path,
    cancel: &CancellationToken,
) -> Result<u64, TrackError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(dir)
        .map_err(TrackError::Stage)?;
    let handle = staging.as_file().try_clone().map_err(TrackError::Stage)?;
    let mut file = tokio::fs::File::from_std(handle);

    let bytes = transport
        .fetch(url, &mut file, cancel)
        .await
        .map_err(TrackError::Fetch)?;

    file.flush().await.map_err(TrackError::Commit)?;
    file.sync_all().await.map_err(TrackError::Commit)?;
    drop(file);

    staging
        .persist(target)
        .map_err(|e| TrackError::Commit(e.error))?;
    debug!(bytes, path = %target.display(), "track committed");
    Ok(bytes)
}
