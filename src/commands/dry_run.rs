//! Dry-run command flow for previewing what a backup would do.

use anyhow::{Context, Result};
use playlist_backup::{BackupEngine, Catalog, collect_playlists};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ProcessExit;

pub async fn run_dry_run_preview(
    engine: &BackupEngine,
    catalog: &dyn Catalog,
    favorites_id: u64,
    cancel: &CancellationToken,
) -> Result<ProcessExit> {
    let collected = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            warn!("Dry run canceled");
            return Ok(ProcessExit::Canceled);
        }
        collected = collect_playlists(catalog, favorites_id) => collected,
    };
    let playlists = collected.context("failed to collect playlists")?;
    let plan = engine.plan(&playlists).await?;

    println!(
        "Dry run preview: {} playlist(s), tracks in {}",
        playlists.len(),
        engine.store().tracks_dir().display()
    );
    for playlist in plan.playlists() {
        println!(
            "- {}: {} to download, {} present, {} unavailable",
            playlist.name, playlist.downloaded, playlist.skipped, playlist.unavailable
        );
    }
    println!(
        "Total: {} to download, {} present, {} unavailable",
        plan.downloaded(),
        plan.skipped(),
        plan.unavailable()
    );

    info!(
        would_download = plan.downloaded(),
        skipped = plan.skipped(),
        unavailable = plan.unavailable(),
        "Dry run - no files written"
    );
    Ok(ProcessExit::Success)
}
