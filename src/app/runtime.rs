use std::sync::Arc;

use anyhow::{Context, Result};
use playlist_backup::{
    BackupEngine, Catalog, Config, EngineOptions, HttpClient, Id3Tagger, LocalStore, RunStats,
    YandexCatalog,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{exit_handler, progress_manager::ProgressObserver, shutdown, terminal};
use crate::cli::Args;
use crate::{ProcessExit, commands};

pub(crate) async fn run_backup(args: &Args) -> Result<ProcessExit> {
    let config = Config::load(&args.config).context("invalid configuration")?;
    info!(
        playlists_dir = %config.playlists_dir.display(),
        tracks_dir = %config.tracks_dir.display(),
        "Playlist backup starting"
    );

    let cancel = CancellationToken::new();
    shutdown::spawn_signal_listener(cancel.clone());

    let connected = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(ProcessExit::Canceled),
        connected = YandexCatalog::connect(&config.token, &config.api_url) => connected,
    };
    let catalog: Arc<dyn Catalog> =
        Arc::new(connected.context("failed to connect to the music service")?);

    let engine = BackupEngine::new(
        Arc::clone(&catalog),
        Arc::new(HttpClient::new().with_retry_policy(config.retry_policy())),
        Arc::new(Id3Tagger::new()),
        LocalStore::new(config.playlists_dir.clone(), config.tracks_dir.clone()),
        EngineOptions::new(config.fav_id)
            .with_pause(config.pause())
            .with_tag_policy(config.tag_policy()),
    );

    if args.dry_run {
        return commands::run_dry_run_preview(&engine, catalog.as_ref(), config.fav_id, &cancel)
            .await;
    }

    let engine = engine.with_observer(Arc::new(ProgressObserver::new(
        terminal::progress_enabled(args.quiet),
    )));
    let stats = engine.backup(&cancel).await.context("backup failed")?;
    log_summary(&stats);

    Ok(exit_handler::determine_exit_outcome(&stats))
}

fn log_summary(stats: &RunStats) {
    for playlist in stats.playlists() {
        info!(
            playlist = %playlist.name,
            downloaded = playlist.downloaded,
            skipped = playlist.skipped,
            unavailable = playlist.unavailable,
            "Playlist summary"
        );
    }
    if stats.was_canceled() {
        warn!(
            downloaded = stats.downloaded(),
            "Backup canceled, completed tracks were kept"
        );
    } else {
        info!(
            downloaded = stats.downloaded(),
            skipped = stats.skipped(),
            unavailable = stats.unavailable(),
            total = stats.total(),
            "Backup complete"
        );
    }
}
