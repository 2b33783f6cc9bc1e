//! Integration tests for the backup engine.
//!
//! These tests drive BackupEngine with in-process fakes for the catalog,
//! transport and tagger, writing into temporary directories.

use std::sync::Arc;
use std::time::Duration;

use playlist_backup::{
    DownloadError, EngineError, Playlist, TagFailurePolicy, Track, download::TrackError,
};
use tokio_util::sync::CancellationToken;

mod support;
use support::{Behavior, FakeCatalog, FakeTagger, FakeTransport, Workspace, payload, track, track_url};

fn five_tracks() -> Vec<Track> {
    (1..=5).map(|id| track(id, &format!("Song {id}"), "Band")).collect()
}

fn fakes(
    catalog: FakeCatalog,
    transport: FakeTransport,
    tagger: FakeTagger,
) -> (Arc<FakeCatalog>, Arc<FakeTransport>, Arc<FakeTagger>) {
    (Arc::new(catalog), Arc::new(transport), Arc::new(tagger))
}

// ==================== Resume ====================

#[tokio::test]
async fn test_existing_file_is_skipped_without_network() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.tracks_dir()).unwrap();
    std::fs::write(ws.tracks_dir().join("Band - Song 1.mp3"), b"old").unwrap();

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![track(1, "Song 1", "Band"), track(2, "Song 2", "Band")],
    )];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.skipped(), 1);
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(catalog.resolved(), vec![2]);
    assert_eq!(transport.fetched(), vec![track_url(2)]);
    assert_eq!(
        std::fs::read(ws.tracks_dir().join("Band - Song 1.mp3")).unwrap(),
        b"old"
    );
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let ws = Workspace::new();
    let playlists = vec![Playlist::new(1, "Mix", five_tracks())];

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let first = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.downloaded(), 5);

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let second = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.skipped(), 5);
    assert_eq!(second.downloaded(), 0);
    assert!(catalog.resolved().is_empty());
    assert!(transport.fetched().is_empty());
    assert!(tagger.tagged().is_empty());
}

#[tokio::test]
async fn test_track_in_two_playlists_is_fetched_once() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let shared = track(1, "Song 1", "Band");
    let playlists = vec![
        Playlist::new(1, "Mix", vec![shared.clone()]),
        Playlist::new(3, "Favorites", vec![shared]),
    ];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.fetched(), vec![track_url(1)]);
    assert_eq!(stats.playlists()[0].downloaded, 1);
    assert_eq!(stats.playlists()[1].skipped, 1);
}

// ==================== Atomicity ====================

#[tokio::test]
async fn test_failed_stream_leaves_no_file_and_next_run_retries() {
    let ws = Workspace::new();
    let playlists = vec![Playlist::new(1, "Mix", vec![track(1, "Song 1", "Band")])];

    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new(),
        FakeTransport::new().with_behavior(1, Behavior::DiskFullMidStream),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let result = engine.run(&playlists, &CancellationToken::new()).await;

    assert!(result.is_err());
    assert!(ws.track_files().is_empty(), "no final or staging file");
    assert!(tagger.tagged().is_empty());

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.downloaded(), 1);
    assert_eq!(
        std::fs::read(ws.tracks_dir().join("Band - Song 1.mp3")).unwrap(),
        payload(1)
    );
}

#[tokio::test]
async fn test_stale_staging_files_are_removed() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.tracks_dir()).unwrap();
    std::fs::write(ws.tracks_dir().join(".tmpA1b2C3.part"), b"half").unwrap();
    std::fs::write(ws.tracks_dir().join("Band - Kept.mp3"), b"done").unwrap();

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    engine.run(&[], &CancellationToken::new()).await.unwrap();

    assert_eq!(ws.track_files(), vec!["Band - Kept.mp3"]);
}

// ==================== Favorites ====================

#[tokio::test]
async fn test_backup_appends_favorites_after_listing() {
    let ws = Workspace::new();
    let catalog = FakeCatalog::new()
        .with_listed(Playlist::new(1, "A", vec![track(10, "One", "X")]))
        .with_hidden(Playlist::new(3, "Liked", vec![track(11, "Two", "Y")]));
    let (catalog, transport, tagger) = fakes(catalog, FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);

    let stats = engine.backup(&CancellationToken::new()).await.unwrap();

    let names: Vec<_> = stats.playlists().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "Favorites"]);
    assert_eq!(stats.downloaded(), 2);

    let favorites = ws.read_playlist_file("favorites.yaml");
    assert_eq!(favorites.id, 3);
    assert_eq!(favorites.name, "Favorites");
    assert_eq!(favorites.tracks[0].title, "Two");
    assert!(ws.playlists_dir().join("a.yaml").exists());
}

#[tokio::test]
async fn test_backup_missing_playlist_is_fatal() {
    let ws = Workspace::new();
    let catalog = FakeCatalog::new().with_listed(Playlist::new(1, "A", Vec::new()));
    let (catalog, transport, tagger) = fakes(catalog, FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);

    let err = engine.backup(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, EngineError::Collect(_)));
    assert!(err.to_string().contains("'Favorites'"));
}

// ==================== Unavailable ====================

#[tokio::test]
async fn test_unavailable_track_makes_no_calls() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![track(1, "Gone", "Band").unavailable()],
    )];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.unavailable(), 1);
    assert!(catalog.resolved().is_empty());
    assert!(transport.fetched().is_empty());
    assert!(ws.track_files().is_empty());
}

#[tokio::test]
async fn test_resolution_failure_is_unavailable_and_run_continues() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new().with_unresolvable(1),
        FakeTransport::new(),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![track(1, "Song 1", "Band"), track(2, "Song 2", "Band")],
    )];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.unavailable(), 1);
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(transport.fetched(), vec![track_url(2)]);
}

// ==================== Cancellation ====================

#[tokio::test]
async fn test_cancel_after_second_track_keeps_two_files() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new(),
        FakeTransport::new().cancel_after(2),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(1, "Mix", five_tracks())];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert!(stats.was_canceled());
    assert_eq!(stats.downloaded(), 2);
    assert_eq!(catalog.resolved(), vec![1, 2]);
    assert_eq!(
        ws.track_files(),
        vec!["Band - Song 1.mp3", "Band - Song 2.mp3"]
    );
}

#[tokio::test]
async fn test_cancel_mid_stream_removes_staging_file() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new(),
        FakeTransport::new().with_behavior(2, Behavior::CancelMidStream),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(1, "Mix", five_tracks())];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert!(stats.was_canceled());
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(ws.track_files(), vec!["Band - Song 1.mp3"]);
    assert_eq!(tagger.tagged().len(), 1);
}

#[tokio::test]
async fn test_pre_canceled_run_does_nothing() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let stats = engine
        .run(&[Playlist::new(1, "Mix", five_tracks())], &cancel)
        .await
        .unwrap();

    assert!(stats.was_canceled());
    assert_eq!(stats.total(), 0);
    assert!(!ws.playlists_dir().exists());
    assert!(!ws.tracks_dir().exists());
}

#[tokio::test]
async fn test_cancel_between_playlists_skips_remaining_metadata() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new(),
        FakeTransport::new().cancel_after(1),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![
        Playlist::new(1, "First", vec![track(1, "Song 1", "Band")]),
        Playlist::new(2, "Second", Vec::new()),
    ];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert!(stats.was_canceled());
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(stats.playlists().len(), 1);
    assert!(ws.playlists_dir().join("first.yaml").exists());
    assert!(!ws.playlists_dir().join("second.yaml").exists());
}

// ==================== Pacing ====================

#[tokio::test(start_paused = true)]
async fn test_pause_follows_every_track_outcome() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.tracks_dir()).unwrap();
    std::fs::write(ws.tracks_dir().join("Band - Song 1.mp3"), b"done").unwrap();

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine_with_pause(
        &catalog,
        &transport,
        &tagger,
        TagFailurePolicy::Warn,
        Duration::from_secs(3),
    );
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![
            track(1, "Song 1", "Band"),
            track(2, "Song 2", "Band").unavailable(),
            track(3, "Song 3", "Band"),
        ],
    )];

    let start = tokio::time::Instant::now();
    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(stats.skipped(), 1);
    assert_eq!(stats.unavailable(), 1);
    assert_eq!(stats.downloaded(), 1);
    assert!(
        elapsed >= Duration::from_secs(9) && elapsed < Duration::from_secs(10),
        "expected three 3s pauses, got {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_wakes_pause_early() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine_with_pause(
        &catalog,
        &transport,
        &tagger,
        TagFailurePolicy::Warn,
        Duration::from_secs(3600),
    );
    let playlists = vec![Playlist::new(1, "Mix", five_tracks())];

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let start = tokio::time::Instant::now();
    let stats = engine.run(&playlists, &cancel).await.unwrap();

    assert!(stats.was_canceled());
    assert_eq!(stats.downloaded(), 1);
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(ws.track_files(), vec!["Band - Song 1.mp3"]);
}

// ==================== Naming ====================

#[tokio::test]
async fn test_file_name_uses_normalized_display_name() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let artists = ["A", "B", "C", "D"].map(String::from).to_vec();
    let playlists = vec![Playlist::new(
        1,
        "Road Trip",
        vec![Track::new(7, "X/Y", artists.clone())],
    )];

    engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ws.track_files(), vec!["A, B, C - X-Y.mp3"]);
    assert!(ws.playlists_dir().join("road trip.yaml").exists());
    let tagged = tagger.tagged();
    assert_eq!(tagged[0].0, ws.tracks_dir().join("A, B, C - X-Y.mp3"));
    assert_eq!(tagged[0].1, "X/Y");
    assert_eq!(tagged[0].2, artists);
}

// ==================== Fatal errors ====================

#[tokio::test]
async fn test_disk_error_aborts_run_and_keeps_earlier_tracks() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) = fakes(
        FakeCatalog::new(),
        FakeTransport::new().with_behavior(2, Behavior::DiskFullMidStream),
        FakeTagger::new(),
    );
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(1, "Mix", five_tracks())];

    let err = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        EngineError::Track {
            playlist,
            track,
            source: TrackError::Fetch(DownloadError::Write { .. }),
        } => {
            assert_eq!(playlist, "Mix");
            assert_eq!(track, "Band - Song 2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ws.track_files(), vec!["Band - Song 1.mp3"]);
    assert_eq!(transport.fetched(), vec![track_url(1), track_url(2)]);
    assert_eq!(catalog.resolved(), vec![1, 2]);
}

#[tokio::test]
async fn test_tag_failure_warns_by_default() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::failing());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![track(1, "Song 1", "Band"), track(2, "Song 2", "Band")],
    )];

    let stats = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.downloaded(), 2);
    assert_eq!(tagger.tagged().len(), 2);
}

#[tokio::test]
async fn test_tag_failure_aborts_when_strict() {
    let ws = Workspace::new();
    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::failing());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Abort);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![track(1, "Song 1", "Band"), track(2, "Song 2", "Band")],
    )];

    let err = engine
        .run(&playlists, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Track {
            source: TrackError::Tag(_),
            ..
        }
    ));
    // The audio file was committed before tagging.
    assert_eq!(ws.track_files(), vec!["Band - Song 1.mp3"]);
    assert_eq!(transport.fetched().len(), 1);
}

// ==================== Dry run ====================

#[tokio::test]
async fn test_plan_classifies_without_side_effects() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.tracks_dir()).unwrap();
    std::fs::write(ws.tracks_dir().join("Band - Song 1.mp3"), b"done").unwrap();

    let (catalog, transport, tagger) =
        fakes(FakeCatalog::new(), FakeTransport::new(), FakeTagger::new());
    let engine = ws.engine(&catalog, &transport, &tagger, TagFailurePolicy::Warn);
    let playlists = vec![Playlist::new(
        1,
        "Mix",
        vec![
            track(1, "Song 1", "Band"),
            track(2, "Song 2", "Band").unavailable(),
            track(3, "Song 3", "Band"),
        ],
    )];

    let plan = engine.plan(&playlists).await.unwrap();

    assert_eq!(plan.skipped(), 1);
    assert_eq!(plan.unavailable(), 1);
    assert_eq!(plan.downloaded(), 1);
    assert!(catalog.resolved().is_empty());
    assert!(transport.fetched().is_empty());
    assert!(!ws.playlists_dir().exists());
    assert_eq!(ws.track_files(), vec!["Band - Song 1.mp3"]);
}
