//! In-process fakes for the engine's collaborators.
//!
//! Each fake records the calls it receives so tests can assert that no
//! network work happened for skipped or unavailable tracks.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use playlist_backup::{
    BackupEngine, Catalog, CatalogError, DownloadError, EngineOptions, LocalStore, Playlist,
    PlaylistSummary, TagError, TagFailurePolicy, Tagger, Track, Transport,
};
use tempfile::TempDir;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

pub fn track_url(id: u64) -> String {
    format!("https://storage.test/get-mp3/{id}.mp3")
}

pub fn payload(id: u64) -> Vec<u8> {
    format!("ID3-audio-{id}").into_bytes()
}

pub fn track(id: u64, title: &str, artist: &str) -> Track {
    Track::new(id, title, vec![artist.to_string()])
}

/// Catalog serving fixed playlists and resolving every track to [`track_url`].
#[derive(Default)]
pub struct FakeCatalog {
    listing: Vec<PlaylistSummary>,
    playlists: HashMap<u64, Playlist>,
    unresolvable: HashSet<u64>,
    resolved: Mutex<Vec<u64>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a playlist to the listing and makes it fetchable.
    pub fn with_listed(mut self, playlist: Playlist) -> Self {
        self.listing
            .push(PlaylistSummary::new(playlist.id, playlist.name.clone()));
        self.playlists.insert(playlist.id, playlist);
        self
    }

    /// Makes a playlist fetchable without listing it (favorites).
    pub fn with_hidden(mut self, playlist: Playlist) -> Self {
        self.playlists.insert(playlist.id, playlist);
        self
    }

    pub fn with_unresolvable(mut self, track_id: u64) -> Self {
        self.unresolvable.insert(track_id);
        self
    }

    pub fn resolved(&self) -> Vec<u64> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError> {
        Ok(self.listing.clone())
    }

    async fn get_playlist(&self, id: u64) -> Result<Playlist, CatalogError> {
        self.playlists
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::HttpStatus {
                endpoint: format!("/playlists/{id}"),
                status: 404,
            })
    }

    async fn resolve_download_url(&self, track_id: u64) -> Result<String, CatalogError> {
        self.resolved.lock().unwrap().push(track_id);
        if self.unresolvable.contains(&track_id) {
            return Err(CatalogError::Unavailable { track_id });
        }
        Ok(track_url(track_id))
    }
}

/// How the fake transport answers a given URL.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Writes half the payload, then fails as a local write error.
    DiskFullMidStream,
    /// Writes half the payload, then cancels the run's token.
    CancelMidStream,
}

/// Transport writing [`payload`] for each URL unless told otherwise.
#[derive(Default)]
pub struct FakeTransport {
    behaviors: HashMap<String, Behavior>,
    cancel_after: Option<usize>,
    fetched: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(mut self, track_id: u64, behavior: Behavior) -> Self {
        self.behaviors.insert(track_url(track_id), behavior);
        self
    }

    /// Cancels the run's token once `count` fetches have completed.
    pub fn cancel_after(mut self, count: usize) -> Self {
        self.cancel_after = Some(count);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let count = {
            let mut fetched = self.fetched.lock().unwrap();
            fetched.push(url.to_string());
            fetched.len()
        };
        let id: u64 = url
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_suffix(".mp3"))
            .and_then(|id| id.parse().ok())
            .unwrap();
        let body = payload(id);
        let half = &body[..body.len() / 2];

        match self.behaviors.get(url) {
            Some(Behavior::DiskFullMidStream) => {
                sink.write_all(half).await.unwrap();
                return Err(DownloadError::write(
                    url,
                    std::io::Error::other("no space left on device"),
                ));
            }
            Some(Behavior::CancelMidStream) => {
                sink.write_all(half).await.unwrap();
                cancel.cancel();
                return Err(DownloadError::canceled(url));
            }
            None => {}
        }

        sink.write_all(&body).await.unwrap();
        sink.flush().await.unwrap();
        if self.cancel_after == Some(count) {
            cancel.cancel();
        }
        Ok(body.len() as u64)
    }
}

/// Tagger recording the files it was asked to tag.
#[derive(Default)]
pub struct FakeTagger {
    fail: bool,
    tagged: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
}

impl FakeTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn tagged(&self) -> Vec<(PathBuf, String, Vec<String>)> {
        self.tagged.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tagger for FakeTagger {
    async fn set_tags(&self, path: &Path, title: &str, artists: &[String]) -> Result<(), TagError> {
        self.tagged
            .lock()
            .unwrap()
            .push((path.to_path_buf(), title.to_string(), artists.to_vec()));
        if self.fail {
            return Err(TagError::NoTag {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Output directories under a temp root.
pub struct Workspace {
    pub temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn playlists_dir(&self) -> PathBuf {
        self.temp.path().join("playlists")
    }

    pub fn tracks_dir(&self) -> PathBuf {
        self.temp.path().join("tracks")
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(self.playlists_dir(), self.tracks_dir())
    }

    /// Sorted file names in the tracks directory, hidden files included.
    pub fn track_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.tracks_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<_> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Reads back a playlist file from the playlists directory.
    pub fn read_playlist_file(&self, file_name: &str) -> Playlist {
        let raw = std::fs::read_to_string(self.playlists_dir().join(file_name)).unwrap();
        serde_yaml::from_str(&raw).unwrap()
    }

    /// Engine with favorites id 3 and no pause between tracks.
    pub fn engine(
        &self,
        catalog: &Arc<FakeCatalog>,
        transport: &Arc<FakeTransport>,
        tagger: &Arc<FakeTagger>,
        policy: TagFailurePolicy,
    ) -> BackupEngine {
        self.engine_with_pause(catalog, transport, tagger, policy, Duration::ZERO)
    }

    pub fn engine_with_pause(
        &self,
        catalog: &Arc<FakeCatalog>,
        transport: &Arc<FakeTransport>,
        tagger: &Arc<FakeTagger>,
        policy: TagFailurePolicy,
        pause: Duration,
    ) -> BackupEngine {
        BackupEngine::new(
            Arc::clone(catalog) as Arc<dyn Catalog>,
            Arc::clone(transport) as Arc<dyn Transport>,
            Arc::clone(tagger) as Arc<dyn Tagger>,
            self.store(),
            EngineOptions::new(3)
                .with_pause(pause)
                .with_tag_policy(policy),
        )
    }
}
