//! Audio tag writing for finished track files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::prelude::{Accessor, TagExt, TaggedFileExt};
use lofty::tag::Tag;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors produced while tagging a file.
#[derive(Debug, Error)]
pub enum TagError {
    /// The tag library failed to read or write the file.
    #[error("failed to tag {path}: {source}")]
    Lofty {
        /// File being tagged.
        path: PathBuf,
        /// Underlying tag library error.
        #[source]
        source: lofty::error::LoftyError,
    },

    /// The file format offers no tag to write into.
    #[error("no writable tag for {path}")]
    NoTag {
        /// File being tagged.
        path: PathBuf,
    },

    /// The blocking tag task panicked or was aborted.
    #[error("tagging task for {path} failed: {source}")]
    Task {
        /// File being tagged.
        path: PathBuf,
        /// Join failure.
        #[source]
        source: tokio::task::JoinError,
    },
}

/// What the engine does when tagging a finished file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagFailurePolicy {
    /// Log a warning and keep going. The audio file stays in place.
    #[default]
    Warn,
    /// Abort the run.
    Abort,
}

impl TagFailurePolicy {
    /// Maps the `strict_tags` config switch to a policy.
    #[must_use]
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Abort } else { Self::Warn }
    }
}

/// Embeds title and artist metadata into an audio file.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Sets title and artists on the file at `path`.
    async fn set_tags(&self, path: &Path, title: &str, artists: &[String]) -> Result<(), TagError>;
}

/// [`Tagger`] backed by `lofty`; writes ID3v2 for MP3 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Tagger;

impl Id3Tagger {
    /// Creates a tagger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tagger for Id3Tagger {
    #[instrument(skip(self, artists), fields(path = %path.display()))]
    async fn set_tags(&self, path: &Path, title: &str, artists: &[String]) -> Result<(), TagError> {
        let owned_path = path.to_path_buf();
        let title = title.to_string();
        let artist = artists.join(", ");
        tokio::task::spawn_blocking(move || write_tags(&owned_path, title, artist))
            .await
            .map_err(|source| TagError::Task {
                path: path.to_path_buf(),
                source,
            })?
    }
}

fn write_tags(path: &Path, title: String, artist: String) -> Result<(), TagError> {
    let lofty_error = |source| TagError::Lofty {
        path: path.to_path_buf(),
        source,
    };

    let mut tagged = lofty::read_from_path(path).map_err(lofty_error)?;
    if tagged.primary_tag().is_none() {
        let tag_type = tagged.primary_tag_type();
        tagged.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged.primary_tag_mut() else {
        return Err(TagError::NoTag {
            path: path.to_path_buf(),
        });
    };

    tag.set_title(title);
    tag.set_artist(artist);
    tag.save_to_path(path, WriteOptions::default())
        .map_err(lofty_error)?;

    debug!("tags written");
    Ok(())
}
