//! Configuration file.
//!
//! YAML by default; a file with a `.toml` extension is read as TOML. Only
//! `token` and `fav_id` are required; everything else has a default.
//!
//! ```yaml
//! token: y0_AgAAAA...
//! fav_id: 3
//! playlists_dir: backup/playlists
//! tracks_dir: backup/tracks
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::DEFAULT_API_URL;
use crate::download::RetryPolicy;
use crate::download::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_ATTEMPTS, DEFAULT_PAUSE, DEFAULT_RETRY_WAIT_MAX,
    DEFAULT_RETRY_WAIT_MIN,
};
use crate::tagger::TagFailurePolicy;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

const RETRY_MAX_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML or has wrongly typed fields.
    #[error("failed to parse config file '{path}': {source}")]
    ParseYaml {
        /// Config file path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file is not valid TOML or has wrongly typed fields.
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A required field is absent or empty.
    #[error("missing required config value `{field}`")]
    Missing {
        /// Field name.
        field: &'static str,
    },

    /// A field is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// Value as written.
        value: String,
        /// Human-readable constraint.
        expected: String,
    },
}

/// Settings for a backup run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// OAuth token for the music service.
    #[serde(default)]
    pub token: String,
    /// Catalog id of the favorites collection.
    #[serde(default)]
    pub fav_id: u64,
    /// Directory for playlist metadata files.
    #[serde(default = "default_dir")]
    pub playlists_dir: PathBuf,
    /// Directory for track audio files.
    #[serde(default = "default_dir")]
    pub tracks_dir: PathBuf,
    /// Seconds to sleep between tracks.
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    /// Transport attempts per request.
    #[serde(default = "default_retry_max")]
    pub retry_max: u32,
    /// Minimum backoff between transport attempts, in seconds.
    #[serde(default = "default_retry_wait_min_secs")]
    pub retry_wait_min_secs: u64,
    /// Backoff cap between transport attempts, in seconds.
    #[serde(default = "default_retry_wait_max_secs")]
    pub retry_wait_max_secs: u64,
    /// Abort the run when tags cannot be written.
    #[serde(default)]
    pub strict_tags: bool,
    /// Base URL of the catalog API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_pause_secs() -> u64 {
    DEFAULT_PAUSE.as_secs()
}

fn default_retry_max() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_wait_min_secs() -> u64 {
    DEFAULT_RETRY_WAIT_MIN.as_secs()
}

fn default_retry_wait_max_secs() -> u64 {
    DEFAULT_RETRY_WAIT_MAX.as_secs()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Config {
    /// Reads, parses and validates the config file at `path`.
    ///
    /// The format follows the extension: `.toml` is TOML, anything else YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the file or the offending field.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(path, &raw)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(raw).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(raw).map_err(|source| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Checks required fields and ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing { field: "token" });
        }
        if self.fav_id == 0 {
            return Err(ConfigError::Missing { field: "fav_id" });
        }
        if !RETRY_MAX_RANGE.contains(&self.retry_max) {
            return Err(ConfigError::Invalid {
                field: "retry_max",
                value: self.retry_max.to_string(),
                expected: format!(
                    "range {}..={}",
                    RETRY_MAX_RANGE.start(),
                    RETRY_MAX_RANGE.end()
                ),
            });
        }
        if self.retry_wait_max_secs < self.retry_wait_min_secs {
            return Err(ConfigError::Invalid {
                field: "retry_wait_max_secs",
                value: self.retry_wait_max_secs.to_string(),
                expected: format!(">= retry_wait_min_secs ({})", self.retry_wait_min_secs),
            });
        }
        if url::Url::parse(&self.api_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "api_url",
                value: self.api_url.clone(),
                expected: "an absolute URL".to_string(),
            });
        }
        Ok(())
    }

    /// Pause between tracks.
    #[must_use]
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }

    /// Transport retry policy built from the retry settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max,
            Duration::from_secs(self.retry_wait_min_secs),
            Duration::from_secs(self.retry_wait_max_secs),
            DEFAULT_BACKOFF_MULTIPLIER,
        )
    }

    /// Tag failure policy selected by `strict_tags`.
    #[must_use]
    pub fn tag_policy(&self) -> TagFailurePolicy {
        TagFailurePolicy::from_strict(self.strict_tags)
    }
}
