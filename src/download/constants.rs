//! Constants for the download module (timeouts, retry, pacing).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default pause between tracks.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(3);

/// Default maximum transport attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Minimum backoff between transport attempts.
pub const DEFAULT_RETRY_WAIT_MIN: Duration = Duration::from_secs(10);

/// Backoff cap between transport attempts.
pub const DEFAULT_RETRY_WAIT_MAX: Duration = Duration::from_secs(30);

/// Backoff multiplier (doubles each attempt).
pub const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to backoff delays.
pub const MAX_JITTER: Duration = Duration::from_millis(500);

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Extension of track audio files.
pub const TRACK_EXTENSION: &str = "mp3";

/// Extension of playlist metadata files.
pub const PLAYLIST_EXTENSION: &str = "yaml";

/// Prefix of staging files written next to the final track path.
pub const STAGING_PREFIX: &str = ".";

/// Suffix of staging files written next to the final track path.
pub const STAGING_SUFFIX: &str = ".part";
