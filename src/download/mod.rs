//! Track download pipeline.
//!
//! This module provides the sequential backup engine and the pieces it is
//! built from.
//!
//! # Features
//!
//! - Streaming downloads into a staging file renamed into place on success
//! - Resume by directory listing: existing track files are never refetched
//! - Retry with exponential backoff and `Retry-After` support
//! - Cooperative cancellation through a shared `CancellationToken`
//!
//! # Example
//!
//! ```no_run
//! use playlist_backup::download::{HttpClient, RetryPolicy, Transport};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new().with_retry_policy(RetryPolicy::with_max_attempts(3));
//! let mut buffer = Vec::new();
//! let bytes = client
//!     .fetch("https://example.com/track.mp3", &mut buffer, &CancellationToken::new())
//!     .await?;
//! println!("Fetched {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod retry;
mod store;

pub use client::{HttpClient, Transport};
pub(crate) use client::default_user_agent;
pub use engine::{
    BackupEngine, EngineError, EngineOptions, PlaylistStats, RunObserver, RunStats, TrackError,
    TrackOutcome,
};
pub use error::DownloadError;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error, parse_retry_after};
pub use store::{LocalStore, ScanResult};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
