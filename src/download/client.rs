//! HTTP transport for streaming track payloads.
//!
//! [`HttpClient`] fetches a URL with retry and backoff and streams the body
//! into a caller-provided sink. Retries only cover obtaining a successful
//! response; once body bytes have reached the sink a failure is returned
//! as-is, since the sink can no longer be rewound.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error, parse_retry_after};

/// Byte-stream fetch primitive consumed by the download engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and writes the whole body into `sink`.
    ///
    /// Returns the number of bytes written. Must return
    /// [`DownloadError::Canceled`] promptly once `cancel` fires.
    async fn fetch(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>;
}

/// HTTP client for downloading payloads with retry support.
///
/// Created once and reused for every track, taking advantage of connection
/// pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts and retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Sends GET requests until a successful response arrives or the retry
    /// policy gives up.
    async fn send_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "sending request");

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(DownloadError::canceled(url)),
                result = self.send_request(url) => result,
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay: backoff_delay,
                    attempt: next_attempt,
                } => {
                    let retry_after = retry_after_delay(&error, failure_type);
                    let delay = retry_after.map_or(backoff_delay, |d| d.max(backoff_delay));
                    info!(
                        url = %url,
                        attempt = next_attempt,
                        max_attempts = self.retry_policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        using_retry_after = retry_after.is_some(),
                        error = %error,
                        "retrying request"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(DownloadError::canceled(url)),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %url, %reason, "not retrying request");
                    return Err(error);
                }
            }
        }
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(DownloadError::http_status_with_retry_after(
                url,
                response.status().as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpClient {
    #[instrument(skip(self, sink, cancel), fields(url = %url))]
    async fn fetch(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let response = self.send_with_retry(url, cancel).await?;
        let bytes = stream_to_sink(sink, response, url, cancel).await?;
        debug!(bytes, "payload fetched");
        Ok(bytes)
    }
}

/// Streams the response body into `sink`, returning bytes written.
async fn stream_to_sink(
    sink: &mut (dyn AsyncWrite + Unpin + Send),
    response: reqwest::Response,
    url: &str,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::canceled(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        sink.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::write(url, e))?;

        bytes_written += chunk.len() as u64;
    }

    sink.flush().await.map_err(|e| DownloadError::write(url, e))?;

    Ok(bytes_written)
}

fn retry_after_delay(error: &DownloadError, failure_type: FailureType) -> Option<Duration> {
    let DownloadError::HttpStatus {
        status,
        retry_after: Some(header),
        ..
    } = error
    else {
        return None;
    };
    if failure_type == FailureType::RateLimited || *status == 503 {
        parse_retry_after(header)
    } else {
        None
    }
}

/// User-Agent sent with transport requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("playlist-backup/{version}")
}
