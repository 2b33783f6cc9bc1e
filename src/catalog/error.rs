//! Error types for the remote catalog.

use thiserror::Error;

/// Errors returned by a [`Catalog`](super::Catalog) implementation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or the response body not read.
    #[error("request to {endpoint} failed: {source}")]
    Request {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status and no error body.
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        /// Endpoint path that was requested.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The service answered with a domain error object.
    #[error("{endpoint}: {name}: {message}")]
    Api {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Error name reported by the service.
        name: String,
        /// Human-readable message reported by the service.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode {
        /// Endpoint path that was requested.
        endpoint: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// A track id in a playlist response was not an integer.
    #[error("invalid track id: {raw}")]
    InvalidTrackId {
        /// The id as received.
        raw: String,
    },

    /// The track cannot be downloaded.
    #[error("track {track_id} not available")]
    Unavailable {
        /// Catalog id of the track.
        track_id: u64,
    },

    /// The catalog could not be configured.
    #[error("invalid catalog configuration: {reason}")]
    Config {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl CatalogError {
    /// Creates a request error.
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
