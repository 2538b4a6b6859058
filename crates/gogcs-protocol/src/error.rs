//! Error types for content system operations

use gogcs_formats::ManifestError;
use gogcs_formats::chunklist::ChunklistError;
use gogcs_formats::secure_link::SecureLinkError;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while fetching or resolving content system documents
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket-level I/O failure
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// Request failed inside reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered 429
    #[error("Rate limited")]
    RateLimited {
        /// Duration from the HTTP Retry-After header, if present
        retry_after: Option<Duration>,
    },

    /// Server answered 503
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Non-success status that is not a server error
    #[error("HTTP status: {0}")]
    HttpStatus(StatusCode),

    /// 5xx status other than 503
    #[error("Server error: {0}")]
    ServerError(StatusCode),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out
    #[error("Timeout")]
    Timeout,

    /// Text body was not UTF-8
    #[error("UTF-8 error")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Repository, manifest or build document was rejected
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Legacy download, info link or chunklist was rejected
    #[error("Chunklist error: {0}")]
    Chunklist(#[from] ChunklistError),

    /// Secure link response or checksum was rejected
    #[error("Secure link error: {0}")]
    SecureLink(#[from] SecureLinkError),

    /// Build or secure link generation has no implementation
    #[error("Generation {0} is not supported")]
    UnsupportedGeneration(u64),
}

impl ProtocolError {
    /// Check if error is retryable
    ///
    /// Document errors are never retryable: the same bytes would fail the
    /// same way.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::ServerError(_)
            | Self::RateLimited { .. }
            | Self::ServiceUnavailable
            | Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus(status) => {
                matches!(
                    status,
                    &StatusCode::TOO_MANY_REQUESTS
                        | &StatusCode::INTERNAL_SERVER_ERROR
                        | &StatusCode::BAD_GATEWAY
                        | &StatusCode::SERVICE_UNAVAILABLE
                        | &StatusCode::GATEWAY_TIMEOUT
                )
            }
            _ => false,
        }
    }

    /// Get the Retry-After hint duration, if this is a rate-limited error with one.
    pub fn retry_after_hint(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type for content system operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
