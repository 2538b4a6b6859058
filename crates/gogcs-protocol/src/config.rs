//! Configuration structures for content system clients

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;
use crate::retry::RetryPolicy;

/// Default content system API root
pub const DEFAULT_CONTENT_SYSTEM_URL: &str = "https://content-system.gog.com";
/// Default CDN root serving meta documents
pub const DEFAULT_CDN_URL: &str = "https://cdn.gog.com";

/// Endpoints, credentials and transport settings of a [`ContentClient`]
///
/// [`ContentClient`]: crate::ContentClient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Content system API root (build listings, secure links)
    pub content_system_url: String,

    /// CDN root (generation-2 meta documents)
    pub cdn_url: String,

    /// Bearer token attached to every request, already refreshed
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Request timeout
    pub request_timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,

    /// Retry policy of the HTTP transport
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            content_system_url: DEFAULT_CONTENT_SYSTEM_URL.to_string(),
            cdn_url: DEFAULT_CDN_URL.to_string(),
            access_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("gogcs-protocol/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            content_system_url: std::env::var("GOGCS_CONTENT_SYSTEM_URL")
                .unwrap_or_else(|_| DEFAULT_CONTENT_SYSTEM_URL.to_string()),
            cdn_url: std::env::var("GOGCS_CDN_URL")
                .unwrap_or_else(|_| DEFAULT_CDN_URL.to_string()),
            access_token: std::env::var("GOGCS_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            connect_timeout: Duration::from_secs(env_or("GOGCS_CONNECT_TIMEOUT", 10)),
            request_timeout: Duration::from_secs(env_or("GOGCS_REQUEST_TIMEOUT", 30)),
            user_agent: std::env::var("GOGCS_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            retry_policy: RetryPolicy::from_env()?,
        })
    }

    /// Point the content system and CDN roots at one base URL
    ///
    /// Useful against a mirror or a mock server that serves both.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        self.content_system_url.clone_from(&base_url);
        self.cdn_url = base_url;
        self
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Parse an environment variable, falling back when unset or malformed
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
