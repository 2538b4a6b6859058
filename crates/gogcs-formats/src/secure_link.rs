//! Secure link URL construction
//!
//! A secure link is a short-lived, token-authorized URL template issued for
//! one product and link type. Content is sharded on the CDN by the first
//! two byte pairs of its checksum, bounding any directory to 256 entries at
//! each of the two levels:
//!
//! ```text
//! {base_url}/{path}/{checksum[0..2]}/{checksum[2..4]}/{checksum}?{token}
//! ```
//!
//! Resolution is pure string construction; fetching the link itself is the
//! transport's concern.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::string_from_any;

/// Errors that can occur when decoding or resolving a secure link
#[derive(Error, Debug)]
pub enum SecureLinkError {
    /// Checksum is shorter than four characters or not hexadecimal
    #[error("Invalid checksum for CDN path: {0:?}")]
    InvalidChecksum(String),

    /// Secure link response is not valid JSON or misses fields
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for secure link operation results
pub type Result<T> = std::result::Result<T, SecureLinkError>;

/// Token-authorized URL template for one product and link type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureLink {
    /// Product the link was issued for
    #[serde(deserialize_with = "string_from_any")]
    pub product_id: String,
    /// Link type the link was issued for (installer, patch, depot, ...)
    #[serde(rename = "type", default)]
    pub link_type: String,
    /// CDN base URL
    pub base_url: String,
    /// Path prefix below the base URL
    #[serde(default)]
    pub path: String,
    /// Authorization token appended as query string
    pub token: String,
}

impl SecureLink {
    /// Parse a secure link response
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Resolve a checksum into a download URL
    pub fn resolve(&self, checksum: &str) -> Result<String> {
        resolve(&self.base_url, &self.path, &self.token, checksum)
    }
}

/// Two-level shard path of a checksum: `ab/cd/abcdef...`
pub fn shard_path(checksum: &str) -> Result<String> {
    if checksum.len() < 4 || !checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SecureLinkError::InvalidChecksum(checksum.to_string()));
    }

    Ok(format!("{}/{}/{}", &checksum[..2], &checksum[2..4], checksum))
}

/// Build the download URL for a checksum from a base URL, path and token
pub fn resolve(base_url: &str, path: &str, token: &str, checksum: &str) -> Result<String> {
    let shard = shard_path(checksum)?;
    let base_url = base_url.trim_end_matches('/');
    let path = path.trim_matches('/');

    let mut url = if path.is_empty() {
        format!("{base_url}/{shard}")
    } else {
        format!("{base_url}/{path}/{shard}")
    };

    if !token.is_empty() {
        url.push('?');
        url.push_str(token.trim_start_matches('?'));
    }

    Ok(url)
}
