//! Shared document handling: zlib inflation, schema version checks and
//! lenient field decoding
//!
//! The content system is not consistent about scalar encodings. Ids and
//! sizes arrive as JSON numbers in some documents and as strings in others,
//! and timestamps use several layouts. The helpers here accept every form
//! observed in the wild and normalize it once.

use std::io::Read;

use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::ZlibDecoder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ManifestError, Result};

/// Maximum allowed size of an inflated document (256 MB)
///
/// Limits decompression output to prevent denial of service via
/// compression bombs. The largest generation-2 manifests are a few tens of
/// megabytes once inflated.
pub const MAX_DOCUMENT_SIZE: usize = 256 * 1024 * 1024;

/// Inflate a zlib-compressed document
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data).take(MAX_DOCUMENT_SIZE as u64 + 1);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;

    if inflated.len() > MAX_DOCUMENT_SIZE {
        return Err(ManifestError::DecompressionLimit {
            limit: MAX_DOCUMENT_SIZE,
        });
    }

    Ok(inflated)
}

/// Decode a JSON document and check that its `version` field equals `expected`
pub fn versioned_document(data: &[u8], expected: u64) -> Result<Value> {
    let value: Value = serde_json::from_slice(data)?;
    let found = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(ManifestError::MissingVersion)?;

    if found != expected {
        return Err(ManifestError::SchemaMismatch { expected, found });
    }

    Ok(value)
}

/// Parse a content-system timestamp
///
/// Accepts RFC 3339, ISO 8601 with a colon-less offset (`+0000`) and the
/// naive `YYYY-MM-DD HH:MM:SS` layout used by chunklists, which is UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|t| t.and_utc())
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(u64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

pub(crate) fn u64_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Number(n) => Ok(n),
        Scalar::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn opt_u64_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Number(n)) => Ok(Some(n)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn string_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

pub(crate) fn strings_from_any<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(Scalar::into_string)
        .collect())
}

pub(crate) fn timestamp_from_str<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}")))
}
