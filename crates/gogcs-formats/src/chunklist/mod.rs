mod download;
mod error;

pub use download::{Download, DownloadFile, InfoLink};
pub use error::{ChunklistError, Result};

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::parse_timestamp;

/// Parsed chunklist of one legacy installer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkList {
    /// Installer filename
    pub filename: String,
    /// Whether the server currently offers the file
    pub available: bool,
    /// Server message explaining unavailability, empty when available
    pub not_available_message: String,
    /// md5 of the whole file
    pub md5: String,
    /// Time the chunklist was generated
    pub timestamp: DateTime<Utc>,
    /// Chunks in document order
    pub chunks: Vec<Chunk>,
}

/// Byte range of a legacy file with its expected digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Chunk {
    /// Chunk id
    pub id: u32,
    /// First byte of the range
    pub start: u64,
    /// One past the last byte of the range
    pub end: u64,
    /// Digest method as named by the server
    pub method: String,
    /// Expected digest of the range's bytes
    pub digest: String,
}

impl Chunk {
    /// Number of bytes in the range
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check for an empty range
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range as `start..end`
    pub const fn range(&self) -> Range<u64> {
        self.start..self.end
    }

    /// Value for an HTTP `Range` header requesting this chunk
    pub fn http_range(&self) -> String {
        format!("bytes={}-{}", self.start, self.end.saturating_sub(1))
    }
}

// Attributes are kept as strings and interpreted afterwards so malformed
// values surface as `InvalidAttribute` rather than an opaque XML error.
#[derive(Deserialize)]
struct RawChunkList {
    #[serde(rename = "@name", alias = "name")]
    name: String,
    #[serde(rename = "@available", alias = "available", default)]
    available: Option<String>,
    #[serde(rename = "@notavailablemsg", alias = "notavailablemsg", default)]
    not_available_message: String,
    #[serde(rename = "@md5", alias = "md5", default)]
    md5: String,
    #[serde(rename = "@timestamp", alias = "timestamp")]
    timestamp: String,
    #[serde(rename = "chunk", default)]
    chunks: Vec<RawChunk>,
}

#[derive(Deserialize)]
struct RawChunk {
    #[serde(rename = "@id", alias = "id")]
    id: String,
    #[serde(rename = "@from", alias = "from")]
    from: String,
    #[serde(rename = "@to", alias = "to")]
    to: String,
    #[serde(rename = "@method", alias = "method", default)]
    method: String,
    #[serde(rename = "#text", alias = "$value", default)]
    digest: String,
}

fn attribute<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChunklistError::InvalidAttribute {
            name,
            value: value.to_string(),
        })
}

impl ChunkList {
    /// Parse a chunklist XML document
    ///
    /// # Errors
    /// Returns error if:
    /// - The document is not XML or lacks the file element's attributes
    /// - A numeric attribute or the timestamp cannot be interpreted
    /// - A chunk's range ends before it starts
    ///
    /// Contiguity is not checked here; see [`ChunkList::validate`].
    pub fn parse(xml: &str) -> Result<Self> {
        let raw: RawChunkList = serde_xml_rs::from_str(xml)?;

        let available = match raw.available.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(flag) => attribute::<u8>("available", flag)? != 0,
        };
        let timestamp = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| ChunklistError::InvalidTimestamp(raw.timestamp.clone()))?;

        let chunks = raw
            .chunks
            .into_iter()
            .map(|chunk| {
                let id = attribute("id", &chunk.id)?;
                let start = attribute("from", &chunk.from)?;
                let end = attribute("to", &chunk.to)?;
                if end < start {
                    return Err(ChunklistError::InvertedRange { id, start, end });
                }
                Ok(Chunk {
                    id,
                    start,
                    end,
                    method: chunk.method,
                    digest: chunk.digest.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filename: raw.name,
            available,
            not_available_message: raw.not_available_message,
            md5: raw.md5,
            timestamp,
            chunks,
        })
    }

    /// Check that the chunks tile `[0, file_size)` exactly
    pub fn validate(&self, file_size: u64) -> Result<()> {
        validate_ranges(&self.chunks, file_size)
    }

    /// Sum of all chunk lengths, saturating at `u64::MAX`
    pub fn covered_size(&self) -> u64 {
        self.chunks
            .iter()
            .map(Chunk::len)
            .fold(0, u64::saturating_add)
    }
}

/// Check that chunks are contiguous, non-overlapping and cover `[0, file_size)`
///
/// Chunks are checked in the given order. A file of size zero is covered by
/// an empty chunk list.
pub fn validate_ranges(chunks: &[Chunk], file_size: u64) -> Result<()> {
    let mut offset = 0u64;

    for chunk in chunks {
        if chunk.end < chunk.start {
            return Err(ChunklistError::InvertedRange {
                id: chunk.id,
                start: chunk.start,
                end: chunk.end,
            });
        }
        if chunk.start > offset {
            return Err(ChunklistError::Gap {
                id: chunk.id,
                expected: offset,
                found: chunk.start,
            });
        }
        if chunk.start < offset {
            return Err(ChunklistError::Overlap {
                id: chunk.id,
                expected: offset,
                found: chunk.start,
            });
        }
        offset = chunk.end;
    }

    if offset != file_size {
        return Err(ChunklistError::CoverageMismatch {
            expected: file_size,
            covered: offset,
        });
    }

    Ok(())
}
