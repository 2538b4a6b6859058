//! Error types for legacy chunklist parsing and range validation

use thiserror::Error;

/// Errors that can occur when parsing or validating a chunklist
#[derive(Error, Debug)]
pub enum ChunklistError {
    /// Document is not well-formed XML or lacks required elements
    #[error("XML decode error: {0}")]
    Xml(#[from] serde_xml_rs::Error),

    /// Info link or download response is not valid JSON
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Attribute value cannot be interpreted
    #[error("Invalid attribute {name}={value:?}")]
    InvalidAttribute {
        /// Attribute name
        name: &'static str,
        /// Raw attribute value
        value: String,
    },

    /// Timestamp attribute is in no known layout
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Chunk range ends before it starts
    #[error("Chunk {id} has inverted range [{start}, {end})")]
    InvertedRange {
        /// Chunk id
        id: u32,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
    },

    /// Chunk starts after the previous chunk ended
    #[error("Gap before chunk {id}: expected offset {expected}, found {found}")]
    Gap {
        /// Chunk id
        id: u32,
        /// Offset the previous chunk ended at
        expected: u64,
        /// Offset the chunk starts at
        found: u64,
    },

    /// Chunk starts before the previous chunk ended
    #[error("Chunk {id} overlaps previous chunk: expected offset {expected}, found {found}")]
    Overlap {
        /// Chunk id
        id: u32,
        /// Offset the previous chunk ended at
        expected: u64,
        /// Offset the chunk starts at
        found: u64,
    },

    /// Chunks do not end at the file size
    #[error("Chunks cover {covered} bytes, file has {expected}")]
    CoverageMismatch {
        /// File size
        expected: u64,
        /// Offset the last chunk ends at
        covered: u64,
    },
}

/// Type alias for chunklist operation results
pub type Result<T> = std::result::Result<T, ChunklistError>;
