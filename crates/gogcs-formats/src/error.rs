//! Error types for repository and manifest parsing

use thiserror::Error;

/// Errors that can occur when parsing builds, repositories or depot manifests
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Document is not valid JSON or does not match the expected shape
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Declared document version differs from the parser's generation
    #[error("Schema mismatch: expected version {expected}, got {found}")]
    SchemaMismatch {
        /// Version the parser understands
        expected: u64,
        /// Version the document declares
        found: u64,
    },

    /// Document carries no usable `version` field
    #[error("Missing schema version")]
    MissingVersion,

    /// Generation-2 manifest item with an unrecognized `type` discriminator
    #[error("Unknown manifest item type: {0}")]
    UnknownItemType(String),

    /// Build generation outside of the supported set
    #[error("Unsupported generation: {0}")]
    UnsupportedGeneration(u64),

    /// Manifest name or id that cannot address a manifest
    #[error("Invalid manifest reference: {0}")]
    InvalidManifestReference(String),

    /// zlib inflation failed
    #[error("Decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    /// Inflated document exceeds the decompression limit
    #[error("Decompressed document exceeds {limit} bytes")]
    DecompressionLimit {
        /// Configured limit in bytes
        limit: usize,
    },

    /// A field is present but its value cannot be interpreted
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// JSON key of the offending field
        field: &'static str,
        /// Human readable reason
        reason: String,
    },
}

/// Type alias for repository and manifest operation results
pub type Result<T> = std::result::Result<T, ManifestError>;
