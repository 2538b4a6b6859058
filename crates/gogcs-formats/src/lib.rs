//! Manifest, repository and chunklist models for the GOG content system
//!
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many content-system terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::derive_partial_eq_without_eq)] // Document structs
#![allow(clippy::use_self)] // Type clarity
//! This crate models the documents a GOG build is described by and resolves
//! their checksums into retrievable locations. It performs no I/O: callers
//! hand it raw bytes fetched by a transport of their choosing.
//!
//! # Supported Documents
//!
//! - **Builds**: generation-tagged build descriptors and build listings
//! - **Generation 1**: flat depot repositories and their JSON manifests
//! - **Generation 2**: chunked, content-addressable depot repositories and
//!   their zlib-compressed manifests
//! - **Legacy chunklists**: per-installer XML byte-range chunk lists
//! - **Secure links**: token-authorized CDN URL templates
//!
//! # Design Principles
//!
//! - **Fail closed**: a document whose declared version does not match the
//!   parser's generation is rejected, never coerced
//! - **Explicit absence**: optional source fields stay `Option`, they are not
//!   defaulted to zero
//! - **Normalized identifiers**: OS and language tokens are folded to
//!   canonical values at parse time

#![warn(missing_docs)]

/// Build descriptors and the generation tag that selects a schema
pub mod build;
/// Legacy installer downloads and their XML chunklists
///
/// The pre-manifest download protocol exposes installers as a list of files,
/// each with an info link resolving to a secure download link and a
/// chunklist link. The chunklist describes contiguous byte ranges with a
/// digest per range, so a downloader can fetch and verify ranges
/// independently.
pub mod chunklist;
pub mod document;
pub mod error;
/// File flag bitset shared by both manifest generations
pub mod flags;
pub mod normalization;
pub mod secure_link;
/// Generation-1 repositories and depot manifests
///
/// Generation-1 depots reference their manifest by a filename relative to
/// the repository URL. Manifests are plain JSON and list files,
/// directories and symbolic links in one flat array.
pub mod v1;
/// Generation-2 repositories and depot manifests
///
/// Generation-2 depots reference their manifest by an opaque id. Manifests
/// are zlib-compressed JSON; files decompose into content-addressable
/// chunks keyed by the md5 of their compressed bytes.
pub mod v2;

pub use build::{Build, BuildList, Generation};
pub use error::{ManifestError, Result};
pub use flags::FileFlags;
pub use normalization::{Os, normalize_language, normalize_system};
pub use secure_link::SecureLink;
