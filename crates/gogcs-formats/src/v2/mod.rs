//! Generation-2 content system documents
//!
//! Repositories and depot manifests are served zlib-compressed from the
//! meta endpoint of the CDN, addressed by an opaque hexadecimal id:
//!
//! ```text
//! {cdn}/content-system/v2/meta/{id[0..2]}/{id[2..4]}/{id}
//! ```
//!
//! Chunk payloads are addressed by the md5 of their compressed bytes and
//! resolved through a [`SecureLink`](crate::SecureLink).

mod manifest;
mod repository;

pub use manifest::{
    DepotChunkV2, DepotDirectoryV2, DepotFileV2, DepotLinkV2, DepotManifestV2, SmallFileRef,
};
pub use repository::{CloudSave, Credentials, DepotV2, ProductScript, RepositoryV2};

use crate::error::{ManifestError, Result};

/// Schema version declared by generation-2 documents
pub const SCHEMA_VERSION: u64 = 2;

/// URL of a generation-2 meta document (repository or depot manifest)
///
/// # Errors
/// Returns [`ManifestError::InvalidManifestReference`] if `id` is shorter
/// than four characters or not hexadecimal.
pub fn meta_url(cdn_url: &str, id: &str) -> Result<String> {
    if id.len() < 4 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ManifestError::InvalidManifestReference(id.to_string()));
    }

    Ok(format!(
        "{}/content-system/v2/meta/{}/{}/{}",
        cdn_url.trim_end_matches('/'),
        &id[..2],
        &id[2..4],
        id
    ))
}
