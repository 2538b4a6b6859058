use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SCHEMA_VERSION;
use crate::document::{inflate, u64_from_any, versioned_document};
use crate::error::{ManifestError, Result};
use crate::flags::FileFlags;
use crate::secure_link::{self, SecureLink};

/// Generation-2 depot manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepotManifestV2 {
    /// Files, in document order
    pub files: Vec<DepotFileV2>,
    /// Directories, in document order
    pub directories: Vec<DepotDirectoryV2>,
    /// Links, in document order
    pub links: Vec<DepotLinkV2>,
    /// Blob bundling the files that carry a [`SmallFileRef`]
    pub small_files_container: Option<DepotFileV2>,
}

/// File entry of a generation-2 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotFileV2 {
    /// Install-relative path
    #[serde(default)]
    pub path: String,
    /// Chunks in file order
    #[serde(default)]
    pub chunks: Vec<DepotChunkV2>,
    /// Position inside the small files container
    #[serde(rename = "sfcRef", default)]
    pub sfc_ref: Option<SmallFileRef>,
    /// Raw flag names
    #[serde(default)]
    pub flags: Vec<String>,
    /// md5 of the whole file, when the server provides it
    #[serde(default)]
    pub md5: Option<String>,
}

/// Position of a file inside the small files container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallFileRef {
    /// Offset inside the container
    #[serde(deserialize_with = "u64_from_any")]
    pub offset: u64,
    /// Size inside the container
    #[serde(deserialize_with = "u64_from_any")]
    pub size: u64,
}

/// Content-addressable unit of a generation-2 file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepotChunkV2 {
    /// md5 of the compressed bytes, the retrieval and deduplication key
    #[serde(rename = "compressedMd5")]
    pub compressed_md5: String,
    /// Size of the compressed bytes
    #[serde(rename = "compressedSize", deserialize_with = "u64_from_any")]
    pub compressed_size: u64,
    /// md5 of the decompressed bytes
    pub md5: String,
    /// Size of the decompressed bytes
    #[serde(deserialize_with = "u64_from_any")]
    pub size: u64,
}

/// Directory entry of a generation-2 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotDirectoryV2 {
    /// Install-relative path
    pub path: String,
}

/// Link entry of a generation-2 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotLinkV2 {
    /// Install-relative path of the link
    pub path: String,
    /// Link target
    pub target: String,
}

impl DepotFileV2 {
    /// Checksum of the whole file
    ///
    /// The direct md5 when present, else the plain md5 of the only chunk.
    /// Files with several chunks and no direct md5 have no whole-file
    /// checksum and can only be verified chunk by chunk.
    pub fn checksum(&self) -> Option<&str> {
        if let Some(md5) = self.md5.as_deref() {
            return Some(md5);
        }
        match self.chunks.as_slice() {
            [only] => Some(only.md5.as_str()),
            _ => None,
        }
    }

    /// Decompressed size, the sum of the chunk sizes
    ///
    /// Sizes come from the server; the sum saturates at `u64::MAX`.
    pub fn size(&self) -> u64 {
        self.chunks
            .iter()
            .map(|chunk| chunk.size)
            .fold(0, u64::saturating_add)
    }

    /// Stored size, the sum of the compressed chunk sizes
    pub fn compressed_size(&self) -> u64 {
        self.chunks
            .iter()
            .map(|chunk| chunk.compressed_size)
            .fold(0, u64::saturating_add)
    }

    /// Well-known flags out of [`DepotFileV2::flags`]
    pub fn file_flags(&self) -> FileFlags {
        FileFlags::from_names(&self.flags)
    }

    /// Whether the file's bytes live in the small files container
    pub const fn is_in_container(&self) -> bool {
        self.sfc_ref.is_some()
    }
}

impl DepotChunkV2 {
    /// Check downloaded compressed bytes against the chunk's key
    pub fn matches_compressed(&self, data: &[u8]) -> bool {
        hex::encode(md5::compute(data).0).eq_ignore_ascii_case(&self.compressed_md5)
    }

    /// Download URL of the chunk under a secure link
    pub fn url(&self, link: &SecureLink) -> secure_link::Result<String> {
        link.resolve(&self.compressed_md5)
    }
}

#[derive(Deserialize)]
struct RawManifest {
    depot: RawDepot,
}

#[derive(Deserialize)]
struct RawDepot {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(rename = "smallFilesContainer", default)]
    small_files_container: Option<DepotFileV2>,
}

impl DepotManifestV2 {
    /// Parse an already inflated generation-2 depot manifest
    ///
    /// # Errors
    /// Returns error if:
    /// - The document's `version` is not 2
    /// - An item's `type` is not `DepotFile`, `DepotDirectory` or `DepotLink`
    /// - An item lacks the fields its type requires
    pub fn parse(data: &[u8]) -> Result<Self> {
        let value = versioned_document(data, SCHEMA_VERSION)?;
        let raw: RawManifest = serde_json::from_value(value)?;

        let mut manifest = Self {
            small_files_container: raw.depot.small_files_container,
            ..Self::default()
        };

        for item in raw.depot.items {
            let item_type = item
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            match item_type.as_str() {
                "DepotFile" => manifest.files.push(serde_json::from_value(item)?),
                "DepotDirectory" => manifest.directories.push(serde_json::from_value(item)?),
                "DepotLink" => manifest.links.push(serde_json::from_value(item)?),
                _ => return Err(ManifestError::UnknownItemType(item_type)),
            }
        }

        tracing::debug!(
            files = manifest.files.len(),
            directories = manifest.directories.len(),
            links = manifest.links.len(),
            small_files_container = manifest.small_files_container.is_some(),
            "Parsed generation-2 depot manifest"
        );

        Ok(manifest)
    }

    /// Inflate and parse a zlib-compressed generation-2 depot manifest
    pub fn parse_compressed(data: &[u8]) -> Result<Self> {
        Self::parse(&inflate(data)?)
    }

    /// Chunks to retrieve for the whole manifest, each stored chunk once
    ///
    /// Order follows first appearance; the small files container comes last.
    pub fn unique_chunks(&self) -> Vec<&DepotChunkV2> {
        let mut seen = HashSet::new();
        self.files
            .iter()
            .chain(self.small_files_container.iter())
            .filter(|file| !file.is_in_container())
            .flat_map(|file| file.chunks.iter())
            .filter(|chunk| seen.insert(chunk.compressed_md5.as_str()))
            .collect()
    }

    /// Installed size of all files
    pub fn total_size(&self) -> u64 {
        self.files
            .iter()
            .map(DepotFileV2::size)
            .fold(0, u64::saturating_add)
    }

    /// Size to download, counting each stored chunk once
    pub fn download_size(&self) -> u64 {
        self.unique_chunks()
            .iter()
            .map(|chunk| chunk.compressed_size)
            .fold(0, u64::saturating_add)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(md5: &str, size: u64, compressed_md5: &str) -> DepotChunkV2 {
        DepotChunkV2 {
            compressed_md5: compressed_md5.to_string(),
            compressed_size: size / 2,
            md5: md5.to_string(),
            size,
        }
    }

    fn file(chunks: Vec<DepotChunkV2>, md5: Option<&str>) -> DepotFileV2 {
        DepotFileV2 {
            path: "bin/game".to_string(),
            chunks,
            sfc_ref: None,
            flags: Vec::new(),
            md5: md5.map(str::to_string),
        }
    }

    #[test]
    fn test_checksum_single_chunk() {
        let f = file(vec![chunk("plain", 10, "packed")], None);
        assert_eq!(f.checksum(), Some("plain"));
    }

    #[test]
    fn test_checksum_prefers_direct_md5() {
        let f = file(vec![chunk("a", 10, "x"), chunk("b", 20, "y")], Some("direct"));
        assert_eq!(f.checksum(), Some("direct"));
        let single = file(vec![chunk("a", 10, "x")], Some("direct"));
        assert_eq!(single.checksum(), Some("direct"));
    }

    #[test]
    fn test_checksum_absent_for_multiple_chunks() {
        let f = file(vec![chunk("a", 10, "x"), chunk("b", 20, "y")], None);
        assert_eq!(f.checksum(), None);
        assert_eq!(file(Vec::new(), None).checksum(), None);
    }

    #[test]
    fn test_size_sums_chunks() {
        let f = file(vec![chunk("a", 10, "x"), chunk("b", 20, "y")], None);
        assert_eq!(f.size(), 30);
        assert_eq!(f.compressed_size(), 15);
    }

    #[test]
    fn test_sizes_saturate_on_oversized_chunks() {
        let f = file(vec![chunk("a", u64::MAX, "x"), chunk("b", 1, "y")], None);
        assert_eq!(f.size(), u64::MAX);

        let manifest = DepotManifestV2 {
            files: vec![f.clone(), f],
            ..DepotManifestV2::default()
        };
        assert_eq!(manifest.total_size(), u64::MAX);
    }

    #[test]
    fn test_matches_compressed() {
        let c = DepotChunkV2 {
            compressed_md5: "5D41402ABC4B2A76B9719D911017C592".to_string(),
            compressed_size: 5,
            md5: String::new(),
            size: 5,
        };
        assert!(c.matches_compressed(b"hello"));
        assert!(!c.matches_compressed(b"hellO"));
    }

    #[test]
    fn test_chunk_url() {
        let link = SecureLink {
            product_id: "1207658924".to_string(),
            link_type: "depot".to_string(),
            base_url: "https://cdn".to_string(),
            path: "v2/store/1207658924".to_string(),
            token: "t".to_string(),
        };
        let c = chunk("plain", 10, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(
            c.url(&link).unwrap(),
            "https://cdn/v2/store/1207658924/5d/41/5d41402abc4b2a76b9719d911017c592?t"
        );
    }

    #[test]
    fn test_unique_chunks_deduplicates_by_compressed_md5() {
        let manifest = DepotManifestV2 {
            files: vec![
                file(vec![chunk("a", 10, "aa00"), chunk("b", 20, "bb00")], None),
                file(vec![chunk("a", 10, "aa00")], None),
            ],
            ..DepotManifestV2::default()
        };
        let keys: Vec<_> = manifest
            .unique_chunks()
            .iter()
            .map(|c| c.compressed_md5.as_str())
            .collect();
        assert_eq!(keys, vec!["aa00", "bb00"]);
        assert_eq!(manifest.total_size(), 40);
        assert_eq!(manifest.download_size(), 15);
    }
}
