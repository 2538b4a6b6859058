use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SCHEMA_VERSION;
use crate::document::{opt_u64_from_any, versioned_document};
use crate::error::{ManifestError, Result};
use crate::flags::FileFlags;

/// Generation-1 depot manifest
///
/// Items are split into three sequences, each in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepotManifestV1 {
    /// Depot name
    pub name: String,
    /// Ordinary files
    pub files: Vec<DepotFileV1>,
    /// Directories
    pub directories: Vec<DepotDirectoryV1>,
    /// Symbolic links
    pub links: Vec<DepotLinkV1>,
}

/// File entry of a generation-1 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepotFileV1 {
    /// Install-relative path
    pub path: String,
    /// Size in bytes
    pub size: Option<u64>,
    /// md5 of the file contents
    pub checksum: Option<String>,
    /// Direct download location
    pub url: Option<String>,
    /// Offset of the file inside the download at `url`
    pub offset: Option<u64>,
    /// Executable, hidden and support flags
    pub flags: FileFlags,
}

/// Directory entry of a generation-1 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepotDirectoryV1 {
    /// Install-relative path
    pub path: String,
    /// Directory belongs to the support directory
    pub support: bool,
}

/// Symbolic link entry of a generation-1 manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepotLinkV1 {
    /// Install-relative path of the link
    pub path: String,
    /// Link target
    pub target: String,
    /// Link type tag
    pub link_type: String,
}

#[derive(Deserialize)]
struct RawManifest {
    depot: RawDepot,
}

#[derive(Deserialize)]
struct RawDepot {
    #[serde(default)]
    name: String,
    #[serde(default)]
    files: Vec<Value>,
}

#[derive(Deserialize)]
struct RawFile {
    path: String,
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    size: Option<u64>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    offset: Option<u64>,
    #[serde(default)]
    executable: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    support: bool,
}

#[derive(Deserialize)]
struct RawDirectory {
    path: String,
    #[serde(default)]
    support: bool,
}

#[derive(Deserialize)]
struct RawLink {
    path: String,
    #[serde(default)]
    target: String,
    #[serde(rename = "type")]
    link_type: String,
}

impl From<RawFile> for DepotFileV1 {
    fn from(raw: RawFile) -> Self {
        let mut flags = FileFlags::empty();
        for (set, flag) in [
            (raw.executable, FileFlags::EXECUTABLE),
            (raw.hidden, FileFlags::HIDDEN),
            (raw.support, FileFlags::SUPPORT),
        ] {
            if set {
                flags.insert(flag);
            }
        }

        Self {
            path: raw.path,
            size: raw.size,
            checksum: raw.hash.filter(|hash| !hash.is_empty()),
            url: raw.url.filter(|url| !url.is_empty()),
            offset: raw.offset,
            flags,
        }
    }
}

impl DepotManifestV1 {
    /// Parse a generation-1 depot manifest
    ///
    /// An item with a true `directory` marker is a directory, an item with a
    /// `type` marker is a symbolic link, anything else is a file.
    ///
    /// # Errors
    /// Returns error if:
    /// - The document's `version` is not 1
    /// - An item lacks the fields its kind requires
    pub fn parse(data: &[u8]) -> Result<Self> {
        let value = versioned_document(data, SCHEMA_VERSION)?;
        let raw: RawManifest = serde_json::from_value(value)?;

        let mut manifest = Self {
            name: raw.depot.name,
            ..Self::default()
        };

        for item in raw.depot.files {
            if item.get("directory").and_then(Value::as_bool).unwrap_or(false) {
                let dir: RawDirectory = serde_json::from_value(item)?;
                manifest.directories.push(DepotDirectoryV1 {
                    path: dir.path,
                    support: dir.support,
                });
            } else if item.get("type").is_some() {
                let link: RawLink = serde_json::from_value(item)?;
                manifest.links.push(DepotLinkV1 {
                    path: link.path,
                    target: link.target,
                    link_type: link.link_type,
                });
            } else if item.is_object() {
                let file: RawFile = serde_json::from_value(item)?;
                manifest.files.push(file.into());
            } else {
                return Err(ManifestError::InvalidField {
                    field: "files",
                    reason: format!("expected object, found {item}"),
                });
            }
        }

        tracing::debug!(
            name = %manifest.name,
            files = manifest.files.len(),
            directories = manifest.directories.len(),
            links = manifest.links.len(),
            "Parsed generation-1 depot manifest"
        );

        Ok(manifest)
    }

    /// Sum of the known file sizes, saturating at `u64::MAX`
    pub fn total_size(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|file| file.size)
            .fold(0, u64::saturating_add)
    }
}
