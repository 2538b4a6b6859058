use serde::{Deserialize, Serialize};

use super::Result;
use crate::document::{string_from_any, u64_from_any};
use crate::normalization::{self, Os};

/// Installer, patch or bonus download of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Download id
    #[serde(deserialize_with = "string_from_any")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Combined size of all files
    #[serde(default, deserialize_with = "u64_from_any")]
    pub total_size: u64,
    /// Files making up the download
    #[serde(default)]
    pub files: Vec<DownloadFile>,
    /// Target system, installers only
    #[serde(default)]
    pub os: Option<Os>,
    /// Normalized language, installers only
    #[serde(default, deserialize_with = "normalization::opt_language")]
    pub language: Option<String>,
    /// Version label, installers only
    #[serde(default)]
    pub version: Option<String>,
    /// Bonus content category, bonus content only
    #[serde(rename = "type", default)]
    pub bonus_type: Option<String>,
    /// Number of bonus items, bonus content only
    #[serde(default)]
    pub count: Option<u64>,
}

impl Download {
    /// Parse a download descriptor
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Whether this is bonus content rather than an installer or patch
    pub fn is_bonus(&self) -> bool {
        self.bonus_type.is_some()
    }
}

/// One file of a legacy download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFile {
    /// File id
    #[serde(deserialize_with = "string_from_any")]
    pub id: String,
    /// File size in bytes
    #[serde(deserialize_with = "u64_from_any")]
    pub size: u64,
    /// URL resolving to an [`InfoLink`]
    #[serde(rename = "downlink")]
    pub info_link: String,
}

/// Resolved info link of a legacy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoLink {
    /// Secure, time-limited download URL of the whole file
    #[serde(rename = "downlink")]
    pub secure_link: String,
    /// URL of the file's XML chunklist
    #[serde(rename = "checksum")]
    pub chunklist_link: String,
}

impl InfoLink {
    /// Parse an info link response
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
