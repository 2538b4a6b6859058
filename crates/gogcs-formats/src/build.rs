//! Build descriptors
//!
//! A build is the product listing's pointer to a repository document. Its
//! `generation` decides which schema the repository must be parsed with.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{opt_u64_from_any, timestamp_from_str, u64_from_any};
use crate::error::{ManifestError, Result};
use crate::normalization::Os;

/// Repository schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Generation {
    /// Flat depots with JSON manifests addressed by URL
    One,
    /// Chunked depots with compressed manifests addressed by id
    Two,
}

impl Generation {
    /// Numeric tag as used in documents and query strings
    pub const fn number(self) -> u64 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u64> for Generation {
    type Error = ManifestError;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(ManifestError::UnsupportedGeneration(other)),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Generation-tagged pointer to a repository document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Build id
    #[serde(rename = "build_id", deserialize_with = "u64_from_any")]
    pub id: u64,
    /// Owning product id
    #[serde(deserialize_with = "u64_from_any")]
    pub product_id: u64,
    /// Normalized target system
    pub os: Os,
    /// Branch name, absent for the default branch
    #[serde(default)]
    pub branch: Option<String>,
    /// Human readable version label
    #[serde(default)]
    pub version_name: String,
    /// Build tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the build is publicly visible
    #[serde(default)]
    pub public: bool,
    /// Publication time
    #[serde(deserialize_with = "timestamp_from_str")]
    pub date_published: DateTime<Utc>,
    /// Raw generation tag, see [`Build::schema_generation`]
    pub generation: u64,
    /// Repository document URL
    pub link: String,
    /// Build id in the legacy system, if migrated
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    pub legacy_build_id: Option<u64>,
}

impl Build {
    /// Parse a single build descriptor
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Schema generation of the repository this build points to
    ///
    /// Fails closed: generations outside `{1, 2}` are an error rather than a
    /// guess.
    pub fn schema_generation(&self) -> Result<Generation> {
        Generation::try_from(self.generation)
    }
}

/// Build listing for one product and system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildList {
    /// Number of builds the server knows about
    #[serde(default)]
    pub total_count: u64,
    /// Number of builds in this response
    #[serde(default)]
    pub count: u64,
    /// Builds, newest first
    #[serde(default)]
    pub items: Vec<Build>,
    /// Whether private branches exist that the caller cannot see
    #[serde(default)]
    pub has_private_branches: bool,
}

impl BuildList {
    /// Parse a build listing response
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Builds of the given generation
    pub fn of_generation(&self, generation: Generation) -> impl Iterator<Item = &Build> {
        self.items
            .iter()
            .filter(move |build| build.generation == generation.number())
    }

    /// Newest build on the default branch
    pub fn latest(&self) -> Option<&Build> {
        self.items
            .iter()
            .filter(|build| build.branch.is_none())
            .max_by_key(|build| build.date_published)
    }
}
