//! Depot handles with lazily loaded manifests
//!
//! A handle pairs a parsed depot entry with a [`LazyField`] for its
//! manifest. Cloning a handle shares the field, so a manifest is fetched at
//! most once per depot no matter how many clones ask for it.

use gogcs_formats::v1::{DepotManifestV1, DepotV1};
use gogcs_formats::v2::{DepotManifestV2, DepotV2, meta_url};
use gogcs_formats::{Generation, ManifestError};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::lazy::LazyField;
use crate::transport::ContentFetcher;

struct DepotInner<D, M> {
    depot: D,
    fetcher: Arc<dyn ContentFetcher>,
    manifest: LazyField<M>,
}

/// Generation-1 depot whose manifest is fetched by URL
#[derive(Clone)]
pub struct RemoteDepotV1 {
    inner: Arc<DepotInner<DepotV1, DepotManifestV1>>,
}

impl RemoteDepotV1 {
    pub(crate) fn new(depot: DepotV1, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            inner: Arc::new(DepotInner {
                depot,
                fetcher,
                manifest: LazyField::new(),
            }),
        }
    }

    /// Parsed depot entry
    pub fn depot(&self) -> &DepotV1 {
        &self.inner.depot
    }

    /// URL the manifest is fetched from
    pub fn manifest_url(&self) -> String {
        self.inner.depot.manifest_url()
    }

    /// Manifest id derived from the manifest filename
    pub fn manifest_id(&self) -> std::result::Result<&str, ManifestError> {
        self.inner.depot.manifest_id()
    }

    /// Manifest, if it has been loaded
    pub fn manifest(&self) -> Option<Arc<DepotManifestV1>> {
        self.inner.manifest.get()
    }

    /// Return the manifest, fetching it on first use
    pub async fn load_manifest(&self) -> Result<Arc<DepotManifestV1>> {
        self.inner.manifest.get_or_load(|| self.fetch_manifest()).await
    }

    /// Fetch the manifest again and replace the loaded one
    pub async fn update_manifest(&self) -> Result<Arc<DepotManifestV1>> {
        self.inner.manifest.reload(|| self.fetch_manifest()).await
    }

    async fn fetch_manifest(&self) -> Result<DepotManifestV1> {
        let url = self.manifest_url();
        debug!(url = %url, "Fetching generation-1 depot manifest");
        let data = self.inner.fetcher.fetch_document(&url, false).await?;
        Ok(DepotManifestV1::parse(&data)?)
    }
}

/// Generation-2 depot whose manifest is fetched compressed by id
#[derive(Clone)]
pub struct RemoteDepotV2 {
    inner: Arc<DepotInner<DepotV2, DepotManifestV2>>,
    cdn_url: Arc<str>,
}

impl RemoteDepotV2 {
    pub(crate) fn new(depot: DepotV2, cdn_url: Arc<str>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            inner: Arc::new(DepotInner {
                depot,
                fetcher,
                manifest: LazyField::new(),
            }),
            cdn_url,
        }
    }

    /// Parsed depot entry
    pub fn depot(&self) -> &DepotV2 {
        &self.inner.depot
    }

    /// Opaque manifest id
    pub fn manifest_id(&self) -> &str {
        &self.inner.depot.manifest_id
    }

    /// Meta endpoint URL the manifest is fetched from
    pub fn manifest_url(&self) -> std::result::Result<String, ManifestError> {
        meta_url(&self.cdn_url, &self.inner.depot.manifest_id)
    }

    /// Manifest, if it has been loaded
    pub fn manifest(&self) -> Option<Arc<DepotManifestV2>> {
        self.inner.manifest.get()
    }

    /// Return the manifest, fetching it on first use
    pub async fn load_manifest(&self) -> Result<Arc<DepotManifestV2>> {
        self.inner.manifest.get_or_load(|| self.fetch_manifest()).await
    }

    /// Fetch the manifest again and replace the loaded one
    pub async fn update_manifest(&self) -> Result<Arc<DepotManifestV2>> {
        self.inner.manifest.reload(|| self.fetch_manifest()).await
    }

    async fn fetch_manifest(&self) -> Result<DepotManifestV2> {
        let url = self.manifest_url()?;
        debug!(url = %url, "Fetching generation-2 depot manifest");
        let data = self.inner.fetcher.fetch_document(&url, true).await?;
        Ok(DepotManifestV2::parse(&data)?)
    }
}

/// Depot handle of either generation
#[derive(Clone)]
pub enum RemoteDepot {
    /// Depot of a generation-1 repository
    GenerationOne(RemoteDepotV1),
    /// Depot of a generation-2 repository
    GenerationTwo(RemoteDepotV2),
}

/// Loaded manifest of either generation
#[derive(Debug, Clone)]
pub enum DepotManifest {
    /// Flat file list with directories and links
    GenerationOne(Arc<DepotManifestV1>),
    /// Chunked files addressed by compressed md5
    GenerationTwo(Arc<DepotManifestV2>),
}

impl RemoteDepot {
    /// Schema generation of the depot
    pub const fn generation(&self) -> Generation {
        match self {
            Self::GenerationOne(_) => Generation::One,
            Self::GenerationTwo(_) => Generation::Two,
        }
    }

    /// Normalized languages of the depot
    pub fn languages(&self) -> &[String] {
        match self {
            Self::GenerationOne(depot) => &depot.depot().languages,
            Self::GenerationTwo(depot) => &depot.depot().languages,
        }
    }

    /// Installed size of the depot
    pub fn size(&self) -> u64 {
        match self {
            Self::GenerationOne(depot) => depot.depot().size,
            Self::GenerationTwo(depot) => depot.depot().size,
        }
    }

    /// Manifest, if it has been loaded
    pub fn manifest(&self) -> Option<DepotManifest> {
        match self {
            Self::GenerationOne(depot) => depot.manifest().map(DepotManifest::GenerationOne),
            Self::GenerationTwo(depot) => depot.manifest().map(DepotManifest::GenerationTwo),
        }
    }

    /// Return the manifest, fetching it on first use
    pub async fn load_manifest(&self) -> Result<DepotManifest> {
        match self {
            Self::GenerationOne(depot) => depot.load_manifest().await.map(DepotManifest::GenerationOne),
            Self::GenerationTwo(depot) => depot.load_manifest().await.map(DepotManifest::GenerationTwo),
        }
    }

    /// Fetch the manifest again and replace the loaded one
    pub async fn update_manifest(&self) -> Result<DepotManifest> {
        match self {
            Self::GenerationOne(depot) => depot
                .update_manifest()
                .await
                .map(DepotManifest::GenerationOne),
            Self::GenerationTwo(depot) => depot
                .update_manifest()
                .await
                .map(DepotManifest::GenerationTwo),
        }
    }
}

impl DepotManifest {
    /// Number of files in the manifest
    pub fn file_count(&self) -> usize {
        match self {
            Self::GenerationOne(manifest) => manifest.files.len(),
            Self::GenerationTwo(manifest) => manifest.files.len(),
        }
    }

    /// Installed size of all files with a known size
    pub fn total_size(&self) -> u64 {
        match self {
            Self::GenerationOne(manifest) => manifest.total_size(),
            Self::GenerationTwo(manifest) => manifest.total_size(),
        }
    }
}
