//! Generation dispatch from a build to its repository

use futures::future::try_join_all;
use gogcs_formats::v1::RepositoryV1;
use gogcs_formats::v2::RepositoryV2;
use gogcs_formats::{Build, Generation};
use std::sync::Arc;
use tracing::debug;

use crate::depot::{DepotManifest, RemoteDepot, RemoteDepotV1, RemoteDepotV2};
use crate::error::{ProtocolError, Result};
use crate::lazy::LazyField;
use crate::transport::ContentFetcher;

/// Parsed repository of either generation with depot handles
#[derive(Clone)]
pub enum Repository {
    /// Plain JSON repository with URL-addressed depot manifests
    GenerationOne {
        /// Parsed repository document
        repository: Arc<RepositoryV1>,
        /// One handle per depot, in document order
        depots: Vec<RemoteDepotV1>,
    },
    /// Compressed repository with id-addressed depot manifests
    GenerationTwo {
        /// Parsed repository document
        repository: Arc<RepositoryV2>,
        /// One handle per depot, offline depot last
        depots: Vec<RemoteDepotV2>,
    },
}

impl Repository {
    /// Fetch and parse the repository a build points to
    ///
    /// Generation 1 is fetched as plain JSON, generation 2 as
    /// zlib-compressed JSON. Any other generation fails before a request is
    /// made.
    pub async fn fetch(
        build: &Build,
        cdn_url: &str,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Result<Self> {
        let generation = build
            .schema_generation()
            .map_err(|_| ProtocolError::UnsupportedGeneration(build.generation))?;

        debug!(
            build_id = build.id,
            generation = %generation,
            link = %build.link,
            "Fetching repository"
        );

        match generation {
            Generation::One => {
                let data = fetcher.fetch_document(&build.link, false).await?;
                let repository = RepositoryV1::parse(&data, &build.link)?;
                Ok(Self::from_v1(repository, &fetcher))
            }
            Generation::Two => {
                let data = fetcher.fetch_document(&build.link, true).await?;
                let repository = RepositoryV2::parse(&data)?;
                Ok(Self::from_v2(repository, cdn_url, &fetcher))
            }
        }
    }

    pub(crate) fn from_v1(repository: RepositoryV1, fetcher: &Arc<dyn ContentFetcher>) -> Self {
        let depots = repository
            .depots
            .iter()
            .cloned()
            .map(|depot| RemoteDepotV1::new(depot, Arc::clone(fetcher)))
            .collect();
        Self::GenerationOne {
            repository: Arc::new(repository),
            depots,
        }
    }

    pub(crate) fn from_v2(
        repository: RepositoryV2,
        cdn_url: &str,
        fetcher: &Arc<dyn ContentFetcher>,
    ) -> Self {
        let cdn_url: Arc<str> = Arc::from(cdn_url);
        let depots = repository
            .depots
            .iter()
            .cloned()
            .map(|depot| RemoteDepotV2::new(depot, Arc::clone(&cdn_url), Arc::clone(fetcher)))
            .collect();
        Self::GenerationTwo {
            repository: Arc::new(repository),
            depots,
        }
    }

    /// Schema generation of the repository
    pub const fn generation(&self) -> Generation {
        match self {
            Self::GenerationOne { .. } => Generation::One,
            Self::GenerationTwo { .. } => Generation::Two,
        }
    }

    /// Default install directory name
    pub fn install_directory(&self) -> &str {
        match self {
            Self::GenerationOne { repository, .. } => &repository.install_directory,
            Self::GenerationTwo { repository, .. } => &repository.install_directory,
        }
    }

    /// Depot handles in document order
    pub fn depots(&self) -> Vec<RemoteDepot> {
        match self {
            Self::GenerationOne { depots, .. } => {
                depots.iter().cloned().map(RemoteDepot::GenerationOne).collect()
            }
            Self::GenerationTwo { depots, .. } => {
                depots.iter().cloned().map(RemoteDepot::GenerationTwo).collect()
            }
        }
    }

    /// Load every depot manifest concurrently
    ///
    /// Fails on the first depot that fails; manifests loaded by the others
    /// stay loaded on their depots.
    pub async fn load_manifests(&self) -> Result<Vec<DepotManifest>> {
        let depots = self.depots();
        try_join_all(depots.iter().map(|depot| depot.load_manifest())).await
    }
}

/// Build with a lazily fetched repository
#[derive(Clone)]
pub struct RemoteBuild {
    inner: Arc<BuildInner>,
}

struct BuildInner {
    build: Build,
    cdn_url: String,
    fetcher: Arc<dyn ContentFetcher>,
    repository: LazyField<Repository>,
}

impl RemoteBuild {
    pub(crate) fn new(build: Build, cdn_url: String, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            inner: Arc::new(BuildInner {
                build,
                cdn_url,
                fetcher,
                repository: LazyField::new(),
            }),
        }
    }

    /// Build descriptor
    pub fn build(&self) -> &Build {
        &self.inner.build
    }

    /// Repository, if it has been loaded
    pub fn repository(&self) -> Option<Arc<Repository>> {
        self.inner.repository.get()
    }

    /// Return the repository, fetching it on first use
    pub async fn load_repository(&self) -> Result<Arc<Repository>> {
        self.inner
            .repository
            .get_or_load(|| self.fetch_repository())
            .await
    }

    /// Fetch the repository again and replace the loaded one
    ///
    /// The replacement carries fresh depot handles; manifests loaded
    /// through the previous repository are not carried over.
    pub async fn update_repository(&self) -> Result<Arc<Repository>> {
        self.inner.repository.reload(|| self.fetch_repository()).await
    }

    async fn fetch_repository(&self) -> Result<Repository> {
        Repository::fetch(
            &self.inner.build,
            &self.inner.cdn_url,
            Arc::clone(&self.inner.fetcher),
        )
        .await
    }
}
