//! Content system client

use gogcs_formats::chunklist::Download;
use gogcs_formats::v2::meta_url;
use gogcs_formats::{Build, BuildList, Generation, Os, SecureLink};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::legacy::LegacyFile;
use crate::repository::{RemoteBuild, Repository};
use crate::transport::{ContentFetcher, HttpTransport};

struct ClientInner {
    config: ClientConfig,
    fetcher: Arc<dyn ContentFetcher>,
}

/// Entry point to the content system
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct ContentClient {
    inner: Arc<ClientInner>,
}

impl ContentClient {
    /// Create a client backed by [`HttpTransport`]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(transport)))
    }

    /// Create a client backed by a custom fetcher
    pub fn with_fetcher(config: ClientConfig, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            inner: Arc::new(ClientInner { config, fetcher }),
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Fetcher every request goes through
    pub fn fetcher(&self) -> &Arc<dyn ContentFetcher> {
        &self.inner.fetcher
    }

    /// Builds of a product for one system
    pub async fn builds(&self, product_id: u64, os: &Os) -> Result<BuildList> {
        let mut url = Url::parse(&format!(
            "{}/products/{}/os/{}/builds",
            self.inner.config.content_system_url.trim_end_matches('/'),
            product_id,
            os
        ))?;
        url.query_pairs_mut().append_pair("generation", "2");

        debug!(product_id, os = %os, "Fetching build list");
        let data = self.inner.fetcher.fetch_document(url.as_str(), false).await?;
        Ok(BuildList::parse(&data)?)
    }

    /// Wrap a build so its repository loads lazily
    pub fn build(&self, build: Build) -> RemoteBuild {
        RemoteBuild::new(
            build,
            self.inner.config.cdn_url.clone(),
            Arc::clone(&self.inner.fetcher),
        )
    }

    /// Fetch and parse the repository of a build, dispatching on its generation
    pub async fn repository(&self, build: &Build) -> Result<Repository> {
        Repository::fetch(
            build,
            &self.inner.config.cdn_url,
            Arc::clone(&self.inner.fetcher),
        )
        .await
    }

    /// Meta endpoint URL of a generation-2 document id
    pub fn meta_url(&self, id: &str) -> Result<String> {
        Ok(meta_url(&self.inner.config.cdn_url, id)?)
    }

    /// Request a short-lived secure link for a product and link type
    ///
    /// Only generation 2 has a secure link endpoint; generation 1 fails
    /// with [`ProtocolError::UnsupportedGeneration`] before any request.
    pub async fn secure_link(
        &self,
        product_id: u64,
        path: &str,
        link_type: &str,
        generation: Generation,
    ) -> Result<SecureLink> {
        if generation != Generation::Two {
            return Err(ProtocolError::UnsupportedGeneration(generation.number()));
        }

        let mut url = Url::parse(&format!(
            "{}/products/{}/secure_link",
            self.inner.config.content_system_url.trim_end_matches('/'),
            product_id
        ))?;
        url.query_pairs_mut()
            .append_pair("_version", "2")
            .append_pair("generation", &generation.to_string())
            .append_pair("path", path)
            .append_pair("type", link_type);

        debug!(product_id, path, link_type, "Fetching secure link");
        let data = self.inner.fetcher.fetch_document(url.as_str(), false).await?;
        Ok(SecureLink::parse(&data)?)
    }

    /// File handles of a legacy download
    pub fn legacy_files(&self, download: &Download) -> Vec<LegacyFile> {
        LegacyFile::from_download(download, &self.inner.fetcher)
    }
}
