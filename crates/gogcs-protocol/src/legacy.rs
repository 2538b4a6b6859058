//! Legacy installer files resolved through info links and chunklists
//!
//! Resolution is two-step. The file's info link yields a secure download
//! link and a chunklist link; the chunklist link yields the XML chunklist.
//! Both results are cached on the file handle, and reloading the chunklist
//! reuses the cached info link.

use gogcs_formats::chunklist::{ChunkList, Download, DownloadFile, InfoLink};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::lazy::LazyField;
use crate::transport::ContentFetcher;

struct FileInner {
    file: DownloadFile,
    fetcher: Arc<dyn ContentFetcher>,
    info_link: LazyField<InfoLink>,
    chunklist: LazyField<ChunkList>,
}

/// File of a legacy download
#[derive(Clone)]
pub struct LegacyFile {
    inner: Arc<FileInner>,
}

impl LegacyFile {
    /// Wrap a download file for resolution through `fetcher`
    pub fn new(file: DownloadFile, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            inner: Arc::new(FileInner {
                file,
                fetcher,
                info_link: LazyField::new(),
                chunklist: LazyField::new(),
            }),
        }
    }

    /// File handles of every file of a download
    pub fn from_download(download: &Download, fetcher: &Arc<dyn ContentFetcher>) -> Vec<Self> {
        download
            .files
            .iter()
            .cloned()
            .map(|file| Self::new(file, Arc::clone(fetcher)))
            .collect()
    }

    /// File id
    pub fn id(&self) -> &str {
        &self.inner.file.id
    }

    /// File size in bytes
    pub fn size(&self) -> u64 {
        self.inner.file.size
    }

    /// Download file descriptor
    pub fn file(&self) -> &DownloadFile {
        &self.inner.file
    }

    /// Info link, if it has been loaded
    pub fn info_link(&self) -> Option<Arc<InfoLink>> {
        self.inner.info_link.get()
    }

    /// Secure download link of the whole file, if the info link is loaded
    pub fn secure_link(&self) -> Option<String> {
        self.info_link().map(|info| info.secure_link.clone())
    }

    /// Chunklist, if it has been loaded
    pub fn chunklist(&self) -> Option<Arc<ChunkList>> {
        self.inner.chunklist.get()
    }

    /// Return the info link, fetching it on first use
    pub async fn load_info_link(&self) -> Result<Arc<InfoLink>> {
        self.inner
            .info_link
            .get_or_load(|| self.fetch_info_link())
            .await
    }

    /// Fetch the info link again, e.g. after its secure link expired
    pub async fn update_info_link(&self) -> Result<Arc<InfoLink>> {
        self.inner.info_link.reload(|| self.fetch_info_link()).await
    }

    /// Return the chunklist, fetching it and the info link on first use
    pub async fn load_chunklist(&self) -> Result<Arc<ChunkList>> {
        self.inner
            .chunklist
            .get_or_load(|| self.fetch_chunklist())
            .await
    }

    /// Fetch the chunklist again and replace the loaded one
    pub async fn update_chunklist(&self) -> Result<Arc<ChunkList>> {
        self.inner.chunklist.reload(|| self.fetch_chunklist()).await
    }

    async fn fetch_info_link(&self) -> Result<InfoLink> {
        debug!(file = %self.inner.file.id, url = %self.inner.file.info_link, "Fetching info link");
        let data = self
            .inner
            .fetcher
            .fetch_document(&self.inner.file.info_link, false)
            .await?;
        Ok(InfoLink::parse(&data)?)
    }

    async fn fetch_chunklist(&self) -> Result<ChunkList> {
        let info = self.load_info_link().await?;
        debug!(file = %self.inner.file.id, url = %info.chunklist_link, "Fetching chunklist");

        let xml = self.inner.fetcher.fetch_text(&info.chunklist_link).await?;
        let chunklist = ChunkList::parse(&xml)?;

        if !chunklist.available {
            warn!(
                file = %self.inner.file.id,
                message = %chunklist.not_available_message,
                "File is currently not available"
            );
        }
        if let Err(e) = chunklist.validate(self.inner.file.size) {
            warn!(file = %self.inner.file.id, "Chunklist does not cover the file: {}", e);
        }

        Ok(chunklist)
    }
}
