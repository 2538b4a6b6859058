//! # gogcs-protocol - GOG content system client
//!
//! This crate resolves builds into repositories, depots into manifests and
//! legacy installer files into chunklists. Parsing is delegated to
//! [`gogcs_formats`]; this crate owns fetching and load-once state.
//!
//! ## Architecture Overview
//!
//! 1. **Transport** ([`ContentFetcher`], [`HttpTransport`]): authenticated GET
//!    returning raw, text or zlib-inflated bodies; retries live here only
//! 2. **Client** ([`ContentClient`]): build listings, secure links, and the
//!    generation dispatcher
//! 3. **Handles** ([`Repository`], [`RemoteDepot`], [`LegacyFile`]): parsed
//!    documents paired with [`LazyField`]s that fetch at most once
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gogcs_protocol::{ClientConfig, ContentClient, Generation, Os};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ContentClient::new(ClientConfig::from_env()?)?;
//!
//!     let builds = client.builds(1207658924, &Os::Windows).await?;
//!     let Some(build) = builds.latest() else {
//!         return Ok(());
//!     };
//!
//!     let repository = client.repository(build).await?;
//!     for depot in repository.depots() {
//!         let manifest = depot.load_manifest().await?;
//!         println!("{} files", manifest.file_count());
//!     }
//!
//!     let link = client
//!         .secure_link(1207658924, "/", "depot", Generation::Two)
//!         .await?;
//!     println!("{}", link.resolve("5d41402abc4b2a76b9719d911017c592")?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::missing_errors_doc)] // Errors documented at type level
#![allow(clippy::doc_markdown)] // Content-system terms don't need backticks
#![allow(clippy::cargo_common_metadata)] // Metadata comes from the workspace

pub mod client;
pub mod config;
pub mod depot;
pub mod error;
pub mod lazy;
pub mod legacy;
pub mod repository;
pub mod retry;
pub mod transport;

pub use client::ContentClient;
pub use config::ClientConfig;
pub use depot::{DepotManifest, RemoteDepot, RemoteDepotV1, RemoteDepotV2};
pub use error::{ProtocolError, Result};
pub use lazy::LazyField;
pub use legacy::LegacyFile;
pub use repository::{RemoteBuild, Repository};
pub use retry::RetryPolicy;
pub use transport::{ContentFetcher, HttpClient, HttpConfig, HttpTransport};

pub use gogcs_formats::{Build, BuildList, Generation, Os, SecureLink};
