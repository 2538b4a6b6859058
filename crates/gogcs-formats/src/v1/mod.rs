//! Generation-1 content system documents
//!
//! # Structure
//!
//! - **Repository** (`repository.json`): depots, redistributables, support
//!   commands and sub-products of one build
//! - **Depot manifest** (`<id>.json` next to the repository): a flat list
//!   of items classified into files, directories and symbolic links
//!
//! # Example
//!
//! ```rust
//! use gogcs_formats::v1::RepositoryV1;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = br#"{
//!     "version": 1,
//!     "product": {
//!         "timestamp": 1441894528,
//!         "depots": [{
//!             "languages": ["English"],
//!             "size": "1024",
//!             "gameIDs": ["1207658924"],
//!             "systems": ["Windows"],
//!             "manifest": "5f2a.json"
//!         }],
//!         "support_commands": [],
//!         "installDirectory": "Game",
//!         "rootGameID": "1207658924",
//!         "gameIDs": [],
//!         "projectName": "Game"
//!     }
//! }"#;
//!
//! let url = "https://cdn.gog.com/content-system/v1/manifests/1207658924/windows/1.0/repository.json";
//! let repository = RepositoryV1::parse(data, url)?;
//! assert_eq!(
//!     repository.depots[0].manifest_url(),
//!     "https://cdn.gog.com/content-system/v1/manifests/1207658924/windows/1.0/5f2a.json"
//! );
//! # Ok(())
//! # }
//! ```

mod manifest;
mod repository;

pub use manifest::{DepotDirectoryV1, DepotFileV1, DepotLinkV1, DepotManifestV1};
pub use repository::{DepotV1, ProductV1, Redistributable, RepositoryV1, SupportCommand};

/// Schema version declared by generation-1 documents
pub const SCHEMA_VERSION: u64 = 1;
