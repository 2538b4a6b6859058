use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SCHEMA_VERSION;
use crate::document::{string_from_any, strings_from_any, u64_from_any, versioned_document};
use crate::error::{ManifestError, Result};
use crate::normalization::{self, Os};

/// Generation-1 install description of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryV1 {
    /// URL the repository was fetched from
    pub url: String,
    /// Repository timestamp as sent by the server
    pub timestamp: String,
    /// Content depots
    pub depots: Vec<DepotV1>,
    /// Redistributables installed alongside the game
    pub redistributables: Vec<Redistributable>,
    /// Commands run from the support directory
    pub support_commands: Vec<SupportCommand>,
    /// Default install directory name
    pub install_directory: String,
    /// Product id of the base game
    pub root_game_id: String,
    /// Sub-products (base game and DLCs) the build covers
    pub products: Vec<ProductV1>,
    /// Internal project name
    pub project_name: String,
}

/// One OS/language-scoped slice of generation-1 content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepotV1 {
    /// URL of the repository that declared this depot
    pub url: String,
    /// Normalized language tags
    pub languages: Vec<String>,
    /// Installed size in bytes
    pub size: u64,
    /// Product ids the depot applies to
    pub game_ids: Vec<String>,
    /// Normalized systems the depot applies to
    pub systems: Vec<Os>,
    /// Manifest filename, relative to [`DepotV1::url`]
    pub manifest_name: String,
}

impl DepotV1 {
    /// URL of the depot manifest
    ///
    /// The trailing filename segment of the repository URL is replaced by
    /// the manifest filename.
    pub fn manifest_url(&self) -> String {
        let directory = self.url.rfind('/').map_or("", |slash| &self.url[..=slash]);
        format!("{directory}{}", self.manifest_name)
    }

    /// Manifest id, the manifest filename without its `.json` extension
    pub fn manifest_id(&self) -> Result<&str> {
        self.manifest_name
            .strip_suffix(".json")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ManifestError::InvalidManifestReference(self.manifest_name.clone()))
    }

    /// First system the depot applies to
    pub fn os(&self) -> Option<&Os> {
        self.systems.first()
    }
}

/// Redistributable package shipped with a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redistributable {
    /// Redistributable name
    pub redist: String,
    /// Installer executable
    #[serde(default)]
    pub executable: String,
    /// Installer arguments
    #[serde(default)]
    pub argument: String,
    /// Download size in bytes
    #[serde(default, deserialize_with = "u64_from_any")]
    pub size: u64,
}

/// Command executed from the support directory during installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportCommand {
    /// Normalized languages the command applies to
    #[serde(default, deserialize_with = "normalization::languages")]
    pub languages: Vec<String>,
    /// Executable path
    pub executable: String,
    /// Product the command belongs to
    #[serde(rename = "gameID", default, deserialize_with = "string_from_any")]
    pub game_id: String,
    /// Normalized systems the command applies to
    #[serde(default, deserialize_with = "normalization::systems")]
    pub systems: Vec<Os>,
    /// Command arguments
    #[serde(default)]
    pub argument: String,
}

/// Sub-product descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductV1 {
    /// Product id
    #[serde(rename = "gameID", deserialize_with = "string_from_any")]
    pub game_id: String,
    /// Localized product names keyed by language
    #[serde(default)]
    pub name: BTreeMap<String, String>,
    /// Whether the product can be installed on its own
    #[serde(default)]
    pub standalone: bool,
    /// Product this one depends on, empty when none
    #[serde(default)]
    pub dependency: String,
}

#[derive(Deserialize)]
struct RawRepository {
    product: RawProduct,
}

#[derive(Deserialize)]
struct RawProduct {
    #[serde(default, deserialize_with = "string_from_any")]
    timestamp: String,
    #[serde(default)]
    depots: Vec<RawDepotEntry>,
    #[serde(default)]
    support_commands: Vec<SupportCommand>,
    #[serde(rename = "installDirectory", default)]
    install_directory: String,
    #[serde(rename = "rootGameID", default, deserialize_with = "string_from_any")]
    root_game_id: String,
    #[serde(rename = "gameIDs", default)]
    game_ids: Vec<ProductV1>,
    #[serde(rename = "projectName", default)]
    project_name: String,
}

// Depots reference a manifest, redistributables do not.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDepotEntry {
    Depot(RawDepot),
    Redist(Redistributable),
}

#[derive(Deserialize)]
struct RawDepot {
    #[serde(default, deserialize_with = "normalization::languages")]
    languages: Vec<String>,
    #[serde(deserialize_with = "u64_from_any")]
    size: u64,
    #[serde(rename = "gameIDs", default, deserialize_with = "strings_from_any")]
    game_ids: Vec<String>,
    #[serde(default, deserialize_with = "normalization::systems")]
    systems: Vec<Os>,
    manifest: String,
}

impl RepositoryV1 {
    /// Parse a generation-1 repository fetched from `url`
    ///
    /// # Errors
    /// Returns error if:
    /// - The document's `version` is not 1
    /// - The document does not match the generation-1 repository shape
    pub fn parse(data: &[u8], url: &str) -> Result<Self> {
        let value = versioned_document(data, SCHEMA_VERSION)?;
        let raw: RawRepository = serde_json::from_value(value)?;
        let product = raw.product;

        let mut depots = Vec::new();
        let mut redistributables = Vec::new();
        for entry in product.depots {
            match entry {
                RawDepotEntry::Depot(depot) => depots.push(DepotV1 {
                    url: url.to_string(),
                    languages: depot.languages,
                    size: depot.size,
                    game_ids: depot.game_ids,
                    systems: depot.systems,
                    manifest_name: depot.manifest,
                }),
                RawDepotEntry::Redist(redist) => redistributables.push(redist),
            }
        }

        Ok(Self {
            url: url.to_string(),
            timestamp: product.timestamp,
            depots,
            redistributables,
            support_commands: product.support_commands,
            install_directory: product.install_directory,
            root_game_id: product.root_game_id,
            products: product.game_ids,
            project_name: product.project_name,
        })
    }

    /// Depots applicable to a system and language
    ///
    /// Depots with the neutral language `*` match every language.
    pub fn depots_for<'a>(&'a self, os: &'a Os, language: &'a str) -> impl Iterator<Item = &'a DepotV1> {
        self.depots.iter().filter(move |depot| {
            depot.systems.contains(os)
                && depot
                    .languages
                    .iter()
                    .any(|lang| lang == "*" || lang == language)
        })
    }

    /// Total installed size of all depots
    pub fn total_size(&self) -> u64 {
        self.depots
            .iter()
            .map(|depot| depot.size)
            .fold(0, u64::saturating_add)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str =
        "https://cdn.gog.com/content-system/v1/manifests/1207658924/windows/37794096/repository.json";

    fn repository_json(version: u64) -> String {
        format!(
            r#"{{
                "version": {version},
                "product": {{
                    "timestamp": 1441894528,
                    "depots": [
                        {{
                            "languages": ["English", "german"],
                            "size": "2048",
                            "gameIDs": ["1207658924"],
                            "systems": ["Windows"],
                            "manifest": "5a1c3f1d-0af1-4b85-a3b2-c01a1b9c7d6b.json"
                        }},
                        {{
                            "languages": ["Neutral"],
                            "size": 512,
                            "gameIDs": [1207658925],
                            "systems": ["osx"],
                            "manifest": "0c3c5a51-bb37-4b2a-8d3c-51b0fa3a1b2d.json"
                        }},
                        {{
                            "redist": "DirectX",
                            "executable": "__redist/DirectX/DXSETUP.exe",
                            "argument": "/silent",
                            "size": "0"
                        }}
                    ],
                    "support_commands": [
                        {{
                            "languages": ["Neutral"],
                            "executable": "/gog_galaxy_support.exe",
                            "gameID": "1207658924",
                            "systems": ["Windows"],
                            "argument": ""
                        }}
                    ],
                    "installDirectory": "Unreal Tournament 2004",
                    "rootGameID": "1207658924",
                    "gameIDs": [
                        {{
                            "gameID": "1207658924",
                            "name": {{"en": "Unreal Tournament 2004"}},
                            "standalone": true,
                            "dependency": ""
                        }}
                    ],
                    "projectName": "UT2004"
                }}
            }}"#
        )
    }

    #[test]
    fn test_parse_repository() {
        let repo = RepositoryV1::parse(repository_json(1).as_bytes(), URL)
            .expect("Operation should succeed");

        assert_eq!(repo.timestamp, "1441894528");
        assert_eq!(repo.depots.len(), 2);
        assert_eq!(repo.redistributables.len(), 1);
        assert_eq!(repo.redistributables[0].redist, "DirectX");
        assert_eq!(repo.support_commands[0].languages, vec!["*".to_string()]);
        assert_eq!(repo.install_directory, "Unreal Tournament 2004");
        assert_eq!(repo.root_game_id, "1207658924");
        assert_eq!(repo.products[0].name["en"], "Unreal Tournament 2004");
        assert!(repo.products[0].standalone);
        assert_eq!(repo.project_name, "UT2004");
        assert_eq!(repo.total_size(), 2560);

        let depot = &repo.depots[0];
        assert_eq!(depot.languages, vec!["en-US".to_string(), "de-DE".to_string()]);
        assert_eq!(depot.size, 2048);
        assert_eq!(depot.os(), Some(&Os::Windows));

        let mac = &repo.depots[1];
        assert_eq!(mac.systems, vec![Os::Mac]);
        assert_eq!(mac.game_ids, vec!["1207658925".to_string()]);
    }

    #[test]
    fn test_manifest_url_replaces_filename() {
        let repo = RepositoryV1::parse(repository_json(1).as_bytes(), URL)
            .expect("Operation should succeed");
        assert_eq!(
            repo.depots[0].manifest_url(),
            "https://cdn.gog.com/content-system/v1/manifests/1207658924/windows/37794096/5a1c3f1d-0af1-4b85-a3b2-c01a1b9c7d6b.json"
        );
    }

    #[test]
    fn test_manifest_url_property() {
        let depot = DepotV1 {
            url: "https://host/x/y/file.json".to_string(),
            languages: Vec::new(),
            size: 0,
            game_ids: Vec::new(),
            systems: Vec::new(),
            manifest_name: "depot.json".to_string(),
        };
        assert_eq!(depot.manifest_url(), "https://host/x/y/depot.json");
        assert_eq!(depot.manifest_id().unwrap(), "depot");
    }

    #[test]
    fn test_manifest_id_requires_json_suffix() {
        let depot = DepotV1 {
            url: URL.to_string(),
            languages: Vec::new(),
            size: 0,
            game_ids: Vec::new(),
            systems: Vec::new(),
            manifest_name: "depot.xml".to_string(),
        };
        assert!(matches!(
            depot.manifest_id(),
            Err(ManifestError::InvalidManifestReference(_))
        ));
    }

    #[test]
    fn test_depots_for() {
        let repo = RepositoryV1::parse(repository_json(1).as_bytes(), URL)
            .expect("Operation should succeed");
        assert_eq!(repo.depots_for(&Os::Windows, "de-DE").count(), 1);
        assert_eq!(repo.depots_for(&Os::Windows, "fr-FR").count(), 0);
        assert_eq!(repo.depots_for(&Os::Mac, "fr-FR").count(), 1);
    }

    #[test]
    fn test_schema_mismatch() {
        assert!(matches!(
            RepositoryV1::parse(repository_json(2).as_bytes(), URL),
            Err(ManifestError::SchemaMismatch {
                expected: 1,
                found: 2
            })
        ));
    }
}
