use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SCHEMA_VERSION;
use crate::document::{
    inflate, opt_u64_from_any, string_from_any, strings_from_any, u64_from_any,
    versioned_document,
};
use crate::error::Result;
use crate::normalization::{self, Os};

/// Generation-2 install description of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryV2 {
    /// Product id of the base game
    pub base_product_id: String,
    /// OAuth client the game uses for its own API access
    pub credentials: Option<Credentials>,
    /// Cloud save locations
    pub cloud_saves: Vec<CloudSave>,
    /// Ids of dependency products (redistributables)
    pub dependencies: Vec<String>,
    /// Content depots, the offline depot last
    pub depots: Vec<DepotV2>,
    /// Default install directory name
    pub install_directory: String,
    /// Normalized platform
    pub platform: Os,
    /// Per-product install script descriptors
    pub products: Vec<ProductScript>,
    /// Build tags
    pub tags: Vec<String>,
}

/// Game client credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Client id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
}

/// Cloud save location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSave {
    /// Location template, e.g. `<?INSTALL?>/saves`
    pub location: String,
    /// Location name
    pub name: String,
}

/// Install script descriptor of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductScript {
    /// Product id
    #[serde(rename = "productId", deserialize_with = "string_from_any")]
    pub product_id: String,
    /// Product name
    #[serde(default)]
    pub name: String,
    /// Opaque install script
    #[serde(default)]
    pub script: Option<Value>,
    /// Temporary installer executable
    #[serde(default)]
    pub temp_executable: Option<String>,
    /// Arguments of the temporary installer executable
    #[serde(default)]
    pub temp_arguments: Option<String>,
}

/// One language-scoped, chunked slice of generation-2 content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotV2 {
    /// Size of all chunks as stored
    #[serde(rename = "compressedSize", default, deserialize_with = "opt_u64_from_any")]
    pub compressed_size: Option<u64>,
    /// Installed size
    #[serde(default, deserialize_with = "u64_from_any")]
    pub size: u64,
    /// Normalized language tags
    #[serde(default, deserialize_with = "normalization::languages")]
    pub languages: Vec<String>,
    /// Opaque manifest id, resolved through the meta endpoint
    #[serde(rename = "manifest")]
    pub manifest_id: String,
    /// Owning product id
    #[serde(rename = "productId", deserialize_with = "string_from_any")]
    pub product_id: String,
    /// Depot is shared GOG content rather than product content
    #[serde(rename = "isGogDepot", default)]
    pub is_gog_depot: bool,
    /// Architectures the depot applies to, absent for all
    #[serde(rename = "osBitness", default, deserialize_with = "opt_strings")]
    pub os_bitness: Option<Vec<String>>,
    /// Depot came from the repository's `offlineDepot` entry
    #[serde(skip_deserializing, default)]
    pub is_offline: bool,
}

impl DepotV2 {
    /// Whether the depot applies to a language
    ///
    /// Depots with the neutral language `*` apply to every language.
    pub fn has_language(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|lang| lang == "*" || lang == language)
    }
}

fn opt_strings<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "strings_from_any")] Vec<String>);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(values)| values))
}

#[derive(Deserialize)]
struct RawRepository {
    #[serde(rename = "baseProductId", deserialize_with = "string_from_any")]
    base_product_id: String,
    #[serde(rename = "clientId", default)]
    client_id: Option<String>,
    #[serde(rename = "clientSecret", default)]
    client_secret: Option<String>,
    #[serde(rename = "cloudSaves", default)]
    cloud_saves: Vec<CloudSave>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    depots: Vec<DepotV2>,
    #[serde(rename = "installDirectory", default)]
    install_directory: String,
    #[serde(rename = "offlineDepot", default)]
    offline_depot: Option<DepotV2>,
    platform: Os,
    #[serde(default)]
    products: Vec<ProductScript>,
    #[serde(default)]
    tags: Vec<String>,
}

impl RepositoryV2 {
    /// Parse an already inflated generation-2 repository
    ///
    /// # Errors
    /// Returns error if:
    /// - The document's `version` is not 2
    /// - The document does not match the generation-2 repository shape
    pub fn parse(data: &[u8]) -> Result<Self> {
        let value = versioned_document(data, SCHEMA_VERSION)?;
        let raw: RawRepository = serde_json::from_value(value)?;

        let credentials = match (raw.client_id, raw.client_secret) {
            (Some(client_id), Some(client_secret)) => Some(Credentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let mut depots = raw.depots;
        if let Some(mut offline) = raw.offline_depot {
            offline.is_offline = true;
            depots.push(offline);
        }

        Ok(Self {
            base_product_id: raw.base_product_id,
            credentials,
            cloud_saves: raw.cloud_saves,
            dependencies: raw.dependencies,
            depots,
            install_directory: raw.install_directory,
            platform: raw.platform,
            products: raw.products,
            tags: raw.tags,
        })
    }

    /// Inflate and parse a zlib-compressed generation-2 repository
    pub fn parse_compressed(data: &[u8]) -> Result<Self> {
        Self::parse(&inflate(data)?)
    }

    /// The depot flagged as offline, if the repository has one
    pub fn offline_depot(&self) -> Option<&DepotV2> {
        self.depots.iter().find(|depot| depot.is_offline)
    }

    /// Depots that apply to a language, excluding the offline depot
    pub fn depots_for<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a DepotV2> {
        self.depots
            .iter()
            .filter(move |depot| !depot.is_offline && depot.has_language(language))
    }
}
