//! Normalization of vendor OS and language tokens
//!
//! Both functions are total: input they do not recognize is passed through
//! rather than rejected, so schema drift on the server side degrades to an
//! unnormalized value instead of a parse failure.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical operating system of a build or depot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Os {
    /// Microsoft Windows
    Windows,
    /// macOS (`osx` in older documents)
    Mac,
    /// Linux
    Linux,
    /// Any other token, lower-cased
    Other(String),
}

impl Os {
    /// Canonical token
    pub fn as_str(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Linux => "linux",
            Self::Other(name) => name,
        }
    }

    /// Display name for the three known systems
    pub fn display_name(&self) -> Option<&'static str> {
        match self {
            Self::Windows => Some("Windows"),
            Self::Mac => Some("Mac"),
            Self::Linux => Some("Linux"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Os {
    fn from(name: String) -> Self {
        normalize_system(&name)
    }
}

impl From<&str> for Os {
    fn from(name: &str) -> Self {
        normalize_system(name)
    }
}

impl From<Os> for String {
    fn from(os: Os) -> Self {
        os.as_str().to_string()
    }
}

/// Fold an OS token into the canonical enumeration
pub fn normalize_system(name: &str) -> Os {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "windows" => Os::Windows,
        "mac" | "osx" => Os::Mac,
        "linux" => Os::Linux,
        _ => Os::Other(name),
    }
}

/// Canonical IETF language tags and their display names
static IETF_CODES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("*", "Neutral"),
        ("ar-SA", "Arabic"),
        ("be-BY", "Belarusian"),
        ("bg-BG", "Bulgarian"),
        ("ca-ES", "Catalan"),
        ("cs-CZ", "Czech"),
        ("da-DK", "Danish"),
        ("de-DE", "German"),
        ("en-US", "English"),
        ("es-ES", "Spanish"),
        ("es-MX", "Mexican Spanish"),
        ("fa-IR", "Persian"),
        ("fi-FI", "Finnish"),
        ("fr-FR", "French"),
        ("el-GR", "Greek"),
        ("he-IL", "Hebrew"),
        ("hu-HU", "Hungarian"),
        ("is-IS", "Icelandic"),
        ("it-IT", "Italian"),
        ("iu-CA", "Inuktitut"),
        ("ja-JP", "Japanese"),
        ("ko-KR", "Korean"),
        ("nb-NO", "Norwegian Bokmål"),
        ("nl-NL", "Dutch"),
        ("no-NO", "Norwegian"),
        ("pl-PL", "Polish"),
        ("pt-BR", "Brazilian Portuguese"),
        ("pt-PT", "Portuguese"),
        ("ro-RO", "Romanian"),
        ("ru-RU", "Russian"),
        ("sr-RS", "Serbian"),
        ("sk-SK", "Slovak"),
        ("sv-SE", "Swedish"),
        ("th-TH", "Thai"),
        ("tr-TR", "Turkish"),
        ("uk-UA", "Ukrainian"),
        ("zh-CN", "Chinese"),
        ("zh-Hans-CN", "Simplified Chinese"),
        ("zh-Hant-CN", "Traditional Chinese"),
    ])
});

/// Lower-cased canonical tag -> canonical tag
static IETF_FOLDED: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    IETF_CODES
        .keys()
        .map(|code| (code.to_ascii_lowercase(), *code))
        .collect()
});

/// Vendor language names and short codes -> canonical tag
static LANGUAGE_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("brazilian", "pt-BR"),
        ("brazilian-portuguese", "pt-BR"),
        ("czech", "cs-CZ"),
        ("english", "en-US"),
        ("french", "fr-FR"),
        ("german", "de-DE"),
        ("hungarian", "hu-HU"),
        ("italian", "it-IT"),
        ("japanese", "ja-JP"),
        ("neutral", "*"),
        ("polish", "pl-PL"),
        ("portuguese", "pt-PT"),
        ("russian", "ru-RU"),
        ("slovak", "sk-SK"),
        ("spanish", "es-ES"),
        ("ar", "ar-SA"),
        ("be", "be-BY"),
        ("bl", "bg-BG"),
        ("br", "pt-BR"),
        ("ca", "ca-ES"),
        ("cn", "zh-CN"),
        ("cz", "cs-CZ"),
        ("da", "da-DK"),
        ("de", "de-DE"),
        ("en", "en-US"),
        ("es", "es-ES"),
        ("es_mx", "es-MX"),
        ("fa", "fa-IR"),
        ("fi", "fi-FI"),
        ("fr", "fr-FR"),
        ("gk", "el-GR"),
        ("gog_in", "iu-CA"),
        ("hu", "hu-HU"),
        ("is", "is-IS"),
        ("it", "it-IT"),
        ("jp", "ja-JP"),
        ("ko", "ko-KR"),
        ("nl", "nl-NL"),
        ("no", "no-NO"),
        ("pl", "pl-PL"),
        ("pt", "pt-PT"),
        ("ro", "ro-RO"),
        ("ru", "ru-RU"),
        ("sb", "sr-RS"),
        ("sk", "sk-SK"),
        ("sv", "sv-SE"),
        ("th", "th-TH"),
        ("tr", "tr-TR"),
        ("uk", "uk-UA"),
        ("zh_hans", "zh-Hans-CN"),
        ("zh-hans", "zh-Hans-CN"),
        ("zh_hant", "zh-Hant-CN"),
    ])
});

/// Map a vendor language token to its canonical IETF tag
///
/// Canonical tags are returned as-is (case-insensitively matched), known
/// aliases are translated, and anything else is returned unchanged.
pub fn normalize_language(code: &str) -> String {
    if IETF_CODES.contains_key(code) {
        return code.to_string();
    }

    let folded = code.to_ascii_lowercase();
    if let Some(canonical) = IETF_FOLDED.get(&folded) {
        return (*canonical).to_string();
    }

    LANGUAGE_ALIASES
        .get(folded.as_str())
        .map_or_else(|| code.to_string(), |canonical| (*canonical).to_string())
}

/// Display name of a canonical language tag
pub fn language_name(code: &str) -> Option<&'static str> {
    IETF_CODES.get(code).copied()
}

pub(crate) fn languages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?
        .unwrap_or_default()
        .iter()
        .map(|code| normalize_language(code))
        .collect())
}

pub(crate) fn opt_language<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|code| normalize_language(&code)))
}

pub(crate) fn systems<'de, D>(deserializer: D) -> Result<Vec<Os>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?
        .unwrap_or_default()
        .iter()
        .map(|name| normalize_system(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_system_aliases() {
        assert_eq!(normalize_system("osx"), Os::Mac);
        assert_eq!(normalize_system("Mac"), Os::Mac);
        assert_eq!(normalize_system("mac"), Os::Mac);
        assert_eq!(normalize_system("OSX"), Os::Mac);
        assert_eq!(normalize_system("Windows"), Os::Windows);
        assert_eq!(normalize_system("linux"), Os::Linux);
    }

    #[test]
    fn test_unknown_system_is_lowercased() {
        assert_eq!(normalize_system("FreeBSD"), Os::Other("freebsd".to_string()));
        assert_eq!(normalize_system("FreeBSD").to_string(), "freebsd");
    }

    #[test]
    fn test_os_serde() {
        let os: Os = serde_json::from_str(r#""OSX""#).unwrap_or(Os::Windows);
        assert_eq!(os, Os::Mac);
        assert_eq!(serde_json::to_string(&Os::Mac).ok().as_deref(), Some(r#""mac""#));
    }

    #[test]
    fn test_language_canonical_passthrough() {
        assert_eq!(normalize_language("en-US"), "en-US");
        assert_eq!(normalize_language("zh-Hans-CN"), "zh-Hans-CN");
        assert_eq!(normalize_language("*"), "*");
    }

    #[test]
    fn test_language_case_folding() {
        assert_eq!(normalize_language("EN-us"), "en-US");
        assert_eq!(normalize_language("zh-hant-cn"), "zh-Hant-CN");
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!(normalize_language("english"), "en-US");
        assert_eq!(normalize_language("German"), "de-DE");
        assert_eq!(normalize_language("jp"), "ja-JP");
        assert_eq!(normalize_language("es_mx"), "es-MX");
        assert_eq!(normalize_language("neutral"), "*");
    }

    #[test]
    fn test_unknown_language_passthrough() {
        assert_eq!(normalize_language("Klingon"), "Klingon");
        assert_eq!(normalize_language(""), "");
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("pl-PL"), Some("Polish"));
        assert_eq!(language_name("pl"), None);
    }

    proptest! {
        #[test]
        fn normalize_system_is_idempotent(name in "\\PC{0,16}") {
            let once = normalize_system(&name);
            let twice = normalize_system(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_language_is_idempotent(code in "[A-Za-z_*-]{0,12}") {
            let once = normalize_language(&code);
            let twice = normalize_language(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
