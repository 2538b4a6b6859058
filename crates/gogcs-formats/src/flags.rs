use serde::{Serialize, Serializer};
use std::fmt;

/// Set of well-known file flags
///
/// Generation-1 manifests carry the flags as boolean keys, generation-2
/// manifests as a list of names. Unknown names are ignored here; the
/// generation-2 model keeps the raw list alongside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileFlags(u8);

impl FileFlags {
    /// File should be marked executable after installation
    pub const EXECUTABLE: Self = Self(0b001);
    /// File should be hidden
    pub const HIDDEN: Self = Self(0b010);
    /// File belongs to the support directory, not the game directory
    pub const SUPPORT: Self = Self(0b100);

    const NAMED: [(Self, &'static str); 3] = [
        (Self::EXECUTABLE, "executable"),
        (Self::HIDDEN, "hidden"),
        (Self::SUPPORT, "support"),
    ];

    /// Empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check whether every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Add flags
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Check for the empty set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flag for a name, if the name is well-known
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }

    /// Collect the well-known flags out of a list of names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::empty();
        for name in names {
            if let Some(flag) = Self::from_name(name.as_ref()) {
                flags.insert(flag);
            }
        }
        flags
    }

    /// Names of the flags that are set
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl std::ops::BitOr for FileFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for FileFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        f.write_str(&names.join("|"))
    }
}

/// Serialized as the list of set flag names
impl Serialize for FileFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
