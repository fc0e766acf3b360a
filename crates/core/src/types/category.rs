//! Product categories offered in the marketplace.

use serde::{Deserialize, Serialize};

/// Craft category of a product.
///
/// Unknown category strings coming from the document store deserialize as
/// [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Pottery,
    Textile,
    Woodwork,
    Basketry,
    Metalwork,
    EcoCrafts,
    Leatherwork,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    /// Every category, in the order the add-item form lists them.
    pub const ALL: [Self; 8] = [
        Self::Pottery,
        Self::Textile,
        Self::Woodwork,
        Self::Basketry,
        Self::Metalwork,
        Self::EcoCrafts,
        Self::Leatherwork,
        Self::Other,
    ];

    /// Stored slug, e.g. `eco-crafts`.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Pottery => "pottery",
            Self::Textile => "textile",
            Self::Woodwork => "woodwork",
            Self::Basketry => "basketry",
            Self::Metalwork => "metalwork",
            Self::EcoCrafts => "eco-crafts",
            Self::Leatherwork => "leatherwork",
            Self::Other => "other",
        }
    }

    /// Filter-button label: the slug with its first letter capitalised.
    #[must_use]
    pub fn label(&self) -> String {
        capitalize(self.slug())
    }
}

/// Uppercase the first character of `s`.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.slug() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}
