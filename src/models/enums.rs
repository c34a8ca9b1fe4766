//! Shared domain enums

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Book genre classification
///
/// Parsing is total: anything that is not a known genre becomes
/// [`Genre::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Genre {
    Fiction,
    Nonfiction,
    Fantasy,
    Mystery,
    Adventure,
    Romance,
    Science,
    History,
    #[default]
    Unknown,
}

impl Genre {
    pub const ALL: [Genre; 9] = [
        Genre::Fiction,
        Genre::Nonfiction,
        Genre::Fantasy,
        Genre::Mystery,
        Genre::Adventure,
        Genre::Romance,
        Genre::Science,
        Genre::History,
        Genre::Unknown,
    ];

    /// Parse free text, ASCII case-insensitive
    pub fn parse(text: &str) -> Genre {
        match text.to_ascii_lowercase().as_str() {
            "fiction" => Genre::Fiction,
            "nonfiction" => Genre::Nonfiction,
            "fantasy" => Genre::Fantasy,
            "mystery" => Genre::Mystery,
            "adventure" => Genre::Adventure,
            "romance" => Genre::Romance,
            "science" => Genre::Science,
            "history" => Genre::History,
            _ => Genre::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "fiction",
            Genre::Nonfiction => "nonfiction",
            Genre::Fantasy => "fantasy",
            Genre::Mystery => "mystery",
            Genre::Adventure => "adventure",
            Genre::Romance => "romance",
            Genre::Science => "science",
            Genre::History => "history",
            Genre::Unknown => "unknown",
        }
    }
}

impl From<&str> for Genre {
    fn from(text: &str) -> Self {
        Genre::parse(text)
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Genre {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Genre::parse(&text))
    }
}
