use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Terrain theme of a run. Decides which surface art, gem and decorations a
/// chunk is drawn with, and which gem counter a run feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Forest,
    Tundra,
    Desert,
}

impl Terrain {
    pub const ALL: [Terrain; 3] = [Terrain::Forest, Terrain::Tundra, Terrain::Desert];

    pub fn as_str(self) -> &'static str {
        match self {
            Terrain::Forest => "forest",
            Terrain::Tundra => "tundra",
            Terrain::Desert => "desert",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown terrain `{0}` (expected forest, tundra or desert)")]
pub struct UnknownTerrain(pub String);

impl FromStr for Terrain {
    type Err = UnknownTerrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Terrain::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTerrain(s.to_string()))
    }
}
