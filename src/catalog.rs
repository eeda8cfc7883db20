//! Game catalog
//!
//! Every title shown to the player. Only single-player titles have a session
//! implementation; the multiplayer entries are listed but not playable.

use serde::{Deserialize, Serialize};

/// Playable game variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameVariant {
    /// Continuous-motion shooter
    SpaceShooter,
    /// Tile pair matching
    PuzzleMaster,
}

impl GameVariant {
    pub const ALL: [GameVariant; 2] = [GameVariant::SpaceShooter, GameVariant::PuzzleMaster];

    pub fn slug(&self) -> &'static str {
        match self {
            GameVariant::SpaceShooter => "space-shooter",
            GameVariant::PuzzleMaster => "puzzle-master",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "space-shooter" | "shooter" | "arcade" => Some(GameVariant::SpaceShooter),
            "puzzle-master" | "puzzle" | "tiles" => Some(GameVariant::PuzzleMaster),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub multiplayer: bool,
    /// `None` for titles without a session implementation
    pub variant: Option<GameVariant>,
}

pub static CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        id: "1",
        title: "Space Shooter",
        description: "Classic arcade space shooting game",
        category: "Arcade",
        multiplayer: false,
        variant: Some(GameVariant::SpaceShooter),
    },
    CatalogEntry {
        id: "2",
        title: "Puzzle Master",
        description: "Brain-teasing puzzle challenges",
        category: "Puzzle",
        multiplayer: false,
        variant: Some(GameVariant::PuzzleMaster),
    },
    CatalogEntry {
        id: "3",
        title: "Chess Royale",
        description: "Online multiplayer chess",
        category: "Board",
        multiplayer: true,
        variant: None,
    },
    CatalogEntry {
        id: "4",
        title: "Word Battle",
        description: "Competitive word finding game",
        category: "Word",
        multiplayer: true,
        variant: None,
    },
];

/// Catalog entries that can be opened as sessions
pub fn playable() -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter().filter(|e| e.variant.is_some())
}
