//! High score leaderboards
//!
//! One top-10 list per game variant, persisted under
//! `game-highscores/<variant-slug>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::GameVariant;
use crate::persistence::{HIGHSCORES_KEY, KeyValueStore, load_json, save_json};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    pub player_name: String,
    /// When achieved (epoch ms on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HighScores {
    pub scores: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self { scores: Vec::new() }
    }

    /// Check if a score would make the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if self.scores.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry; ties rank behind existing scores
        self.scores.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.scores.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.scores.len()) + 1)
    }

    /// Insert a score and keep the top `MAX_HIGH_SCORES`.
    ///
    /// Equal scores keep insertion order. Returns the rank achieved
    /// (1-indexed) or None if the entry was truncated away.
    pub fn submit(&mut self, score: u64, player_name: &str, date: DateTime<Utc>) -> Option<usize> {
        let entry = HighScoreEntry {
            score,
            player_name: player_name.to_string(),
            date,
        };

        // Insert before the first strictly lower score
        let pos = self
            .scores
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.scores.len());
        self.scores.insert(pos, entry);
        self.scores.truncate(MAX_HIGH_SCORES);

        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    /// First `min(limit, len)` entries
    pub fn top_n(&self, limit: usize) -> &[HighScoreEntry] {
        &self.scores[..limit.min(self.scores.len())]
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.scores.first().map(|e| e.score)
    }
}

/// Leaderboards for every variant, written through to the store on submit
#[derive(Clone)]
pub struct HighScoreBook {
    space_shooter: HighScores,
    puzzle_master: HighScores,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for HighScoreBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighScoreBook")
            .field("space_shooter", &self.space_shooter)
            .field("puzzle_master", &self.puzzle_master)
            .finish_non_exhaustive()
    }
}

impl Default for HighScoreBook {
    fn default() -> Self {
        Self::new()
    }
}

impl HighScoreBook {
    /// In-memory book
    pub fn new() -> Self {
        Self {
            space_shooter: HighScores::new(),
            puzzle_master: HighScores::new(),
            store: None,
        }
    }

    /// Load every variant's list from `store`
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut book = Self::new();
        for variant in GameVariant::ALL {
            let key = Self::storage_key(variant);
            match load_json::<HighScores>(store.as_ref(), &key) {
                Ok(Some(mut scores)) => {
                    // Stable, so equal scores keep their stored order
                    scores.scores.sort_by(|a, b| b.score.cmp(&a.score));
                    scores.scores.truncate(MAX_HIGH_SCORES);
                    log::info!("Loaded {} high scores for {}", scores.scores.len(), variant.slug());
                    *book.get_mut(variant) = scores;
                }
                Ok(None) => log::info!("No high scores for {}, starting fresh", variant.slug()),
                Err(e) => log::warn!("High scores for {} unreadable: {}", variant.slug(), e),
            }
        }
        book.store = Some(store);
        book
    }

    pub fn storage_key(variant: GameVariant) -> String {
        format!("{}/{}", HIGHSCORES_KEY, variant.slug())
    }

    pub fn get(&self, variant: GameVariant) -> &HighScores {
        match variant {
            GameVariant::SpaceShooter => &self.space_shooter,
            GameVariant::PuzzleMaster => &self.puzzle_master,
        }
    }

    fn get_mut(&mut self, variant: GameVariant) -> &mut HighScores {
        match variant {
            GameVariant::SpaceShooter => &mut self.space_shooter,
            GameVariant::PuzzleMaster => &mut self.puzzle_master,
        }
    }

    pub fn submit(
        &mut self,
        variant: GameVariant,
        score: u64,
        player_name: &str,
        date: DateTime<Utc>,
    ) -> Option<usize> {
        let rank = self.get_mut(variant).submit(score, player_name, date);
        match rank {
            Some(r) => log::info!("{} scored {} on {} (rank #{})", player_name, score, variant.slug(), r),
            None => log::info!("{} scored {} on {} (unranked)", player_name, score, variant.slug()),
        }

        if let Some(store) = &self.store {
            let key = Self::storage_key(variant);
            if let Err(e) = save_json(store.as_ref(), &key, self.get(variant)) {
                log::warn!("Failed to save high scores: {}", e);
            }
        }
        rank
    }

    pub fn top_n(&self, variant: GameVariant, limit: usize) -> &[HighScoreEntry] {
        self.get(variant).top_n(limit)
    }
}
