//! Session lifecycle and output events

use serde::{Deserialize, Serialize};

/// Lifecycle shared by every session variant
///
/// `Init → Running ⇄ Paused → GameOver`; resetting returns to `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionPhase {
    #[default]
    Init,
    Running,
    Paused,
    GameOver,
}

impl SessionPhase {
    /// Flip between running and paused; other phases are unaffected
    pub fn toggled(self) -> Self {
        match self {
            SessionPhase::Running => SessionPhase::Paused,
            SessionPhase::Paused => SessionPhase::Running,
            other => other,
        }
    }
}

/// Things a session tick produced, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Score went up by `points` to `total`
    ScoreChanged { points: u64, total: u64 },
    /// A 100-point band was entered; credit `amount`
    GameplayReward { amount: f64 },
    LifeLost { remaining: u8 },
    LevelUp { level: u32 },
    PairMatched { first: usize, second: usize },
    PairMissed { first: usize, second: usize },
    /// Terminal; carries the score to commit
    GameOver { final_score: u64, level: u32 },
}
