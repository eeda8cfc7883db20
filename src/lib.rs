//! Reward Arcade - session and reward accrual engine
//!
//! Core modules:
//! - `sim`: Game session state machines (arcade shooter, tile matching)
//! - `rewards`: Rate formula, ledger, serialized hub, score bridge
//! - `accrual`: Passive time-based accrual and its background runner
//! - `highscores`: Per-variant top-10 leaderboards
//! - `session`: Owns the live session and routes its events
//! - `persistence`: Durable key-value store seam
//! - `platform`: Clock abstraction

pub mod accrual;
pub mod catalog;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod rewards;
pub mod session;
pub mod settings;
pub mod sim;

pub use accrual::{AccrualHandle, PassiveAccrual, spawn_accrual};
pub use catalog::{CATALOG, GameVariant};
pub use highscores::{HighScoreBook, HighScores};
pub use rewards::{RewardHub, RewardLedger, RewardSource};
pub use session::SessionController;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Frame rate the per-frame speeds were tuned at
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Arcade play-field dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Ship sits this far above the bottom edge
    pub const SHIP_BOTTOM_OFFSET: f32 = 50.0;
    pub const SHIP_SIZE: f32 = 30.0;

    pub const PROJECTILE_SIZE: f32 = 5.0;
    /// Upward movement per frame
    pub const PROJECTILE_SPEED: f32 = 10.0;

    pub const ENEMY_SIZE: f32 = 30.0;
    /// Downward movement per frame at level 1
    pub const ENEMY_BASE_SPEED: f32 = 2.0;
    pub const ENEMY_SPEED_INCREMENT: f32 = 0.5;
    pub const MAX_WAVE_SIZE: u32 = 5;

    pub const POINTS_PER_ENEMY: u64 = 10;
    pub const INITIAL_LIVES: u8 = 3;

    /// Tile match timings (seconds)
    pub const ROUND_SECONDS: u32 = 60;
    pub const MATCH_REVEAL_DELAY: f32 = 0.5;
    pub const MISMATCH_REVEAL_DELAY: f32 = 1.0;

    pub const BASE_PAIRS: usize = 3;
    pub const MAX_EXTRA_PAIRS: usize = 5;
    pub const MATCH_SCORE: u64 = 10;
    pub const CLEAR_BONUS: u64 = 50;
}
