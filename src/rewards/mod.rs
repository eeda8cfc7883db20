//! Reward accounting
//!
//! - `rate`: capped multi-factor passive rate
//! - `ledger`: balance, history, streak and referral bookkeeping
//! - `hub`: the one serialized handle every producer credits through
//! - `bridge`: score threshold → gameplay reward

pub mod bridge;
pub mod hub;
pub mod ledger;
pub mod rate;

pub use bridge::{GAMEPLAY_REWARD, SCORE_THRESHOLD, ScoreEventBridge};
pub use hub::RewardHub;
pub use ledger::{
    AccrualCredit, AdRewardEvent, HISTORY_LIMIT, ProjectedEarnings, RewardLedger, RewardSource,
    StreakChange,
};
pub use rate::{BASE_RATE, MAX_RATE, REFERRAL_BONUS, STREAK_BONUS, reward_rate};
