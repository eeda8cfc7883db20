//! Passive reward rate
//!
//! Rates are currency units per minute.

/// Rate every user starts at
pub const BASE_RATE: f64 = 0.002;
/// Added per completed block of `STREAK_BLOCK_DAYS` streak days
pub const STREAK_BONUS: f64 = 0.001;
/// Added per unique referral
pub const REFERRAL_BONUS: f64 = 0.001;
/// Hard ceiling
pub const MAX_RATE: f64 = 0.01;
/// Streak days per bonus step
pub const STREAK_BLOCK_DAYS: u32 = 5;

/// Capped multi-factor reward rate for a streak length and referral count.
///
/// Always in `[BASE_RATE, MAX_RATE]` and non-decreasing in both arguments.
pub fn reward_rate(streak_days: u32, referral_count: usize) -> f64 {
    let streak_bonus = (streak_days / STREAK_BLOCK_DAYS) as f64 * STREAK_BONUS;
    let referral_bonus = referral_count as f64 * REFERRAL_BONUS;
    (BASE_RATE + streak_bonus + referral_bonus).min(MAX_RATE)
}
