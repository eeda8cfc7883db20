//! Monetary ledger: balance, accrual bookkeeping, streak and referrals
//!
//! `RewardLedger` is a plain owned value. Cross-thread access goes through
//! [`super::RewardHub`], which serializes every mutation behind one lock.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::rate::reward_rate;
use crate::persistence::UserRecord;

/// Number of reward events kept in history
pub const HISTORY_LIMIT: usize = 10;

/// Where a credit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardSource {
    /// Score threshold crossed inside a session
    Gameplay,
    /// Passive accrual interval elapsed
    Time,
    /// Referral payout
    Referral,
}

impl RewardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardSource::Gameplay => "gameplay",
            RewardSource::Time => "time",
            RewardSource::Referral => "referral",
        }
    }
}

/// One credited amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRewardEvent {
    pub amount: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub source: RewardSource,
}

/// What `refresh_streak` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Same calendar day (or the clock went backwards)
    Unchanged,
    /// Consecutive day
    Extended(u32),
    /// Gap of more than one day
    Reset,
}

/// Result of a catch-up accrual
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualCredit {
    /// Whole intervals paid
    pub intervals: i64,
    pub amount: f64,
}

/// Passive earnings at the current rate, assuming continuous presence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedEarnings {
    pub hourly: f64,
    pub daily: f64,
    /// 30-day month
    pub monthly: f64,
}

impl ProjectedEarnings {
    /// Project a per-minute rate
    pub fn from_rate(per_minute: f64) -> Self {
        let hourly = per_minute * 60.0;
        let daily = hourly * 24.0;
        Self {
            hourly,
            daily,
            monthly: daily * 30.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewardLedger {
    balance: f64,
    total_earned: f64,
    reward_rate: f64,
    last_reward_time: DateTime<Utc>,
    streak_days: u32,
    last_login_date: NaiveDate,
    referrals: Vec<String>,
    play_time_minutes: u64,
    games_played: u32,
    history: VecDeque<AdRewardEvent>,
}

impl RewardLedger {
    /// Fresh ledger for a first-time user
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            balance: 0.0,
            total_earned: 0.0,
            reward_rate: reward_rate(0, 0),
            last_reward_time: now,
            streak_days: 0,
            last_login_date: now.date_naive(),
            referrals: Vec::new(),
            play_time_minutes: 0,
            games_played: 0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Restore from a stored record; the stored rate is not trusted
    pub fn from_record(record: UserRecord) -> Self {
        let mut referrals: Vec<String> = Vec::with_capacity(record.referrals.len());
        for id in record.referrals {
            if !referrals.contains(&id) {
                referrals.push(id);
            }
        }

        let skip = record.ad_rewards.len().saturating_sub(HISTORY_LIMIT);
        let history = record.ad_rewards.into_iter().skip(skip).collect();

        let mut ledger = Self {
            balance: record.balance.max(0.0),
            total_earned: record.total_earned.max(0.0),
            reward_rate: 0.0,
            last_reward_time: record.last_reward_time,
            streak_days: record.streak,
            last_login_date: record.last_login_date,
            referrals,
            play_time_minutes: record.play_time_minutes,
            games_played: record.games_played,
            history,
        };
        ledger.recompute_rate();
        ledger
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            balance: self.balance,
            total_earned: self.total_earned,
            games_played: self.games_played,
            last_reward_time: self.last_reward_time,
            streak: self.streak_days,
            last_login_date: self.last_login_date,
            referrals: self.referrals.clone(),
            play_time_minutes: self.play_time_minutes,
            reward_rate: self.reward_rate,
            ad_rewards: self.history.iter().cloned().collect(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }

    pub fn reward_rate(&self) -> f64 {
        self.reward_rate
    }

    pub fn projected_earnings(&self) -> ProjectedEarnings {
        ProjectedEarnings::from_rate(self.reward_rate)
    }

    pub fn last_reward_time(&self) -> DateTime<Utc> {
        self.last_reward_time
    }

    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    pub fn last_login_date(&self) -> NaiveDate {
        self.last_login_date
    }

    pub fn referrals(&self) -> &[String] {
        &self.referrals
    }

    pub fn play_time_minutes(&self) -> u64 {
        self.play_time_minutes
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    /// Recent reward events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AdRewardEvent> {
        self.history.iter()
    }

    /// Add `amount` to balance and lifetime earnings and record the event.
    ///
    /// Non-positive (or NaN) amounts are ignored. Returns whether anything
    /// was credited.
    pub fn credit(&mut self, amount: f64, source: RewardSource, at: DateTime<Utc>) -> bool {
        if !(amount > 0.0) {
            return false;
        }

        self.balance += amount;
        self.total_earned += amount;
        self.history.push_back(AdRewardEvent {
            amount,
            timestamp: at,
            source,
        });
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }

        log::debug!(
            "Credited {:.4} ({}) -> balance {:.4}",
            amount,
            source.as_str(),
            self.balance
        );
        true
    }

    pub fn touch_reward_time(&mut self, now: DateTime<Utc>) {
        self.last_reward_time = now;
    }

    /// Advance the daily streak against `now`'s calendar date.
    ///
    /// Idempotent within one calendar day.
    pub fn refresh_streak(&mut self, now: DateTime<Utc>) -> StreakChange {
        let today = now.date_naive();
        let day_diff = (today - self.last_login_date).num_days();

        let change = match day_diff {
            1 => {
                self.streak_days += 1;
                StreakChange::Extended(self.streak_days)
            }
            d if d > 1 => {
                self.streak_days = 0;
                StreakChange::Reset
            }
            _ => StreakChange::Unchanged,
        };

        self.last_login_date = today;
        self.recompute_rate();
        change
    }

    /// Register a referral id. Duplicate ids are ignored.
    pub fn add_referral(&mut self, id: &str) -> bool {
        if self.referrals.iter().any(|r| r == id) {
            return false;
        }
        self.referrals.push(id.to_string());
        self.recompute_rate();
        true
    }

    pub fn add_play_time(&mut self, minutes: u64) {
        self.play_time_minutes = self.play_time_minutes.saturating_add(minutes);
    }

    pub fn record_game_played(&mut self) {
        self.games_played = self.games_played.saturating_add(1);
    }

    /// Pay every whole `interval` elapsed since the last time credit.
    ///
    /// A clock that moved backwards counts as zero elapsed time.
    pub fn accrue_time(&mut self, now: DateTime<Utc>, interval: Duration) -> Option<AccrualCredit> {
        let interval_ms = interval.num_milliseconds();
        if interval_ms <= 0 {
            return None;
        }

        let elapsed_ms = (now - self.last_reward_time).num_milliseconds().max(0);
        let intervals = elapsed_ms / interval_ms;
        if intervals < 1 {
            return None;
        }

        let amount = self.reward_rate * intervals as f64;
        self.credit(amount, RewardSource::Time, now);
        self.touch_reward_time(now);
        Some(AccrualCredit { intervals, amount })
    }

    fn recompute_rate(&mut self) {
        self.reward_rate = reward_rate(self.streak_days, self.referrals.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_credit_updates_balance_and_history() {
        let now = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(now);
        assert!(ledger.credit(0.01, RewardSource::Gameplay, now));
        assert!(ledger.credit(0.02, RewardSource::Time, now));

        assert!((ledger.balance() - 0.03).abs() < 1e-12);
        assert!((ledger.total_earned() - 0.03).abs() < 1e-12);
        let sources: Vec<_> = ledger.history().map(|e| e.source).collect();
        assert_eq!(sources, vec![RewardSource::Gameplay, RewardSource::Time]);
    }

    #[test]
    fn test_credit_ignores_non_positive_amounts() {
        let now = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(now);
        assert!(!ledger.credit(0.0, RewardSource::Gameplay, now));
        assert!(!ledger.credit(-1.0, RewardSource::Gameplay, now));
        assert!(!ledger.credit(f64::NAN, RewardSource::Gameplay, now));
        assert_eq!(ledger.balance(), 0.0);
        assert_eq!(ledger.history().count(), 0);
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let now = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(now);
        for i in 1..=12 {
            ledger.credit(i as f64, RewardSource::Gameplay, now);
        }

        let amounts: Vec<f64> = ledger.history().map(|e| e.amount).collect();
        assert_eq!(amounts.len(), HISTORY_LIMIT);
        assert_eq!(amounts.first(), Some(&3.0));
        assert_eq!(amounts.last(), Some(&12.0));
        assert_eq!(ledger.total_earned(), (1..=12).sum::<i32>() as f64);
    }

    #[test]
    fn test_streak_extends_on_consecutive_day() {
        let mut ledger = RewardLedger::new(noon(2024, 3, 1));
        // Late evening to early morning is still one calendar day
        let next = Utc.with_ymd_and_hms(2024, 3, 2, 0, 5, 0).unwrap();
        assert_eq!(ledger.refresh_streak(next), StreakChange::Extended(1));
        assert_eq!(ledger.streak_days(), 1);
        assert_eq!(ledger.last_login_date(), next.date_naive());
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let mut ledger = RewardLedger::new(noon(2024, 3, 1));
        ledger.refresh_streak(noon(2024, 3, 2));
        ledger.refresh_streak(noon(2024, 3, 3));
        assert_eq!(ledger.streak_days(), 2);

        assert_eq!(ledger.refresh_streak(noon(2024, 3, 6)), StreakChange::Reset);
        assert_eq!(ledger.streak_days(), 0);
    }

    #[test]
    fn test_streak_refresh_idempotent_same_day() {
        let mut ledger = RewardLedger::new(noon(2024, 3, 1));
        for d in 2..=6 {
            ledger.refresh_streak(noon(2024, 3, d));
        }
        let streak = ledger.streak_days();
        let rate = ledger.reward_rate();

        let later = Utc.with_ymd_and_hms(2024, 3, 6, 23, 59, 0).unwrap();
        assert_eq!(ledger.refresh_streak(later), StreakChange::Unchanged);
        assert_eq!(ledger.refresh_streak(later), StreakChange::Unchanged);
        assert_eq!(ledger.streak_days(), streak);
        assert_eq!(ledger.reward_rate(), rate);
    }

    #[test]
    fn test_streak_bonus_raises_rate() {
        let mut ledger = RewardLedger::new(noon(2024, 3, 1));
        for d in 2..=6 {
            ledger.refresh_streak(noon(2024, 3, d));
        }
        assert_eq!(ledger.streak_days(), 5);
        assert!((ledger.reward_rate() - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_referrals_are_a_set() {
        let mut ledger = RewardLedger::new(noon(2024, 3, 1));
        assert!(ledger.add_referral("friend-1"));
        assert!(!ledger.add_referral("friend-1"));
        assert!(ledger.add_referral("friend-2"));

        assert_eq!(ledger.referrals().len(), 2);
        assert!((ledger.reward_rate() - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_accrue_time_catches_up_whole_intervals() {
        let start = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(start);
        let now = start + Duration::seconds(185);

        let credit = ledger.accrue_time(now, Duration::seconds(60)).unwrap();
        assert_eq!(credit.intervals, 3);
        assert!((credit.amount - 3.0 * ledger.reward_rate()).abs() < 1e-12);
        assert_eq!(ledger.last_reward_time(), now);
        assert!((ledger.balance() - 0.006).abs() < 1e-12);
    }

    #[test]
    fn test_accrue_time_below_interval_is_noop() {
        let start = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(start);
        assert!(
            ledger
                .accrue_time(start + Duration::seconds(59), Duration::seconds(60))
                .is_none()
        );
        assert_eq!(ledger.last_reward_time(), start);
    }

    #[test]
    fn test_accrue_time_clock_rewind_credits_nothing() {
        let start = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(start);
        assert!(
            ledger
                .accrue_time(start - Duration::hours(2), Duration::seconds(60))
                .is_none()
        );
        assert_eq!(ledger.balance(), 0.0);
    }

    #[test]
    fn test_record_restores_and_recomputes_rate() {
        let now = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(now);
        ledger.add_referral("a");
        ledger.credit(0.5, RewardSource::Time, now);

        let mut record = ledger.to_record();
        record.reward_rate = 0.9;
        record.referrals.push("a".to_string());

        let restored = RewardLedger::from_record(record);
        assert_eq!(restored.referrals(), &["a".to_string()]);
        assert!((restored.reward_rate() - 0.003).abs() < 1e-12);
        assert_eq!(restored.balance(), 0.5);
        assert_eq!(restored.history().count(), 1);
    }

    #[test]
    fn test_projected_earnings_follow_rate() {
        let now = noon(2024, 3, 1);
        let mut ledger = RewardLedger::new(now);
        let base = ledger.projected_earnings();
        assert!((base.hourly - 0.12).abs() < 1e-12);
        assert!((base.daily - 2.88).abs() < 1e-9);
        assert!((base.monthly - 86.4).abs() < 1e-9);

        ledger.add_referral("a");
        assert!(ledger.projected_earnings().hourly > base.hourly);
    }
}
