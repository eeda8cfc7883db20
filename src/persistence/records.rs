//! Durable record shapes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rewards::AdRewardEvent;

/// Ledger record key
pub const USER_KEY: &str = "user-storage";
/// Prefix for per-variant leaderboards (`game-highscores/<slug>`)
pub const HIGHSCORES_KEY: &str = "game-highscores";
/// Preferences key
pub const SETTINGS_KEY: &str = "settings";

/// Stored form of the reward ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub balance: f64,
    pub total_earned: f64,
    #[serde(default)]
    pub games_played: u32,
    /// Epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_reward_time: DateTime<Utc>,
    #[serde(default)]
    pub streak: u32,
    /// `YYYY-MM-DD`
    pub last_login_date: NaiveDate,
    #[serde(default)]
    pub referrals: Vec<String>,
    #[serde(default)]
    pub play_time_minutes: u64,
    /// Informational only; recomputed from streak and referrals on load
    #[serde(default)]
    pub reward_rate: f64,
    #[serde(default)]
    pub ad_rewards: Vec<AdRewardEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_record_wire_shape() {
        let raw = json!({
            "balance": 0.25,
            "totalEarned": 0.5,
            "gamesPlayed": 4,
            "lastRewardTime": 1_709_294_400_000_i64,
            "streak": 6,
            "lastLoginDate": "2024-03-01",
            "referrals": ["a", "b"],
            "playTimeMinutes": 42,
            "rewardRate": 0.005,
            "adRewards": [
                { "amount": 0.01, "timestamp": 1_709_294_400_000_i64, "source": "gameplay" }
            ]
        });

        let record: UserRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.streak, 6);
        assert_eq!(record.last_login_date.to_string(), "2024-03-01");
        assert_eq!(record.last_reward_time.timestamp_millis(), 1_709_294_400_000);
        assert_eq!(record.ad_rewards.len(), 1);

        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_user_record_tolerates_missing_optional_fields() {
        let raw = json!({
            "balance": 1.0,
            "totalEarned": 1.0,
            "lastRewardTime": 0,
            "lastLoginDate": "2024-01-01"
        });
        let record: UserRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.games_played, 0);
        assert!(record.referrals.is_empty());
        assert!(record.ad_rewards.is_empty());
    }
}
