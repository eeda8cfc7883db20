//! Score → gameplay reward bridge

/// Points per reward threshold
pub const SCORE_THRESHOLD: u64 = 100;
/// Credited once per threshold crossing
pub const GAMEPLAY_REWARD: f64 = 0.01;

/// Fires one gameplay reward whenever a session's score enters a 100-point
/// band it has not been paid for yet.
///
/// Jumping several bands in one update still pays once, and a score that dips
/// and climbs back never re-pays a band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreEventBridge {
    rewarded_band: u64,
}

impl ScoreEventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest band already paid
    pub fn rewarded_band(&self) -> u64 {
        self.rewarded_band
    }

    /// Observe the new cumulative score; returns the amount to credit, if any
    pub fn observe(&mut self, score: u64) -> Option<f64> {
        let band = score / SCORE_THRESHOLD;
        if band > self.rewarded_band {
            self.rewarded_band = band;
            Some(GAMEPLAY_REWARD)
        } else {
            None
        }
    }
}
