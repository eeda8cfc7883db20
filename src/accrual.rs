//! Passive time-based accrual
//!
//! `PassiveAccrual` holds the per-mount state (the play-time watermark) and
//! does the arithmetic against the hub's clock, so tests can drive it with a
//! `ManualClock`. `spawn_accrual` wraps it in a background thread that ticks
//! on a fixed period until cancelled.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::rewards::{AccrualCredit, RewardHub, StreakChange};

/// Accrual interval (and default tick period)
pub const REWARD_INTERVAL_SECS: i64 = 60;

/// Outcome of one accrual tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccrualReport {
    pub credit: Option<AccrualCredit>,
    pub minutes_played: u64,
}

#[derive(Debug)]
pub struct PassiveAccrual {
    hub: RewardHub,
    interval: Duration,
    /// Presence watermark, separate from the ledger's last reward time
    last_observed: DateTime<Utc>,
}

impl PassiveAccrual {
    pub fn new(hub: RewardHub) -> Self {
        let last_observed = hub.now();
        Self {
            hub,
            interval: Duration::seconds(REWARD_INTERVAL_SECS),
            last_observed,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mount: refresh the daily streak once, then tick eagerly
    pub fn start(&mut self) -> (StreakChange, AccrualReport) {
        let streak = self.hub.refresh_streak();
        let report = self.tick();
        (streak, report)
    }

    pub fn tick(&mut self) -> AccrualReport {
        let credit = self.hub.accrue_time(self.interval);
        if let Some(c) = credit {
            log::info!(
                "Passive accrual: {} interval(s), +{:.4}",
                c.intervals,
                c.amount
            );
        }

        let now = self.hub.now();
        let elapsed_secs = (now - self.last_observed).num_seconds().max(0);
        let minutes = elapsed_secs / 60;
        if minutes > 0 {
            // Keep the sub-minute remainder for the next tick
            self.last_observed += Duration::minutes(minutes);
            self.hub.add_play_time(minutes as u64);
        }

        AccrualReport {
            credit,
            minutes_played: minutes as u64,
        }
    }
}

/// Handle to a running accrual thread. Dropping it cancels the thread.
#[derive(Debug)]
pub struct AccrualHandle {
    cancel_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AccrualHandle {
    /// Cancel and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and wakes the loop
        self.cancel_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for AccrualHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the accrual loop on its own thread, ticking every `period`
pub fn spawn_accrual(hub: RewardHub, period: StdDuration) -> AccrualHandle {
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

    let thread = thread::spawn(move || {
        let mut accrual = PassiveAccrual::new(hub);
        accrual.start();

        // A message or a dropped sender both mean stop
        while let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(period) {
            accrual.tick();
        }
        log::debug!("Accrual runner stopped");
    });

    AccrualHandle {
        cancel_tx: Some(cancel_tx),
        thread: Some(thread),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Clock, ManualClock};
    use crate::rewards::RewardLedger;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, RewardHub) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let hub = RewardHub::new(RewardLedger::new(start), clock.clone());
        (clock, hub)
    }

    #[test]
    fn test_catch_up_after_185_seconds() {
        let (clock, hub) = setup();
        let mut accrual = PassiveAccrual::new(hub.clone());
        let rate = hub.snapshot().reward_rate();

        clock.advance(Duration::seconds(185));
        let report = accrual.tick();

        let credit = report.credit.unwrap();
        assert_eq!(credit.intervals, 3);
        assert!((credit.amount - 3.0 * rate).abs() < 1e-12);
        assert_eq!(hub.snapshot().last_reward_time(), clock.now());
    }

    #[test]
    fn test_repeated_ticks_never_double_credit() {
        let (clock, hub) = setup();
        let mut accrual = PassiveAccrual::new(hub.clone());

        clock.advance(Duration::seconds(60));
        assert!(accrual.tick().credit.is_some());
        assert!(accrual.tick().credit.is_none());
        clock.advance(Duration::seconds(30));
        assert!(accrual.tick().credit.is_none());

        assert!((hub.snapshot().balance() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_play_time_keeps_sub_minute_remainder() {
        let (clock, hub) = setup();
        let mut accrual = PassiveAccrual::new(hub.clone());

        clock.advance(Duration::seconds(90));
        assert_eq!(accrual.tick().minutes_played, 1);
        clock.advance(Duration::seconds(30));
        // 30s left over + 30s new = one more whole minute
        assert_eq!(accrual.tick().minutes_played, 1);
        clock.advance(Duration::seconds(59));
        assert_eq!(accrual.tick().minutes_played, 0);

        assert_eq!(hub.snapshot().play_time_minutes(), 2);
    }

    #[test]
    fn test_clock_rewind_credits_nothing() {
        let (clock, hub) = setup();
        let mut accrual = PassiveAccrual::new(hub.clone());

        clock.advance(Duration::seconds(-600));
        let report = accrual.tick();
        assert!(report.credit.is_none());
        assert_eq!(report.minutes_played, 0);
        assert_eq!(hub.snapshot().balance(), 0.0);
    }

    #[test]
    fn test_start_refreshes_streak_once() {
        let (clock, hub) = setup();
        clock.advance(Duration::days(1));

        let mut accrual = PassiveAccrual::new(hub.clone());
        let (streak, report) = accrual.start();
        assert_eq!(streak, StreakChange::Extended(1));
        // A full day since the last reward pays 1440 intervals at once
        assert_eq!(report.credit.unwrap().intervals, 1440);

        clock.advance(Duration::seconds(60));
        accrual.tick();
        assert_eq!(hub.snapshot().streak_days(), 1);
    }

    #[test]
    fn test_background_runner_stops_on_request() {
        let (clock, hub) = setup();
        clock.advance(Duration::seconds(120));

        let handle = spawn_accrual(hub.clone(), StdDuration::from_millis(5));
        std::thread::sleep(StdDuration::from_millis(30));
        handle.stop();

        // The eager startup tick paid the two elapsed intervals exactly once
        let ledger = hub.snapshot();
        assert!((ledger.balance() - 0.004).abs() < 1e-12);
        assert_eq!(ledger.history().count(), 1);
    }
}
