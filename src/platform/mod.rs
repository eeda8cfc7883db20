//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Wall-clock time (injectable so tests can drive virtual time)

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};
