//! Periodic deep-scan scheduling.
//!
//! Normal cycles exploit the feed's newest-first ordering and stop at the
//! first fully-seen thread. That ordering is undefined behavior of the
//! source, so every `interval` one cycle widens into a deep scan that
//! walks every thread with activity inside the lookback window.

use chrono::{DateTime, Duration, Utc};

/// How far a single forward cycle looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop at the first thread with nothing new.
    Normal,
    /// Push through fully-seen threads until one is also older than the
    /// horizon.
    Deep { horizon: DateTime<Utc> },
}

/// In-process deep-scan timer. Not persisted: a restart re-arms it, so
/// the first deep scan happens one full interval after startup.
#[derive(Debug)]
pub struct ValidationWindow {
    next_deep_scan_at: DateTime<Utc>,
    interval: Duration,
    lookback: Duration,
}

impl ValidationWindow {
    pub fn new(now: DateTime<Utc>, interval: Duration, lookback: Duration) -> Self {
        Self {
            next_deep_scan_at: now + interval,
            interval,
            lookback,
        }
    }

    /// Pick the mode for a cycle starting now. A deep firing re-arms the
    /// timer, so at most one cycle per interval pays the deep-scan cost.
    pub fn begin_cycle(&mut self, now: DateTime<Utc>) -> ScanMode {
        if now < self.next_deep_scan_at {
            return ScanMode::Normal;
        }
        self.next_deep_scan_at = now + self.interval;
        ScanMode::Deep {
            horizon: now - self.lookback,
        }
    }
}
