//! Injectable wall-clock source.
//!
//! Every time read in the session layer goes through `Clock` so tests can
//! simulate token expiry without real delay.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and previews.
///
/// Shared via `Arc`, so a test can keep a handle and advance time while a
/// `SessionManager` holds the same clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    epoch_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(epoch_secs: i64) -> Arc<Self> {
        Arc::new(Self {
            epoch_secs: AtomicI64::new(epoch_secs),
        })
    }

    pub fn advance(&self, secs: i64) {
        self.epoch_secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, epoch_secs: i64) {
        self.epoch_secs.store(epoch_secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.epoch_secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now().timestamp(), 1_000);
        clock.advance(60);
        assert_eq!(clock.now().timestamp(), 1_060);
        clock.set(0);
        assert_eq!(clock.now().timestamp(), 0);
    }

    #[test]
    fn test_system_clock_is_sane() {
        // 2020-01-01 as a lower bound
        assert!(SystemClock.now().timestamp() > 1_577_836_800);
    }
}
