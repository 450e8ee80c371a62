//! Wall-clock time sources for message id generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of whole-second wall-clock readings.
pub trait Clock: Send + Sync {
    /// Current time in whole seconds since the UNIX epoch.
    fn now_secs(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // ---
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs(),
            Err(_err) => {
                crate::log_error!("system clock is set before the UNIX epoch: {_err}");
                0
            }
        }
    }
}

/// Manually driven clock.
///
/// Useful for tests and simulations that need several ids to land in the
/// same second, or need time to move backwards.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    // ---
    /// Clock frozen at `secs` until moved.
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    /// Jump to `secs`, forwards or backwards.
    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // ---
        assert!(SystemClock.now_secs() > 1_577_836_800);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        // ---
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_secs(), 100);

        clock.advance(5);
        assert_eq!(clock.now_secs(), 105);

        clock.set(42);
        assert_eq!(clock.now_secs(), 42);
    }
}
