//! Time sources for the session timer.
//!
//! The timer never reads the system clock directly. It asks a [`Clock`]
//! for the time since an arbitrary epoch, which lets tests drive it with
//! synthetic timestamps instead of real waits.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of "now" as a duration since an arbitrary, fixed epoch.
///
/// Pause/resume arithmetic assumes the value does not move backward.
/// The timer clamps its output when it does.
pub trait Clock {
    fn now(&self) -> Duration;
}

// ============================================================================
// SystemClock
// ============================================================================

/// Monotonic clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

// ============================================================================
// ManualClock
// ============================================================================

/// Hand-driven clock for tests.
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the timer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time to `secs` seconds after the epoch.
    pub fn set_secs(&self, secs: f64) {
        *self.lock() = Duration::from_secs_f64(secs.max(0.0));
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    /// Moves the clock forward by fractional seconds.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Moves the clock backward, stopping at the epoch.
    pub fn rewind(&self, by: Duration) {
        let mut now = self.lock();
        *now = now.saturating_sub(by);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Duration> {
        // A poisoned lock still holds a valid Duration.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}
