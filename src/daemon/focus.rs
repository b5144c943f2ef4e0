//! Focus countdown.
//!
//! A single countdown of a fixed length, ticked by the same scheduler as
//! the breathing timer. Pausing freezes the remaining time. The countdown
//! reports that it has finished on the first tick at or past its end; the
//! caller then stops it.

use std::time::Duration;

use super::clock::{Clock, SystemClock};

// ============================================================================
// FocusSnapshot
// ============================================================================

/// Copy of the countdown state.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSnapshot {
    pub is_running: bool,
    pub is_paused: bool,
    /// Planned length of the countdown
    pub duration_seconds: u32,
    /// Active (non-paused) time so far, never past the planned length
    pub elapsed: f64,
    pub remaining: f64,
    /// Fraction of the countdown done (0.0-1.0)
    pub progress: f64,
}

impl FocusSnapshot {
    /// Remaining whole seconds, rounded up.
    pub fn display_remaining_seconds(&self) -> u32 {
        self.remaining.max(0.0).ceil() as u32
    }
}

// ============================================================================
// FocusTimer
// ============================================================================

/// Countdown with pause-aware timing.
pub struct FocusTimer<C: Clock = SystemClock> {
    clock: C,
    duration_seconds: u32,
    started_at: Duration,
    paused_at: Option<Duration>,
    is_running: bool,
}

impl<C: Clock> FocusTimer<C> {
    /// Creates an idle countdown reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            duration_seconds: 0,
            started_at: Duration::ZERO,
            paused_at: None,
            is_running: false,
        }
    }

    /// Starts counting down from `duration_seconds`, restarting a running
    /// countdown.
    pub fn start(&mut self, duration_seconds: u32) {
        self.duration_seconds = duration_seconds;
        self.started_at = self.clock.now();
        self.paused_at = None;
        self.is_running = true;
    }

    /// Returns false if there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if !self.is_running || self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(self.clock.now());
        true
    }

    /// Returns false if the countdown was not paused.
    pub fn resume(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        // Shift the start so the paused span never counts.
        self.started_at += self.clock.now().saturating_sub(paused_at);
        true
    }

    /// Resets to idle. Safe in any state.
    pub fn stop(&mut self) {
        self.is_running = false;
        self.paused_at = None;
        self.duration_seconds = 0;
        self.started_at = Duration::ZERO;
    }

    /// Returns true once the countdown has run out.
    ///
    /// Always false while idle or paused.
    pub fn tick(&mut self) -> bool {
        if !self.is_running || self.paused_at.is_some() {
            return false;
        }
        self.elapsed() >= f64::from(self.duration_seconds)
    }

    /// Active seconds since start, clamped to the planned length.
    pub fn elapsed(&self) -> f64 {
        if !self.is_running {
            return 0.0;
        }
        let now = self.paused_at.unwrap_or_else(|| self.clock.now());
        now.saturating_sub(self.started_at)
            .as_secs_f64()
            .min(f64::from(self.duration_seconds))
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        let elapsed = self.elapsed();
        let duration = f64::from(self.duration_seconds);
        FocusSnapshot {
            is_running: self.is_running,
            is_paused: self.paused_at.is_some(),
            duration_seconds: self.duration_seconds,
            elapsed,
            remaining: duration - elapsed,
            progress: if duration > 0.0 { elapsed / duration } else { 0.0 },
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
