//! Session timer for guided breathing.
//!
//! This module provides the phase state machine:
//! - Phase sequencing (Inhale → HoldIn → Exhale → HoldOut → Inhale)
//! - Drift-resistant elapsed time computed from reference timestamps
//! - Pause/resume by shifting those timestamps forward
//! - Round counting against a target
//!
//! The timer is driven from outside: something calls [`SessionTimer::tick`]
//! on a fixed period, and each call performs at most one phase transition.
//! Misuse (pausing an idle session, resuming a running one) is a no-op.

use std::time::Duration;

use crate::patterns::{self, BreathingPattern, PhaseDurations};
use crate::types::{BreathingPhase, FeedbackIntensity};

use super::clock::{Clock, SystemClock};

// ============================================================================
// PhaseTransition
// ============================================================================

/// Describes one phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase that ended
    pub from: BreathingPhase,
    /// Phase that began
    pub to: BreathingPhase,
    /// Completed rounds after this transition
    pub cycle_count: u32,
    /// Feedback hint for the new phase
    pub feedback: FeedbackIntensity,
}

impl PhaseTransition {
    /// Returns true if this transition completed a round.
    pub fn completes_round(&self) -> bool {
        self.to == BreathingPhase::Inhale && self.from != BreathingPhase::Idle
    }
}

// ============================================================================
// SessionSnapshot
// ============================================================================

/// Read-only copy of the timer state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: BreathingPhase,
    /// Progress through the current phase, in `[0, 1]`
    pub progress: f64,
    /// Duration of the current phase in seconds
    pub phase_duration: f64,
    /// Seconds left in the current phase, in `[0, phase_duration]`
    pub phase_time_remaining: f64,
    pub cycle_count: u32,
    pub target_rounds: u32,
    /// Active (non-paused) seconds since the session started
    pub total_session_time: f64,
    pub is_running: bool,
    pub is_paused: bool,
    pub pattern_id: String,
}

impl SessionSnapshot {
    /// Remaining phase time rounded up to whole seconds, for display.
    pub fn display_remaining_seconds(&self) -> u32 {
        self.phase_time_remaining.ceil() as u32
    }

    /// Returns true once the session goal has been met.
    pub fn target_reached(&self) -> bool {
        self.is_running && self.cycle_count >= self.target_rounds
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Mutable state of the single active session.
///
/// Invariant: `is_paused` implies `is_running`.
#[derive(Debug, Clone)]
struct SessionState {
    phase: BreathingPhase,
    phase_started_at: Duration,
    session_started_at: Duration,
    paused_at: Option<Duration>,
    cycle_count: u32,
    target_rounds: u32,
    is_running: bool,
    is_paused: bool,
    progress: f64,
    phase_duration: f64,
    phase_time_remaining: f64,
    total_session_time: f64,
    pattern: BreathingPattern,
    durations: PhaseDurations,
}

impl SessionState {
    fn new(pattern: BreathingPattern, target_rounds: u32) -> Self {
        let durations = pattern.durations();
        Self {
            phase: BreathingPhase::Idle,
            phase_started_at: Duration::ZERO,
            session_started_at: Duration::ZERO,
            paused_at: None,
            cycle_count: 0,
            target_rounds,
            is_running: false,
            is_paused: false,
            progress: 0.0,
            phase_duration: 0.0,
            phase_time_remaining: 0.0,
            total_session_time: 0.0,
            pattern,
            durations,
        }
    }
}

/// Signed seconds from `start` to `now`; negative if the clock went back.
fn seconds_between(start: Duration, now: Duration) -> f64 {
    now.as_secs_f64() - start.as_secs_f64()
}

// ============================================================================
// SessionTimer
// ============================================================================

/// Phase state machine for one breathing session.
pub struct SessionTimer<C: Clock = SystemClock> {
    clock: C,
    state: SessionState,
}

impl SessionTimer<SystemClock> {
    /// Creates an idle timer on the system clock.
    pub fn new(pattern: BreathingPattern, target_rounds: u32) -> Self {
        Self::with_clock(pattern, target_rounds, SystemClock::new())
    }
}

impl Default for SessionTimer<SystemClock> {
    fn default() -> Self {
        Self::new(
            patterns::default_pattern().clone(),
            patterns::DEFAULT_TARGET_ROUNDS,
        )
    }
}

impl<C: Clock> SessionTimer<C> {
    /// Creates an idle timer reading time from `clock`.
    pub fn with_clock(pattern: BreathingPattern, target_rounds: u32, clock: C) -> Self {
        Self {
            clock,
            state: SessionState::new(pattern, target_rounds),
        }
    }

    /// Starts the session in `Inhale`.
    ///
    /// Calling this on a running session restarts it from scratch.
    pub fn start(&mut self) -> PhaseTransition {
        let now = self.clock.now();
        let state = &mut self.state;

        state.is_running = true;
        state.is_paused = false;
        state.paused_at = None;
        state.cycle_count = 0;
        state.total_session_time = 0.0;
        state.session_started_at = now;
        state.phase = BreathingPhase::Idle;

        self.transition(now)
    }

    /// Pauses a running session. Returns false if there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running || self.state.is_paused {
            return false;
        }
        self.state.is_paused = true;
        self.state.paused_at = Some(self.clock.now());
        true
    }

    /// Resumes a paused session. Returns false if it was not paused.
    ///
    /// Both reference timestamps move forward by the paused duration, so
    /// elapsed time stays `now - start` and paused time never counts.
    pub fn resume(&mut self) -> bool {
        if !self.state.is_running || !self.state.is_paused {
            return false;
        }
        let now = self.clock.now();
        let paused_at = self.state.paused_at.take().unwrap_or(now);
        let pause_duration = now.saturating_sub(paused_at);

        self.state.phase_started_at += pause_duration;
        self.state.session_started_at += pause_duration;
        self.state.is_paused = false;
        true
    }

    /// Stops the session and resets it to idle. Safe in any state.
    pub fn stop(&mut self) {
        let state = &mut self.state;
        state.is_running = false;
        state.is_paused = false;
        state.paused_at = None;
        state.phase = BreathingPhase::Idle;
        state.cycle_count = 0;
        state.progress = 0.0;
        state.phase_duration = 0.0;
        state.phase_time_remaining = 0.0;
        state.total_session_time = 0.0;
    }

    /// Samples the clock and advances the phase when it has run out.
    ///
    /// Does nothing while idle or paused. Performs at most one transition
    /// per call, even if several phases would have elapsed.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        if !self.state.is_running || self.state.is_paused {
            return None;
        }

        let now = self.clock.now();
        let state = &mut self.state;

        let elapsed = seconds_between(state.phase_started_at, now);
        let duration = state.durations.get(state.phase);
        let remaining = (duration - elapsed).clamp(0.0, duration);

        state.phase_time_remaining = remaining;
        state.progress = if duration > 0.0 {
            (elapsed / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        state.total_session_time = seconds_between(state.session_started_at, now).max(0.0);

        if remaining <= 0.0 {
            let transition = self.transition(now);
            tracing::debug!(
                from = %transition.from,
                to = %transition.to,
                cycles = transition.cycle_count,
                "phase transition"
            );
            Some(transition)
        } else {
            None
        }
    }

    fn transition(&mut self, now: Duration) -> PhaseTransition {
        let state = &mut self.state;
        let from = state.phase;
        let to = from.next(&state.durations);

        if to == BreathingPhase::Inhale && from != BreathingPhase::Idle {
            state.cycle_count += 1;
        }

        let duration = state.durations.get(to);
        state.phase = to;
        state.phase_started_at = now;
        state.progress = 0.0;
        state.phase_duration = duration;
        state.phase_time_remaining = duration;

        PhaseTransition {
            from,
            to,
            cycle_count: state.cycle_count,
            feedback: FeedbackIntensity::for_phase(to),
        }
    }

    /// Replaces the pattern. Ignored while a session is running.
    pub fn set_pattern(&mut self, pattern: BreathingPattern) -> bool {
        if self.state.is_running {
            return false;
        }
        self.state.durations = pattern.durations();
        self.state.pattern = pattern;
        true
    }

    /// Replaces the target round count. Ignored while a session is running.
    pub fn set_target_rounds(&mut self, rounds: u32) -> bool {
        if self.state.is_running {
            return false;
        }
        self.state.target_rounds = rounds;
        true
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = &self.state;
        SessionSnapshot {
            phase: state.phase,
            progress: state.progress,
            phase_duration: state.phase_duration,
            phase_time_remaining: state.phase_time_remaining,
            cycle_count: state.cycle_count,
            target_rounds: state.target_rounds,
            total_session_time: state.total_session_time,
            is_running: state.is_running,
            is_paused: state.is_paused,
            pattern_id: state.pattern.id.clone(),
        }
    }

    pub fn phase(&self) -> BreathingPhase {
        self.state.phase
    }

    pub fn cycle_count(&self) -> u32 {
        self.state.cycle_count
    }

    pub fn target_rounds(&self) -> u32 {
        self.state.target_rounds
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.state.pattern
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

// ============================================================================
// Tests
// ============================================================================
