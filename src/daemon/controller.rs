//! Session controller.
//!
//! Owns the daemon's [`SessionTimer`] and [`FocusTimer`] and wires them to
//! their collaborators: feedback cues on every state change, a session
//! record when a session ends, and a [`SessionEvent`] stream for observers.
//! At most one of the two runs at a time.
//!
//! Completion is detected here, not in the timer. The first tick that sees
//! `cycle_count >= target_rounds` stops the timer and reports the session;
//! a latch keeps later ticks from reporting it again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::config::{self, ConfigError};
use crate::feedback::FeedbackDispatcher;
use crate::history::{SessionEnd, SessionKind, SessionRecord, SessionRecorder};
use crate::patterns::{self, BreathingPattern};
use crate::types::{FeedbackIntensity, SessionConfig};

use super::clock::{Clock, SystemClock};
use super::focus::{FocusSnapshot, FocusTimer};
use super::timer::{PhaseTransition, SessionSnapshot, SessionTimer};

/// Focus sessions stopped before this much active time are not recorded.
pub const MIN_RECORDED_FOCUS_SECS: f64 = 60.0;

// ============================================================================
// SessionEvent
// ============================================================================

/// Session events for observers of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A session started
    Started {
        pattern_id: String,
        target_rounds: u32,
    },
    /// The timer moved to a new phase
    PhaseChanged(PhaseTransition),
    /// Session paused
    Paused,
    /// Session resumed
    Resumed,
    /// Session stopped by the user
    Stopped {
        /// Rounds completed before stopping
        cycle_count: u32,
    },
    /// Target rounds reached
    Completed {
        cycle_count: u32,
        /// Active session time in seconds
        total_seconds: f64,
    },
    /// A focus countdown started
    FocusStarted { duration_seconds: u32 },
    /// Focus countdown stopped by the user
    FocusStopped { elapsed_seconds: f64 },
    /// Focus countdown ran out
    FocusCompleted { duration_seconds: u32 },
}

/// Last state of a session ended by [`SessionController::stop`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoppedSession {
    Breathing(SessionSnapshot),
    Focus(FocusSnapshot),
}

// ============================================================================
// ControllerError
// ============================================================================

/// Errors returned to callers that misuse the session lifecycle.
///
/// The timer itself treats the same misuse as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("a session is already running")]
    AlreadyRunning,

    #[error("no session is running")]
    NotRunning,

    #[error("the session is already paused")]
    AlreadyPaused,

    #[error("the session is not paused")]
    NotPaused,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// Validates `config` and resolves its pattern from the catalog.
fn resolve_pattern(config: &SessionConfig) -> Result<&'static BreathingPattern, ConfigError> {
    config.validate()?;
    patterns::find_pattern(&config.pattern_id)
        .ok_or_else(|| ConfigError::UnknownPattern(config.pattern_id.clone()))
}

// ============================================================================
// SessionController
// ============================================================================

/// Drives one session at a time, breathing or focus.
pub struct SessionController<C: Clock = SystemClock> {
    timer: SessionTimer<C>,
    focus: FocusTimer<C>,
    config: SessionConfig,
    completion_fired: bool,
    started_at: Option<DateTime<Utc>>,
    feedback: Arc<dyn FeedbackDispatcher>,
    recorder: Arc<dyn SessionRecorder>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController<SystemClock> {
    /// Creates an idle controller on the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        config: SessionConfig,
        feedback: Arc<dyn FeedbackDispatcher>,
        recorder: Arc<dyn SessionRecorder>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, ControllerError> {
        Self::with_clock(config, SystemClock::new(), feedback, recorder, event_tx)
    }
}

impl<C: Clock + Clone> SessionController<C> {
    /// Creates an idle controller reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn with_clock(
        config: SessionConfig,
        clock: C,
        feedback: Arc<dyn FeedbackDispatcher>,
        recorder: Arc<dyn SessionRecorder>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, ControllerError> {
        let pattern = resolve_pattern(&config)?;
        let focus = FocusTimer::with_clock(clock.clone());
        let timer = SessionTimer::with_clock(pattern.clone(), config.target_rounds, clock);

        Ok(Self {
            timer,
            focus,
            config,
            completion_fired: false,
            started_at: None,
            feedback,
            recorder,
            event_tx,
        })
    }
}

impl<C: Clock> SessionController<C> {
    /// Replaces the session configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a session is running or `config` is invalid.
    pub fn configure(&mut self, config: SessionConfig) -> Result<(), ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }
        let pattern = resolve_pattern(&config)?;

        self.timer.set_pattern(pattern.clone());
        self.timer.set_target_rounds(config.target_rounds);
        self.config = config;
        Ok(())
    }

    /// Starts a session with the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a session is already running.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        self.completion_fired = false;
        self.started_at = Some(Utc::now());
        self.timer.start();

        tracing::info!(
            pattern = %self.config.pattern_id,
            rounds = self.config.target_rounds,
            "session started"
        );
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::Started {
            pattern_id: self.config.pattern_id.clone(),
            target_rounds: self.config.target_rounds,
        });
        Ok(())
    }

    /// Pauses the running session.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is running or it is already paused.
    pub fn pause(&mut self) -> Result<(), ControllerError> {
        let paused = match self.active_kind() {
            None => return Err(ControllerError::NotRunning),
            Some(SessionKind::Breathing) => self.timer.pause(),
            Some(SessionKind::Focus) => self.focus.pause(),
        };
        if !paused {
            return Err(ControllerError::AlreadyPaused);
        }

        tracing::info!("session paused");
        self.cue(FeedbackIntensity::Light);
        self.emit(SessionEvent::Paused);
        Ok(())
    }

    /// Resumes the paused session.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is running or it is not paused.
    pub fn resume(&mut self) -> Result<(), ControllerError> {
        let resumed = match self.active_kind() {
            None => return Err(ControllerError::NotRunning),
            Some(SessionKind::Breathing) => self.timer.resume(),
            Some(SessionKind::Focus) => self.focus.resume(),
        };
        if !resumed {
            return Err(ControllerError::NotPaused);
        }

        tracing::info!("session resumed");
        self.cue(FeedbackIntensity::Light);
        self.emit(SessionEvent::Resumed);
        Ok(())
    }

    /// Starts a focus countdown of `minutes`.
    ///
    /// # Errors
    ///
    /// Returns an error if a session is running or `minutes` is out of range.
    pub fn start_focus(&mut self, minutes: u32) -> Result<(), ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }
        config::validate_focus_minutes(minutes)?;

        let duration_seconds = minutes * 60;
        self.started_at = Some(Utc::now());
        self.focus.start(duration_seconds);

        tracing::info!(minutes, "focus started");
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::FocusStarted { duration_seconds });
        Ok(())
    }

    /// Stops the running session and returns its last state.
    ///
    /// A breathing session with at least one completed round, or a focus
    /// session with at least [`MIN_RECORDED_FOCUS_SECS`] of active time, is
    /// reported to the recorder as stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is running.
    pub fn stop(&mut self) -> Result<StoppedSession, ControllerError> {
        match self.active_kind() {
            None => Err(ControllerError::NotRunning),
            Some(SessionKind::Breathing) => Ok(StoppedSession::Breathing(self.stop_breathing())),
            Some(SessionKind::Focus) => Ok(StoppedSession::Focus(self.stop_focus())),
        }
    }

    fn stop_breathing(&mut self) -> SessionSnapshot {
        let last = self.timer.snapshot();
        self.timer.stop();

        tracing::info!(cycles = last.cycle_count, "session stopped");
        if last.cycle_count > 0 {
            self.report_breathing(&last, SessionEnd::Stopped);
        }
        self.started_at = None;
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::Stopped {
            cycle_count: last.cycle_count,
        });
        last
    }

    fn stop_focus(&mut self) -> FocusSnapshot {
        let last = self.focus.snapshot();
        self.focus.stop();

        tracing::info!(seconds = last.elapsed, "focus stopped");
        if last.elapsed >= MIN_RECORDED_FOCUS_SECS {
            self.report_focus(&last, SessionEnd::Stopped);
        }
        self.started_at = None;
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::FocusStopped {
            elapsed_seconds: last.elapsed,
        });
        last
    }

    /// Advances the running timer and handles completion.
    ///
    /// Returns the phase transition that happened on this tick, if any.
    /// Focus countdowns have no phases and always return `None`.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        if self.focus.is_running() {
            if self.focus.tick() {
                self.complete_focus();
            }
            return None;
        }

        let transition = self.timer.tick();
        let target_reached =
            self.timer.is_running() && self.timer.cycle_count() >= self.timer.target_rounds();

        if let Some(t) = transition {
            if !target_reached {
                self.cue(t.feedback);
            }
            self.emit(SessionEvent::PhaseChanged(t));
        }

        if target_reached && !self.completion_fired {
            self.complete();
        }
        transition
    }

    fn complete(&mut self) {
        self.completion_fired = true;

        let last = self.timer.snapshot();
        self.timer.stop();

        tracing::info!(
            cycles = last.cycle_count,
            seconds = last.total_session_time,
            "session completed"
        );
        self.report_breathing(&last, SessionEnd::Completed);
        self.started_at = None;
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::Completed {
            cycle_count: last.cycle_count,
            total_seconds: last.total_session_time,
        });
    }

    fn complete_focus(&mut self) {
        let last = self.focus.snapshot();
        self.focus.stop();

        tracing::info!(seconds = last.duration_seconds, "focus completed");
        self.report_focus(&last, SessionEnd::Completed);
        self.started_at = None;
        self.cue(FeedbackIntensity::Heavy);
        self.emit(SessionEvent::FocusCompleted {
            duration_seconds: last.duration_seconds,
        });
    }

    fn report_breathing(&self, last: &SessionSnapshot, ended_by: SessionEnd) {
        let ended_at = Utc::now();
        let pattern = self.timer.pattern();
        self.save(SessionRecord::new(
            pattern.id.clone(),
            pattern.name.clone(),
            self.started_at.unwrap_or(ended_at),
            ended_at,
            last.total_session_time,
            last.cycle_count,
            ended_by,
        ));
    }

    fn report_focus(&self, last: &FocusSnapshot, ended_by: SessionEnd) {
        let ended_at = Utc::now();
        self.save(SessionRecord::focus(
            self.started_at.unwrap_or(ended_at),
            ended_at,
            last.elapsed,
            ended_by,
        ));
    }

    fn save(&self, record: SessionRecord) {
        if let Err(e) = self.recorder.record(&record) {
            tracing::warn!("failed to record session: {}", e);
        }
    }

    fn cue(&self, intensity: FeedbackIntensity) {
        if !self.config.haptics || !self.feedback.is_enabled() {
            return;
        }
        if let Err(e) = self.feedback.dispatch(intensity) {
            tracing::warn!(intensity = intensity.as_str(), "feedback failed: {}", e);
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("session event dropped, no receiver");
        }
    }

    /// Returns a copy of the breathing timer state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.timer.snapshot()
    }

    pub fn focus_snapshot(&self) -> FocusSnapshot {
        self.focus.snapshot()
    }

    /// Kind of the running session, if any.
    pub fn active_kind(&self) -> Option<SessionKind> {
        if self.timer.is_running() {
            Some(SessionKind::Breathing)
        } else if self.focus.is_running() {
            Some(SessionKind::Focus)
        } else {
            None
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pattern(&self) -> &BreathingPattern {
        self.timer.pattern()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running() || self.focus.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.timer.is_paused() || self.focus.is_paused()
    }
}

// ============================================================================
// Tests
// ============================================================================
