//! Core data types for Breath Coach.
//!
//! This module defines the data structures used for:
//! - Breathing phases and their transition table
//! - Feedback intensity hints sent on phase changes
//! - Session configuration with validation
//! - Focus countdown limits
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigError};
use crate::daemon::focus::FocusSnapshot;
use crate::daemon::timer::SessionSnapshot;
use crate::history::SessionKind;
use crate::patterns::{PhaseDurations, DEFAULT_PATTERN_ID, DEFAULT_TARGET_ROUNDS};

/// Smallest accepted target round count.
pub const MIN_TARGET_ROUNDS: u32 = 1;

/// Largest accepted target round count.
pub const MAX_TARGET_ROUNDS: u32 = 99;

/// Shortest focus countdown in minutes.
pub const MIN_FOCUS_MINUTES: u32 = 1;

/// Longest focus countdown in minutes (one day minus a minute).
pub const MAX_FOCUS_MINUTES: u32 = 1439;

pub const DEFAULT_FOCUS_MINUTES: u32 = 30;

/// Countdown lengths offered by `focus presets`.
pub const FOCUS_PRESET_MINUTES: [u32; 4] = [5, 15, 30, 45];

// ============================================================================
// BreathingPhase
// ============================================================================

/// Represents the current phase of a breathing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathingPhase {
    /// No session is running
    Idle,
    /// Breathing in
    Inhale,
    /// Holding after the inhale
    HoldIn,
    /// Breathing out
    Exhale,
    /// Holding after the exhale
    HoldOut,
}

impl BreathingPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreathingPhase::Idle => "idle",
            BreathingPhase::Inhale => "inhale",
            BreathingPhase::HoldIn => "hold_in",
            BreathingPhase::Exhale => "exhale",
            BreathingPhase::HoldOut => "hold_out",
        }
    }

    /// Returns true for every phase except `Idle`.
    pub fn is_active(&self) -> bool {
        !matches!(self, BreathingPhase::Idle)
    }

    /// Index of this phase in a [`PhaseDurations`] table.
    pub(crate) fn slot(&self) -> Option<usize> {
        match self {
            BreathingPhase::Idle => None,
            BreathingPhase::Inhale => Some(0),
            BreathingPhase::HoldIn => Some(1),
            BreathingPhase::Exhale => Some(2),
            BreathingPhase::HoldOut => Some(3),
        }
    }

    /// Returns the phase that follows this one.
    ///
    /// Hold phases with a zero duration are skipped.
    pub fn next(&self, durations: &PhaseDurations) -> BreathingPhase {
        match self {
            BreathingPhase::Idle => BreathingPhase::Inhale,
            BreathingPhase::Inhale => {
                if durations.get(BreathingPhase::HoldIn) > 0.0 {
                    BreathingPhase::HoldIn
                } else {
                    BreathingPhase::Exhale
                }
            }
            BreathingPhase::HoldIn => BreathingPhase::Exhale,
            BreathingPhase::Exhale => {
                if durations.get(BreathingPhase::HoldOut) > 0.0 {
                    BreathingPhase::HoldOut
                } else {
                    BreathingPhase::Inhale
                }
            }
            BreathingPhase::HoldOut => BreathingPhase::Inhale,
        }
    }
}

impl Default for BreathingPhase {
    fn default() -> Self {
        BreathingPhase::Idle
    }
}

impl std::fmt::Display for BreathingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FeedbackIntensity
// ============================================================================

/// Strength hint for haptic/audio feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackIntensity {
    Light,
    Medium,
    Heavy,
}

impl FeedbackIntensity {
    /// Intensity used when entering `phase`.
    pub fn for_phase(phase: BreathingPhase) -> Self {
        if phase == BreathingPhase::Inhale {
            FeedbackIntensity::Heavy
        } else {
            FeedbackIntensity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackIntensity::Light => "light",
            FeedbackIntensity::Medium => "medium",
            FeedbackIntensity::Heavy => "heavy",
        }
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Configuration for a single breathing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Catalog identifier of the pattern to breathe
    pub pattern_id: String,
    /// Number of rounds that completes the session (1-99)
    pub target_rounds: u32,
    /// Whether haptic feedback is dispatched on transitions
    pub haptics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pattern_id: DEFAULT_PATTERN_ID.to_string(),
            target_rounds: DEFAULT_TARGET_ROUNDS,
            haptics: true,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with the specified pattern.
    pub fn with_pattern(mut self, pattern_id: impl Into<String>) -> Self {
        self.pattern_id = pattern_id.into();
        self
    }

    /// Creates a new configuration with the specified target rounds.
    pub fn with_target_rounds(mut self, rounds: u32) -> Self {
        self.target_rounds = rounds;
        self
    }

    /// Creates a new configuration with haptics switched on or off.
    pub fn with_haptics(mut self, haptics: bool) -> Self {
        self.haptics = haptics;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TARGET_ROUNDS..=MAX_TARGET_ROUNDS).contains(&self.target_rounds) {
            return Err(ConfigError::TargetRoundsOutOfRange(self.target_rounds));
        }
        config::ensure_known_pattern(&self.pattern_id)
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the start command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartParams {
    /// Pattern identifier
    #[serde(rename = "patternId", skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// Target round count
    #[serde(rename = "targetRounds", skip_serializing_if = "Option::is_none")]
    pub target_rounds: Option<u32>,
    /// Haptic feedback flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haptics: Option<bool>,
}

impl StartParams {
    /// Overlays these parameters on `base`.
    pub fn apply_to(&self, base: &SessionConfig) -> SessionConfig {
        let mut config = base.clone();
        if let Some(pattern_id) = &self.pattern_id {
            config.pattern_id = pattern_id.clone();
        }
        if let Some(rounds) = self.target_rounds {
            config.target_rounds = rounds;
        }
        if let Some(haptics) = self.haptics {
            config.haptics = haptics;
        }
        config
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a new breathing session
    Start {
        #[serde(flatten)]
        params: StartParams,
    },
    /// Start a focus countdown
    Focus {
        /// Countdown length; the daemon default when absent
        #[serde(skip_serializing_if = "Option::is_none")]
        minutes: Option<u32>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Stop the session
    Stop,
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Whether the session is paused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// Progress through the current phase (0.0-1.0)
    #[serde(rename = "phaseProgress", skip_serializing_if = "Option::is_none")]
    pub phase_progress: Option<f64>,
    /// Whole seconds left in the current phase, rounded up
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Completed rounds
    #[serde(rename = "cycleCount", skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u32>,
    /// Session goal
    #[serde(rename = "targetRounds", skip_serializing_if = "Option::is_none")]
    pub target_rounds: Option<u32>,
    /// Active (non-paused) session time in seconds
    #[serde(rename = "totalSeconds", skip_serializing_if = "Option::is_none")]
    pub total_seconds: Option<f64>,
    /// Active pattern
    #[serde(rename = "patternId", skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// Session kind ("breathing" or "focus")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Planned focus countdown length
    #[serde(rename = "durationSeconds", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl ResponseData {
    /// Creates response data from a session snapshot.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: Some(snapshot.phase.as_str().to_string()),
            paused: Some(snapshot.is_paused),
            phase_progress: Some(snapshot.progress),
            remaining_seconds: Some(snapshot.display_remaining_seconds()),
            cycle_count: Some(snapshot.cycle_count),
            target_rounds: Some(snapshot.target_rounds),
            total_seconds: Some(snapshot.total_session_time),
            pattern_id: Some(snapshot.pattern_id.clone()),
            kind: Some(SessionKind::Breathing.as_str().to_string()),
            duration_seconds: None,
        }
    }

    /// Creates response data from a focus countdown snapshot.
    ///
    /// `remainingSeconds` counts down to the end of the whole countdown.
    pub fn from_focus(snapshot: &FocusSnapshot) -> Self {
        let phase = if snapshot.is_running { "focus" } else { "idle" };
        Self {
            phase: Some(phase.to_string()),
            paused: Some(snapshot.is_paused),
            phase_progress: Some(snapshot.progress),
            remaining_seconds: Some(snapshot.display_remaining_seconds()),
            total_seconds: Some(snapshot.elapsed),
            kind: Some(SessionKind::Focus.as_str().to_string()),
            duration_seconds: Some(snapshot.duration_seconds),
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
