//! Breath Coach Library
//!
//! This library provides the core functionality for the Breath Coach CLI.
//! It includes:
//! - Breathing pattern catalog
//! - Session timer and controller with pause-aware phase timing
//! - Focus countdown timer
//! - IPC server/client for daemon-CLI communication
//! - Feedback cue dispatch
//! - Session history and practice statistics
//! - CLI command parsing and display utilities

pub mod cli;
pub mod config;
pub mod daemon;
pub mod feedback;
pub mod history;
pub mod patterns;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    BreathingPhase, FeedbackIntensity, IpcRequest, IpcResponse, ResponseData, SessionConfig,
    StartParams,
};

pub use config::{ConfigError, Settings};

pub use patterns::{builtin_patterns, find_pattern, BreathingPattern, PhaseDurations};

pub use daemon::{
    Clock, ControllerError, FocusSnapshot, FocusTimer, ManualClock, PhaseTransition,
    SessionController, SessionEvent, SessionSnapshot, SessionTimer, StoppedSession, SystemClock,
};

pub use feedback::{FeedbackDispatcher, FeedbackError, MockFeedbackDispatcher, TracingFeedback};

pub use history::{
    current_streak, longest_streak, JsonHistoryStore, MockSessionRecorder, PeriodStats,
    PracticeSummary, SessionEnd, SessionKind, SessionRecord, SessionRecorder,
};
