//! Haptic/audio feedback cues.
//!
//! The session controller signals a cue on every phase change and on
//! start/pause/resume/stop. Delivery is fire-and-forget: a failed cue is
//! logged and the session carries on.
//!
//! Device bindings live outside this crate. [`TracingFeedback`] is the
//! daemon default and only logs the cue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::types::FeedbackIntensity;

/// Errors that can occur while delivering a feedback cue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// No feedback device is available.
    #[error("feedback device unavailable: {0}")]
    Unavailable(String),

    /// The device rejected the cue.
    #[error("failed to dispatch feedback: {0}")]
    DispatchFailed(String),
}

/// Receiver of feedback cues.
pub trait FeedbackDispatcher: Send + Sync {
    /// Delivers one cue.
    ///
    /// # Errors
    ///
    /// Returns an error if the cue could not be delivered.
    fn dispatch(&self, intensity: FeedbackIntensity) -> Result<(), FeedbackError>;

    /// Returns false if cues should not be sent at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

// ============================================================================
// TracingFeedback
// ============================================================================

/// Feedback dispatcher that writes each cue to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl FeedbackDispatcher for TracingFeedback {
    fn dispatch(&self, intensity: FeedbackIntensity) -> Result<(), FeedbackError> {
        tracing::debug!(intensity = intensity.as_str(), "feedback cue");
        Ok(())
    }
}

// ============================================================================
// MockFeedbackDispatcher
// ============================================================================

/// Mock dispatcher for testing.
#[derive(Debug)]
pub struct MockFeedbackDispatcher {
    calls: Mutex<Vec<FeedbackIntensity>>,
    enabled: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockFeedbackDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeedbackDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Makes subsequent dispatches fail (they are still recorded).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Returns every cue received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<FeedbackIntensity> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl FeedbackDispatcher for MockFeedbackDispatcher {
    fn dispatch(&self, intensity: FeedbackIntensity) -> Result<(), FeedbackError> {
        self.calls.lock().unwrap().push(intensity);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(FeedbackError::DispatchFailed("mock failure".to_string()));
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
