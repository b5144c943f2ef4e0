//! Completed-session records.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pattern id stored on focus records.
pub const FOCUS_PATTERN_ID: &str = "focus";

/// What kind of practice a session was.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// A paced breathing session
    #[default]
    Breathing,
    /// A focus countdown
    Focus,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Breathing => "breathing",
            SessionKind::Focus => "focus",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The target round count was reached
    Completed,
    /// The user stopped the session early
    Stopped,
}

/// A finished breathing or focus session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    /// Files written before focus sessions existed hold breathing only
    #[serde(default)]
    pub kind: SessionKind,
    pub pattern_id: String,
    pub pattern_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Active (non-paused) time, rounded to whole seconds
    pub duration_seconds: u64,
    /// Completed rounds
    pub rounds: u32,
    pub ended_by: SessionEnd,
}

impl SessionRecord {
    /// Creates a breathing record with a fresh id.
    pub fn new(
        pattern_id: impl Into<String>,
        pattern_name: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        active_seconds: f64,
        rounds: u32,
        ended_by: SessionEnd,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: SessionKind::Breathing,
            pattern_id: pattern_id.into(),
            pattern_name: pattern_name.into(),
            started_at,
            ended_at,
            duration_seconds: active_seconds.max(0.0).round() as u64,
            rounds,
            ended_by,
        }
    }

    /// Creates a focus record. Focus sessions have no pattern or rounds.
    pub fn focus(
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        active_seconds: f64,
        ended_by: SessionEnd,
    ) -> Self {
        Self {
            kind: SessionKind::Focus,
            ..Self::new(
                FOCUS_PATTERN_ID,
                "Focus",
                started_at,
                ended_at,
                active_seconds,
                0,
                ended_by,
            )
        }
    }

    /// Calendar day the session started on, as seen in `tz`.
    pub fn day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.started_at.with_timezone(tz).date_naive()
    }
}
