//! Session history: records, persistence and practice statistics.

pub mod error;
pub mod record;
pub mod stats;
pub mod store;

pub use error::HistoryError;
pub use record::{SessionEnd, SessionKind, SessionRecord, FOCUS_PATTERN_ID};
pub use stats::{current_streak, longest_streak, FavoritePattern, PeriodStats, PracticeSummary};
pub use store::{prune, JsonHistoryStore, MockSessionRecorder, SessionRecorder, RETENTION_DAYS};
