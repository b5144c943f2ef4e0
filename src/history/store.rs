//! Session history persistence.

use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tempfile::NamedTempFile;

use super::error::HistoryError;
use super::record::SessionRecord;

/// Records older than this are dropped on every write.
pub const RETENTION_DAYS: i64 = 365;

/// Receiver of finished-session records.
pub trait SessionRecorder: Send + Sync {
    /// Stores one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be persisted.
    fn record(&self, record: &SessionRecord) -> Result<(), HistoryError>;
}

// ============================================================================
// JsonHistoryStore
// ============================================================================

/// History kept as a JSON array on disk, newest first.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored record. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Where an unreadable history file is moved before a new one is started.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Loads the history for an update, moving a corrupt file aside.
    fn load_for_update(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        match self.load() {
            Err(e) if e.is_corrupt() => {
                let aside = self.corrupt_path();
                std::fs::rename(&self.path, &aside).map_err(|source| HistoryError::Io {
                    path: self.path.display().to_string(),
                    source,
                })?;
                tracing::warn!("{}; moved it to {:?}, starting a new history", e, aside);
                Ok(Vec::new())
            }
            result => result,
        }
    }

    /// Replaces the history file atomically.
    ///
    /// Records are written to a temporary file in the same directory, which
    /// is then renamed over the old file.
    fn save(&self, records: &[SessionRecord]) -> Result<(), HistoryError> {
        let io_error = |source: std::io::Error| HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        };

        // Ensure parent directory exists
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_error)?;

        // Write to a temp file next to the target
        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n").map_err(io_error)?;
            writer.flush().map_err(io_error)?;
        }
        file.as_file().sync_all().map_err(io_error)?;

        // Rename over the old file
        file.persist(&self.path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

impl SessionRecorder for JsonHistoryStore {
    fn record(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.load_for_update()?;
        records.insert(0, record.clone());
        let records = prune(records, Utc::now());

        self.save(&records)?;
        tracing::info!(
            kind = record.kind.as_str(),
            pattern = %record.pattern_id,
            rounds = record.rounds,
            "session saved to {:?}",
            self.path
        );
        Ok(())
    }
}

/// Drops records that started more than [`RETENTION_DAYS`] before `now`.
pub fn prune(records: Vec<SessionRecord>, now: DateTime<Utc>) -> Vec<SessionRecord> {
    let cutoff = now - Duration::days(RETENTION_DAYS);
    records
        .into_iter()
        .filter(|r| r.started_at > cutoff)
        .collect()
}

// ============================================================================
// MockSessionRecorder
// ============================================================================

/// Mock recorder for testing.
#[derive(Debug, Default)]
pub struct MockSessionRecorder {
    records: Mutex<Vec<SessionRecord>>,
    should_fail: AtomicBool,
}

impl MockSessionRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl SessionRecorder for MockSessionRecorder {
    fn record(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(HistoryError::Io {
                path: "mock".to_string(),
                source: std::io::Error::other("mock failure"),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
