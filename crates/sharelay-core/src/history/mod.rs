//! Relay log for Sharelay.
//!
//! This module provides persistent storage for relay attempts, allowing
//! users to review what was sent where and how it went.
//!
//! ## Features
//!
//! - Records every relay attempt the moment it is dispatched
//! - Settles each attempt exactly once, to success or error
//! - Keeps at most [`MAX_LOG_ENTRIES`](crate::MAX_LOG_ENTRIES), newest first
//! - Persists the log to a JSON file
//!
//! Updates that arrive after their entry was evicted are dropped. The log is
//! an audit aid, not a delivery record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::share::ShareSummary;
use crate::storage;

/// File name of the relay log inside the data directory.
pub const LOG_FILE_NAME: &str = "relay-log.json";

const LOG_FORMAT_VERSION: u32 = 1;

/// Unique identifier of a log entry.
///
/// Combines the creation time with 64 random bits, so ids minted within the
/// same millisecond still differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(String);

impl LogId {
    /// Mint a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(crate::now_millis())
    }

    fn generate_at(millis: i64) -> Self {
        Self(format!("{millis:x}-{:016x}", rand::random::<u64>()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a relay attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LogStatus {
    /// Request dispatched, not yet settled
    Pending,
    /// Endpoint answered with a 2xx status
    Success {
        /// Response body, verbatim
        response: String,
    },
    /// Transport failure or non-2xx status
    Error {
        /// Human-readable failure message
        error: String,
    },
}

impl LogStatus {
    /// Short lowercase label: `pending`, `success` or `error`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Success { .. } => write!(f, "Success"),
            Self::Error { .. } => write!(f, "Error"),
        }
    }
}

/// Terminal outcome of a relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Relay succeeded with this response body
    Success(String),
    /// Relay failed with this message
    Error(String),
}

impl From<RelayOutcome> for LogStatus {
    fn from(outcome: RelayOutcome) -> Self {
        match outcome {
            RelayOutcome::Success(response) => Self::Success { response },
            RelayOutcome::Error(error) => Self::Error { error },
        }
    }
}

/// A single relay attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier for this attempt
    pub id: LogId,
    /// Dispatch time, epoch milliseconds
    pub timestamp: i64,
    /// Current status, with the response or error once settled
    #[serde(flatten)]
    pub status: LogStatus,
    /// What was relayed, without file bytes
    pub payload: ShareSummary,
}

impl LogEntry {
    /// Whether the attempt has not settled yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == LogStatus::Pending
    }

    /// Response body, if the attempt succeeded.
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        match &self.status {
            LogStatus::Success { response } => Some(response),
            _ => None,
        }
    }

    /// Failure message, if the attempt failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LogStatus::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Settle a pending entry. Returns `false` if it was already settled.
    pub fn settle(&mut self, outcome: RelayOutcome) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = outcome.into();
        true
    }

    /// Get the timestamp as a human-readable string.
    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        use chrono::{DateTime, Local, Utc};
        DateTime::<Utc>::from_timestamp_millis(self.timestamp).map_or_else(
            || "Unknown".to_string(),
            |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    }
}

/// A relay attempt about to be logged; always starts out pending.
#[derive(Debug, Clone)]
pub struct LogDraft {
    /// Dispatch time, epoch milliseconds
    pub timestamp: i64,
    /// What is being relayed
    pub payload: ShareSummary,
}

impl LogDraft {
    /// Draft an entry for `payload`, stamped now.
    #[must_use]
    pub fn pending(payload: ShareSummary) -> Self {
        Self {
            timestamp: crate::now_millis(),
            payload,
        }
    }

    fn into_entry(self) -> LogEntry {
        LogEntry {
            id: LogId::generate(),
            timestamp: self.timestamp,
            status: LogStatus::Pending,
            payload: self.payload,
        }
    }
}

/// Durable, bounded log of relay attempts.
pub trait LogStore: Send + Sync {
    /// Record a new pending attempt and return it with its assigned id.
    ///
    /// A failure to persist is logged; the entry is still returned.
    fn append(&self, draft: LogDraft) -> LogEntry;

    /// Settle the entry with `id`.
    ///
    /// Missing ids (evicted or cleared) and already-settled entries are left
    /// alone without error.
    fn update(&self, id: &LogId, outcome: RelayOutcome);

    /// All entries, newest first; empty if the log cannot be read.
    fn list(&self) -> Vec<LogEntry>;

    /// Remove all entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    fn clear(&self) -> Result<()>;
}

fn prepend_capped(entries: &mut Vec<LogEntry>, entry: LogEntry) {
    entries.insert(0, entry);
    entries.truncate(crate::MAX_LOG_ENTRIES);
}

fn settle_in(entries: &mut [LogEntry], id: &LogId, outcome: RelayOutcome) -> bool {
    entries
        .iter_mut()
        .find(|e| &e.id == id)
        .is_some_and(|entry| entry.settle(outcome))
}

/// Serializable wrapper for the log file.
#[derive(Debug, Serialize, Deserialize)]
struct LogDatabase {
    /// Version of the log file format
    version: u32,
    /// Log entries, newest first
    entries: Vec<LogEntry>,
}

/// Log store backed by a JSON file.
///
/// Every operation re-reads the file, so the store always acts on the
/// current persisted sequence.
#[derive(Debug)]
pub struct FileLogStore {
    /// Path to the log file
    path: PathBuf,
    /// Serializes read-modify-write cycles within one process
    lock: Mutex<()>,
}

impl FileLogStore {
    /// Open the store in the default data directory.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open_in(&storage::default_data_dir())
    }

    /// Open the store inside `data_dir`.
    #[must_use]
    pub fn open_in(data_dir: &Path) -> Self {
        Self::open_at(data_dir.join(LOG_FILE_NAME))
    }

    /// Open the store at an explicit file path.
    #[must_use]
    pub fn open_at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Get the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> std::result::Result<Vec<LogEntry>, String> {
        storage::read_json::<LogDatabase>(&self.path).map(|db| db.map_or_else(Vec::new, |db| db.entries))
    }

    fn write_entries(&self, entries: Vec<LogEntry>) -> Result<()> {
        let db = LogDatabase {
            version: LOG_FORMAT_VERSION,
            entries,
        };
        storage::write_json_atomic(&self.path, &db)
            .map_err(|e| Error::LogStoreError(format!("Failed to write relay log: {e}")))
    }
}

impl LogStore for FileLogStore {
    fn append(&self, draft: LogDraft) -> LogEntry {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = draft.into_entry();
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("Starting a fresh relay log, existing one unreadable: {}", e);
            Vec::new()
        });
        prepend_capped(&mut entries, entry.clone());

        if let Err(e) = self.write_entries(entries) {
            tracing::warn!(id = %entry.id, "Relay attempt not persisted: {}", e);
        }

        entry
    }

    fn update(&self, id: &LogId, outcome: RelayOutcome) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%id, "Dropping log update, relay log unreadable: {}", e);
                return;
            }
        };

        if !settle_in(&mut entries, id, outcome) {
            tracing::debug!(%id, "Log entry missing or already settled, update dropped");
            return;
        }

        if let Err(e) = self.write_entries(entries) {
            tracing::warn!(%id, "Log update not persisted: {}", e);
        }
    }

    fn list(&self) -> Vec<LogEntry> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("Failed to read relay log: {}", e);
            Vec::new()
        })
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_entries(Vec::new())
    }
}

/// In-memory log store, used in tests.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogStore {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, draft: LogDraft) -> LogEntry {
        let entry = draft.into_entry();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        prepend_capped(&mut entries, entry.clone());
        entry
    }

    fn update(&self, id: &LogId, outcome: RelayOutcome) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        settle_in(&mut entries, id, outcome);
    }

    fn list(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn draft(title: &str) -> LogDraft {
        LogDraft::pending(ShareSummary {
            title: title.to_string(),
            text: "body".to_string(),
            url: String::new(),
            files_count: 1,
        })
    }

    #[test]
    fn test_log_store_save_and_load() {
        let tmp_dir = TempDir::new().unwrap();

        let store = FileLogStore::open_in(tmp_dir.path());
        let entry = store.append(draft("first"));

        let reopened = FileLogStore::open_in(tmp_dir.path());
        let entries = reopened.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], entry);
        assert!(entries[0].is_pending());
    }

    #[test]
    fn test_log_max_entries() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(tmp_dir.path());

        let first = store.append(draft("entry-0"));
        for i in 1..=crate::MAX_LOG_ENTRIES {
            store.append(draft(&format!("entry-{i}")));
        }

        let entries = store.list();
        assert_eq!(entries.len(), crate::MAX_LOG_ENTRIES);
        assert_eq!(entries[0].payload.title, format!("entry-{}", crate::MAX_LOG_ENTRIES));
        assert_eq!(entries.last().unwrap().payload.title, "entry-1");
        assert!(entries.iter().all(|e| e.id != first.id));
    }

    #[test]
    fn test_update_settles_once() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(tmp_dir.path());
        let entry = store.append(draft("once"));

        store.update(&entry.id, RelayOutcome::Success("ok".to_string()));
        store.update(&entry.id, RelayOutcome::Error("late".to_string()));

        let entries = store.list();
        assert_eq!(entries[0].response(), Some("ok"));
        assert_eq!(entries[0].error(), None);
        assert_eq!(entries[0].payload.title, "once");
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(tmp_dir.path());
        let entry = store.append(draft("kept"));

        store.update(&LogId::from("nope"), RelayOutcome::Error("x".to_string()));

        let entries = store.list();
        assert_eq!(entries, vec![entry]);
    }

    #[test]
    fn test_update_after_eviction_is_dropped() {
        let store = MemoryLogStore::new();
        let evicted = store.append(draft("old"));
        for i in 0..crate::MAX_LOG_ENTRIES {
            store.append(draft(&format!("new-{i}")));
        }

        store.update(&evicted.id, RelayOutcome::Success("late".to_string()));

        let entries = store.list();
        assert_eq!(entries.len(), crate::MAX_LOG_ENTRIES);
        assert!(entries.iter().all(|e| e.is_pending()));
    }

    #[test]
    fn test_log_clear() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(tmp_dir.path());
        store.append(draft("a"));
        store.append(draft("b"));
        assert_eq!(store.list().len(), 2);

        store.clear().unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(&tmp_dir.path().join("nonexistent"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_corrupt_log_lists_empty_and_recovers_on_append() {
        let tmp_dir = TempDir::new().unwrap();
        let store = FileLogStore::open_in(tmp_dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        assert!(store.list().is_empty());

        store.append(draft("fresh"));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_append_returns_entry_when_unwritable() {
        let tmp_dir = TempDir::new().unwrap();
        let blocker = tmp_dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let store = FileLogStore::open_in(&blocker);
        let entry = store.append(draft("lost"));

        assert!(entry.is_pending());
        assert!(store.list().is_empty());
        store.update(&entry.id, RelayOutcome::Success("ok".to_string()));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let ids: HashSet<_> = (0..1000).map(|_| LogId::generate_at(42)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_entry_serialization_shape() {
        let mut entry = draft("shape").into_entry();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("response").is_none());
        assert_eq!(json["payload"]["filesCount"], 1);

        entry.settle(RelayOutcome::Error("HTTP 500: oops".to_string()));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "HTTP 500: oops");

        let parsed: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", LogStatus::Pending), "Pending");
        assert_eq!(
            format!(
                "{}",
                LogStatus::Success {
                    response: String::new()
                }
            ),
            "Success"
        );
        assert_eq!(LogStatus::Error { error: String::new() }.label(), "error");
    }
}
