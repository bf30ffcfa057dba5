//! Single-slot handoff between the intercept and the foreground session.
//!
//! The handoff store is a mailbox with exactly one slot. The background
//! intercept writes a freshly captured share into it; the foreground session
//! reads it on activation and clears it once the share is relayed or
//! discarded. A second capture before the first is consumed overwrites it.
//!
//! ## Failure model
//!
//! Reading never fails from the caller's point of view: an absent, unreadable
//! or corrupt slot is reported as `None` and logged. Writes return a
//! [`Result`] so the caller can log the loss, but callers treat a failed
//! write as a dropped capture rather than a fatal error.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::share::ShareData;
use crate::storage;

/// Logical key of the single handoff slot.
pub const PENDING_SLOT_KEY: &str = "pending";

/// File name of the handoff slot inside the data directory.
pub const HANDOFF_FILE_NAME: &str = "pending-share.json";

const HANDOFF_FORMAT_VERSION: u32 = 1;

/// Durable single-slot store for the pending share.
pub trait HandoffStore: Send + Sync {
    /// Store `share` in the slot, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    fn put(&self, share: &ShareData) -> Result<()>;

    /// Read the pending share, `None` if the slot is empty or unreadable.
    fn get(&self) -> Option<ShareData>;

    /// Empty the slot. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// On-disk envelope for the slot.
#[derive(Debug, Serialize, Deserialize)]
struct HandoffRecord {
    /// Format version
    version: u32,
    /// Slot key, always [`PENDING_SLOT_KEY`]
    key: String,
    /// The pending share
    share: ShareData,
}

/// Handoff store backed by a JSON file.
#[derive(Debug)]
pub struct FileHandoffStore {
    /// Path to the slot file
    path: PathBuf,
    /// Serializes access within one process
    lock: Mutex<()>,
}

impl FileHandoffStore {
    /// Open the store in the default data directory.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open_in(&storage::default_data_dir())
    }

    /// Open the store inside `data_dir`.
    ///
    /// Nothing is touched on disk until the first write.
    #[must_use]
    pub fn open_in(data_dir: &Path) -> Self {
        Self::open_at(data_dir.join(HANDOFF_FILE_NAME))
    }

    /// Open the store at an explicit file path.
    #[must_use]
    pub fn open_at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Get the path to the slot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HandoffStore for FileHandoffStore {
    fn put(&self, share: &ShareData) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let record = HandoffRecord {
            version: HANDOFF_FORMAT_VERSION,
            key: PENDING_SLOT_KEY.to_string(),
            share: share.clone(),
        };

        storage::write_json_atomic(&self.path, &record)
            .map_err(|e| Error::HandoffError(format!("Failed to write pending share: {e}")))?;

        tracing::debug!(
            path = %self.path.display(),
            files = share.files.len(),
            "Stored pending share"
        );
        Ok(())
    }

    fn get(&self) -> Option<ShareData> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match storage::read_json::<HandoffRecord>(&self.path) {
            Ok(Some(record)) if record.key == PENDING_SLOT_KEY => Some(record.share),
            Ok(Some(record)) => {
                tracing::warn!(key = %record.key, "Ignoring handoff record with unexpected key");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read pending share: {}", e);
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        storage::remove_if_exists(&self.path)
            .map_err(|e| Error::HandoffError(format!("Failed to clear pending share: {e}")))?;

        tracing::debug!(path = %self.path.display(), "Cleared pending share");
        Ok(())
    }
}

/// In-memory handoff store, used in tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryHandoffStore {
    slot: Mutex<Option<ShareData>>,
}

impl MemoryHandoffStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HandoffStore for MemoryHandoffStore {
    fn put(&self, share: &ShareData) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(share.clone());
        Ok(())
    }

    fn get(&self) -> Option<ShareData> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
