//! Share interception.
//!
//! The intercept runs with no visible window and a short execution budget.
//! It normalizes whatever the OS delivered into a [`ShareData`], drops the
//! record into the handoff slot and points the foreground at the activation
//! URL. Nothing here fails loudly: an unreadable attachment is skipped, and a
//! failed slot write is logged as a lost capture.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::handoff::HandoffStore;
use crate::share::{ShareData, SharedFile};

/// Form field carrying the title.
pub const FIELD_TITLE: &str = "title";
/// Form field carrying the free text.
pub const FIELD_TEXT: &str = "text";
/// Form field carrying the URL.
pub const FIELD_URL: &str = "url";
/// Form field carrying attachments (repeatable).
pub const FIELD_FILES: &str = "files";

/// MIME type recorded when a file arrives without one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Accumulates the parts of one incoming share.
#[derive(Debug, Default)]
pub struct ShareCapture {
    title: Option<String>,
    text: Option<String>,
    url: Option<String>,
    files: Vec<SharedFile>,
    dropped: Vec<String>,
}

impl ShareCapture {
    /// Start an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a text field. Unknown field names are ignored.
    pub fn text_field(&mut self, name: &str, value: String) {
        match name {
            FIELD_TITLE => self.title = Some(value),
            FIELD_TEXT => self.text = Some(value),
            FIELD_URL => self.url = Some(value),
            other => tracing::debug!(field = other, "Ignoring unknown share field"),
        }
    }

    /// Record an attachment.
    ///
    /// The empty part browsers send for an untouched file input (no name, no
    /// bytes) is skipped.
    pub fn file(&mut self, name: Option<&str>, mime_type: Option<&str>, bytes: &[u8]) {
        let name = name.unwrap_or_default();
        if name.is_empty() && bytes.is_empty() {
            return;
        }

        let name = if name.is_empty() {
            format!("file-{}", self.files.len())
        } else {
            name.to_string()
        };
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MIME_TYPE);

        tracing::debug!(file = %name, mime = mime_type, bytes = bytes.len(), "Captured attachment");
        self.files.push(SharedFile::from_bytes(name, mime_type, bytes));
    }

    /// Note an attachment that could not be read; it is left out of the share.
    pub fn drop_file(&mut self, name: Option<&str>, reason: &str) {
        let name = name.unwrap_or("<unnamed>").to_string();
        tracing::warn!(file = %name, "Dropping unreadable attachment: {}", reason);
        self.dropped.push(name);
    }

    /// Names of attachments dropped so far.
    #[must_use]
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Assemble the share, stamped with the current time.
    ///
    /// Absent text fields become empty strings.
    #[must_use]
    pub fn finish(self) -> ShareData {
        ShareData::new()
            .with_title(self.title.unwrap_or_default())
            .with_text(self.text.unwrap_or_default())
            .with_url(self.url.unwrap_or_default())
            .with_files(self.files)
    }
}

/// Result of handing a capture to the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Whether the share reached the handoff slot
    pub stored: bool,
    /// Number of attachments captured
    pub files: usize,
    /// Attachments skipped because they could not be read
    pub dropped: Vec<String>,
}

/// Writes captures into the handoff slot.
#[derive(Clone)]
pub struct Interceptor {
    handoff: Arc<dyn HandoffStore>,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor").finish_non_exhaustive()
    }
}

impl Interceptor {
    /// Create an interceptor writing to `handoff`.
    #[must_use]
    pub fn new(handoff: Arc<dyn HandoffStore>) -> Self {
        Self { handoff }
    }

    /// Finish `capture` and store it, replacing any unconsumed share.
    ///
    /// A failed write loses the capture; it is logged and reported, never
    /// raised.
    pub fn store(&self, capture: ShareCapture) -> CaptureReport {
        let dropped = capture.dropped().to_vec();
        let share = capture.finish();
        let files = share.files.len();

        let stored = match self.handoff.put(&share) {
            Ok(()) => {
                tracing::info!(
                    files,
                    dropped = dropped.len(),
                    has_text = !share.text.is_empty(),
                    has_url = !share.url.is_empty(),
                    "Captured share"
                );
                true
            }
            Err(e) => {
                tracing::error!("Share capture lost: {}", e);
                false
            }
        };

        CaptureReport {
            stored,
            files,
            dropped,
        }
    }
}

/// Read files from disk into `capture`, guessing MIME types from extensions.
///
/// Unreadable paths are dropped; the remaining files are still captured.
pub async fn read_files_into(capture: &mut ShareCapture, paths: &[PathBuf]) {
    for path in paths {
        let name = file_name_of(path);
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let mime = mime_guess::from_path(path).first_or_octet_stream();
                capture.file(Some(&name), Some(mime.as_ref()), &bytes);
            }
            Err(e) => capture.drop_file(Some(&name), &e.to_string()),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Activation URL telling the foreground a share is waiting.
///
/// `base` is the foreground's root URL, e.g. `http://localhost:8787/`.
#[must_use]
pub fn activation_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    format!(
        "{base}/?{}={}",
        crate::PENDING_MARKER_KEY,
        crate::PENDING_MARKER_VALUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::handoff::MemoryHandoffStore;
    use tempfile::TempDir;

    struct BrokenHandoff;

    impl HandoffStore for BrokenHandoff {
        fn put(&self, _share: &ShareData) -> Result<()> {
            Err(Error::HandoffError("disk gone".into()))
        }

        fn get(&self) -> Option<ShareData> {
            None
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_absent_fields_become_empty() {
        let mut capture = ShareCapture::new();
        capture.text_field(FIELD_TEXT, "https://x.com/abc".to_string());

        let share = capture.finish();
        assert_eq!(share.title, "");
        assert_eq!(share.text, "https://x.com/abc");
        assert_eq!(share.url, "");
        assert!(share.files.is_empty());
        assert!(share.timestamp > 0);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut capture = ShareCapture::new();
        capture.text_field("extra", "value".to_string());
        assert!(capture.finish().is_empty());
    }

    #[test]
    fn test_file_encoded_with_metadata() {
        let mut capture = ShareCapture::new();
        capture.file(Some("photo.png"), Some("image/png"), &[0x89, 0x50]);
        capture.file(Some("blob"), None, b"raw");

        let share = capture.finish();
        assert_eq!(share.files.len(), 2);
        assert_eq!(share.files[0].name, "photo.png");
        assert_eq!(share.files[0].mime_type, "image/png");
        assert_eq!(share.files[0].data, "iVA=");
        assert_eq!(share.files[1].mime_type, FALLBACK_MIME_TYPE);
    }

    #[test]
    fn test_empty_file_input_skipped() {
        let mut capture = ShareCapture::new();
        capture.file(Some(""), Some("application/octet-stream"), b"");
        assert!(capture.finish().files.is_empty());
    }

    #[test]
    fn test_store_writes_slot() {
        let handoff = Arc::new(MemoryHandoffStore::new());
        let interceptor = Interceptor::new(handoff.clone());

        let mut capture = ShareCapture::new();
        capture.text_field(FIELD_TITLE, "Hello".to_string());
        let report = interceptor.store(capture);

        assert!(report.stored);
        assert_eq!(handoff.get().unwrap().title, "Hello");
    }

    #[test]
    fn test_store_failure_is_reported_not_raised() {
        let interceptor = Interceptor::new(Arc::new(BrokenHandoff));
        let report = interceptor.store(ShareCapture::new());
        assert!(!report.stored);
    }

    #[test]
    fn test_second_capture_replaces_first() {
        let handoff = Arc::new(MemoryHandoffStore::new());
        let interceptor = Interceptor::new(handoff.clone());

        for text in ["first", "second"] {
            let mut capture = ShareCapture::new();
            capture.text_field(FIELD_TEXT, text.to_string());
            interceptor.store(capture);
        }

        assert_eq!(handoff.get().unwrap().text, "second");
    }

    #[tokio::test]
    async fn test_read_files_drops_unreadable_paths() {
        let tmp_dir = TempDir::new().unwrap();
        let good = tmp_dir.path().join("notes.txt");
        std::fs::write(&good, b"hello").unwrap();
        let missing = tmp_dir.path().join("missing.pdf");

        let mut capture = ShareCapture::new();
        read_files_into(&mut capture, &[good, missing]).await;

        assert_eq!(capture.dropped(), ["missing.pdf".to_string()]);
        let share = capture.finish();
        assert_eq!(share.files.len(), 1);
        assert_eq!(share.files[0].name, "notes.txt");
        assert_eq!(share.files[0].mime_type, "text/plain");
    }

    #[test]
    fn test_activation_url() {
        assert_eq!(
            activation_url("http://localhost:8787/"),
            "http://localhost:8787/?share-target=pending"
        );
        assert_eq!(
            activation_url("http://localhost:8787"),
            "http://localhost:8787/?share-target=pending"
        );
    }
}
