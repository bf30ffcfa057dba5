//! Share data model.
//!
//! A [`ShareData`] is one captured share: the three text fields the OS share
//! sheet offers plus any attached files, already base64-encoded so the record
//! can be persisted and relayed as plain JSON.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// A file attached to a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFile {
    /// Original filename
    pub name: String,
    /// Declared MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Binary content, base64 (standard alphabet, padded)
    pub data: String,
}

impl SharedFile {
    /// Build a file record from raw bytes.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Approximate decoded size in bytes.
    #[must_use]
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// One captured share.
///
/// Any of the text fields may be empty. Share sheets frequently put the real
/// link in `text` rather than `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    /// Share title
    #[serde(default)]
    pub title: String,
    /// Free text
    #[serde(default)]
    pub text: String,
    /// Shared URL
    #[serde(default)]
    pub url: String,
    /// Attached files, in submission order
    #[serde(default)]
    pub files: Vec<SharedFile>,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
}

impl ShareData {
    /// Create an empty share stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: crate::now_millis(),
            ..Self::default()
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Attach files.
    #[must_use]
    pub fn with_files(mut self, files: Vec<SharedFile>) -> Self {
        self.files = files;
        self
    }

    /// Whether nothing at all was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.text.is_empty() && self.url.is_empty() && self.files.is_empty()
    }

    /// Redacted summary used in the relay log.
    #[must_use]
    pub fn summary(&self) -> ShareSummary {
        ShareSummary {
            title: self.title.clone(),
            text: self.text.clone(),
            url: self.url.clone(),
            files_count: self.files.len(),
        }
    }
}

/// Redacted view of a share: the text fields and a file count, no file bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSummary {
    /// Share title
    pub title: String,
    /// Free text
    pub text: String,
    /// Shared URL
    pub url: String,
    /// Number of attached files
    pub files_count: usize,
}

/// JSON document sent to the relay endpoint.
///
/// Empty text fields are sent as `null`; file data passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayDocument {
    /// Share title
    pub title: Option<String>,
    /// Free text
    pub text: Option<String>,
    /// Shared URL
    pub url: Option<String>,
    /// Attached files
    pub files: Vec<SharedFile>,
}

impl From<&ShareData> for RelayDocument {
    fn from(share: &ShareData) -> Self {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }

        Self {
            title: non_empty(&share.title),
            text: non_empty(&share.text),
            url: non_empty(&share.url),
            files: share.files.clone(),
        }
    }
}
