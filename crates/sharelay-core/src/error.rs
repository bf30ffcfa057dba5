//! Error types for Sharelay.
//!
//! This module provides a unified error type for all Sharelay operations.
//! Storage failures are mostly recovered inside the stores themselves; the
//! variants here are what still reaches a caller.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for Sharelay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Sharelay.
#[derive(Error, Debug)]
pub enum Error {
    /// No share is waiting in the handoff slot (E001)
    #[error("no pending share")]
    NoPendingShare,

    /// Relay requested without a configured destination (E002)
    #[error("no relay URL configured")]
    RelayUrlMissing,

    /// The relay destination could not be parsed (E003)
    #[error("invalid relay URL '{url}': {reason}")]
    InvalidRelayUrl {
        /// The rejected URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// An activation URL could not be parsed
    #[error("invalid activation URL '{url}': {reason}")]
    InvalidActivationUrl {
        /// The rejected URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// Handoff store could not be written
    #[error("handoff store error: {0}")]
    HandoffError(String),

    /// Log store could not be written
    #[error("log store error: {0}")]
    LogStoreError(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Incoming share could not be read
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code associated with this error, if any.
    ///
    /// Error codes follow the pattern EXXX where XXX is a 3-digit number.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::NoPendingShare => Some("E001"),
            Self::RelayUrlMissing => Some("E002"),
            Self::InvalidRelayUrl { .. } => Some("E003"),
            _ => None,
        }
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::RelayUrlMissing | Self::InvalidRelayUrl { .. } => Some(
                "Set a destination first:\n\
                   sharelay config set relay.url https://example.com/hook",
            ),
            Self::NoPendingShare => Some(
                "Share something to Sharelay first, or capture from the command line:\n\
                   sharelay capture --text \"hello\"",
            ),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
