//! Application state shared by the HTTP handlers.
//!
//! The capture endpoint and the session API live in one process but talk to
//! each other only through the stores, the same way a separate intercept
//! process would.

use std::sync::Arc;

use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::error::Result;
use crate::handoff::{FileHandoffStore, HandoffStore};
use crate::history::{FileLogStore, LogStore};
use crate::intercept::Interceptor;
use crate::relay::RelayEngine;
use crate::session::SessionController;

use super::WebServerConfig;

/// Shared application state for all HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Background side: writes captures to the handoff slot
    pub interceptor: Interceptor,
    /// Foreground side: activation, relay and discard
    pub session: SessionController,
    /// Server configuration
    pub config: WebServerConfig,
}

impl AppState {
    /// Build state over explicit stores.
    #[must_use]
    pub fn new(
        config: WebServerConfig,
        handoff: Arc<dyn HandoffStore>,
        settings: Arc<dyn ConfigStore>,
        log: Arc<dyn LogStore>,
        relay: RelayEngine,
    ) -> Self {
        Self {
            interceptor: Interceptor::new(handoff.clone()),
            session: SessionController::new(handoff, settings, log, relay),
            config,
        }
    }

    /// Build state over the file stores named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the relay cannot be built.
    pub fn open(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir();
        tracing::debug!("Using data directory {}", data_dir.display());

        let handoff: Arc<dyn HandoffStore> = Arc::new(FileHandoffStore::open_in(&data_dir));
        let settings: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::open_default());
        let log: Arc<dyn LogStore> = Arc::new(FileLogStore::open_in(&data_dir));
        let relay = RelayEngine::with_timeout(log.clone(), config.relay.timeout)?;

        Ok(Self::new(
            WebServerConfig::from(config),
            handoff,
            settings,
            log,
            relay,
        ))
    }
}

/// Type alias for shared state across handlers.
pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfigStore, RelaySettings};
    use crate::handoff::MemoryHandoffStore;
    use crate::history::MemoryLogStore;
    use crate::intercept::{ShareCapture, FIELD_TEXT};

    #[test]
    fn test_interceptor_and_session_share_the_slot() {
        let handoff = Arc::new(MemoryHandoffStore::new());
        let log = Arc::new(MemoryLogStore::new());
        let state = AppState::new(
            WebServerConfig::default(),
            handoff,
            Arc::new(MemoryConfigStore::new(RelaySettings::default())),
            log.clone(),
            RelayEngine::new(log),
        );

        let mut capture = ShareCapture::new();
        capture.text_field(FIELD_TEXT, "hello".to_string());
        state.interceptor.store(capture);

        assert_eq!(state.session.pending().unwrap().text, "hello");
    }
}
