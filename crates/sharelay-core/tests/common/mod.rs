//! Common test utilities for `Sharelay` integration tests.
//!
//! Stores are file-backed in a temporary directory. Each call to a `*_store`
//! helper opens a fresh instance over the same files, the way the intercept
//! and the foreground would from separate processes.

#![allow(dead_code)]

use std::sync::Arc;

use sharelay_core::config::{ConfigStore, FileConfigStore, RelaySettings};
use sharelay_core::handoff::FileHandoffStore;
use sharelay_core::history::FileLogStore;
use sharelay_core::intercept::Interceptor;
use sharelay_core::relay::RelayEngine;
use sharelay_core::session::SessionController;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock relay endpoint listens on.
pub const HOOK_PATH: &str = "/hook";

/// A temporary data directory with the three stores.
pub struct Harness {
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    pub fn handoff_store(&self) -> Arc<FileHandoffStore> {
        Arc::new(FileHandoffStore::open_in(self.dir.path()))
    }

    pub fn config_store(&self) -> Arc<FileConfigStore> {
        Arc::new(FileConfigStore::open_at(self.dir.path().join("config.toml")))
    }

    pub fn log_store(&self) -> Arc<FileLogStore> {
        Arc::new(FileLogStore::open_in(self.dir.path()))
    }

    pub fn interceptor(&self) -> Interceptor {
        Interceptor::new(self.handoff_store())
    }

    pub fn controller(&self) -> SessionController {
        let log = self.log_store();
        SessionController::new(
            self.handoff_store(),
            self.config_store(),
            log.clone(),
            RelayEngine::new(log),
        )
    }

    pub fn set_relay(&self, relay_url: &str, auto_relay: bool) {
        self.config_store()
            .save(&RelaySettings {
                relay_url: relay_url.to_string(),
                auto_relay,
            })
            .expect("Failed to save relay settings");
    }
}

/// Start a relay endpoint answering `POST /hook` with `status` and `body`.
pub async fn mock_relay(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// Like [`mock_relay`], but answers only after `delay`.
pub async fn slow_relay(status: u16, body: &str, delay: std::time::Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

/// Full relay URL on `server`.
pub fn hook_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), HOOK_PATH)
}

/// Parsed JSON bodies of every request `server` received.
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("relay body is JSON"))
        .collect()
}
