//! Embedded web server for Sharelay.
//!
//! One server hosts both halves of the pipeline: the capture endpoint the
//! share capability posts to, and the JSON API the foreground view talks to.
//!
//! ## Starting Web Mode
//!
//! ```bash
//! sharelay serve                  # Default port 8787, localhost only
//! sharelay serve --port 9000      # Custom port
//! sharelay serve --public         # Listen on all interfaces
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | /share-target | Capture a share (multipart), redirect to activation |
//! | GET | / | Activation; honours `?share-target=pending` |
//! | GET | /api/pending | Re-read the handoff slot |
//! | POST | /api/pending/relay | Relay the pending share |
//! | DELETE | /api/pending | Discard the pending share |
//! | GET/PUT | /api/config | Relay settings |
//! | GET/DELETE | /api/logs | Relay log |
//! | GET | /api/health | Liveness and version |

pub mod error;
pub mod handlers;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::error::{Error, Result};

pub use state::{AppState, SharedState};

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind to localhost only
    pub localhost_only: bool,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_WEB_PORT,
            localhost_only: true,
            max_upload_bytes: crate::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&Config> for WebServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            port: config.web.port,
            localhost_only: config.web.localhost_only,
            max_upload_bytes: config.web.max_upload_bytes,
        }
    }
}

impl WebServerConfig {
    /// Get the bind address for the server.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        if self.localhost_only {
            SocketAddr::from(([127, 0, 0, 1], self.port))
        } else {
            SocketAddr::from(([0, 0, 0, 0], self.port))
        }
    }

    /// Base URL the foreground is reachable at on this machine.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }
}

/// Build the router for `state`.
pub fn router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::activate))
        .route(crate::CAPTURE_PATH, post(handlers::capture))
        .route(
            "/api/pending",
            get(handlers::get_pending).delete(handlers::discard_pending),
        )
        .route("/api/pending/relay", post(handlers::relay_pending))
        .route(
            "/api/config",
            get(handlers::get_config).put(handlers::put_config),
        )
        .route(
            "/api/logs",
            get(handlers::get_logs).delete(handlers::clear_logs),
        )
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

/// The web server instance.
#[derive(Debug)]
pub struct WebServer {
    state: SharedState,
}

impl WebServer {
    /// Create a new web server over `state`.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &WebServerConfig {
        &self.state.config
    }

    /// Serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config().bind_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("Web server listening on {}", addr);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }
}
