//! # Sharelay Core Library
//!
//! `sharelay-core` provides the capture, handoff and relay pipeline behind
//! Sharelay, a share-sheet target that forwards whatever the operating system
//! hands it to a user-configured HTTP endpoint.
//!
//! ## Pipeline
//!
//! ```text
//! OS share -> intercept -> handoff slot -> session -> relay -> log
//! ```
//!
//! The background intercept and the foreground session never share memory.
//! They coordinate through three durable stores and a query marker on the
//! activation URL.
//!
//! ## Modules
//!
//! - [`config`] - Configuration file and the relay settings store
//! - [`handoff`] - Single-slot store holding the pending share
//! - [`history`] - Bounded log of relay attempts
//! - [`intercept`] - Normalizing incoming shares into the handoff slot
//! - [`relay`] - Outbound HTTP relay engine
//! - [`session`] - Foreground activation, auto-relay and user decisions
//! - [`share`] - Share data model
//! - [`web`] - Embedded HTTP server (capture endpoint and session API)
//!
//! ## Example
//!
//! ```rust,ignore
//! use sharelay_core::session::SessionController;
//!
//! let controller = SessionController::new(handoff, config, log, relay);
//! let activation = controller.activate(&url).await;
//! if let Some(result) = activation.auto_relayed {
//!     println!("relayed: {}", result.success);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod handoff;
pub mod history;
pub mod intercept;
pub mod relay;
pub mod session;
pub mod share;
mod storage;

#[cfg(feature = "web")]
pub mod web;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Query key marking an activation that should look for a pending share.
pub const PENDING_MARKER_KEY: &str = "share-target";

/// Query value paired with [`PENDING_MARKER_KEY`].
pub const PENDING_MARKER_VALUE: &str = "pending";

/// Path the share capability posts captured forms to.
pub const CAPTURE_PATH: &str = "/share-target";

/// Maximum number of relay attempts kept in the log.
pub const MAX_LOG_ENTRIES: usize = 50;

/// Default port for the embedded web server.
pub const DEFAULT_WEB_PORT: u16 = 8787;

/// Default upper bound for a captured multipart submission (64 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Current time as epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
