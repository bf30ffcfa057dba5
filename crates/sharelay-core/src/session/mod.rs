//! Foreground session control.
//!
//! The [`SessionController`] runs whenever the foreground is activated. It
//! loads the relay settings and the log, and when the activation URL carries
//! the pending marker it looks into the handoff slot. A waiting share is then
//! either relayed right away (auto-relay) or held until the user relays or
//! discards it.
//!
//! The slot is re-read every time the user acts, so a capture that lands
//! while an older share is on screen is the one that gets relayed.

use std::sync::Arc;

use reqwest::Url;

use crate::config::{ConfigStore, RelaySettings};
use crate::error::{Error, Result};
use crate::handoff::HandoffStore;
use crate::history::{LogEntry, LogStore};
use crate::relay::{RelayEngine, RelayResult};
use crate::share::ShareData;
use crate::{PENDING_MARKER_KEY, PENDING_MARKER_VALUE};

/// Everything the foreground needs to render after an activation.
#[derive(Debug, Clone)]
pub struct Activation {
    /// Current relay settings
    pub settings: RelaySettings,
    /// Relay log, newest first
    pub logs: Vec<LogEntry>,
    /// Whether the activation URL carried the pending marker
    pub marker_found: bool,
    /// The share found in the slot, if any
    pub pending: Option<ShareData>,
    /// Result of the automatic relay, when one ran
    pub auto_relayed: Option<RelayResult>,
    /// Activation URL with the pending marker removed
    pub location: Url,
}

impl Activation {
    /// Whether a share is still waiting for the user to decide.
    #[must_use]
    pub fn awaiting_decision(&self) -> bool {
        self.pending.is_some() && self.auto_relayed.is_none()
    }
}

/// Orchestrates the foreground side of the handoff.
#[derive(Clone)]
pub struct SessionController {
    handoff: Arc<dyn HandoffStore>,
    config: Arc<dyn ConfigStore>,
    log: Arc<dyn LogStore>,
    relay: RelayEngine,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller over the given stores and relay engine.
    #[must_use]
    pub fn new(
        handoff: Arc<dyn HandoffStore>,
        config: Arc<dyn ConfigStore>,
        log: Arc<dyn LogStore>,
        relay: RelayEngine,
    ) -> Self {
        Self {
            handoff,
            config,
            log,
            relay,
        }
    }

    /// Handle a foreground activation at `url`.
    ///
    /// Repeating an activation is harmless: once the slot has been consumed
    /// the marker simply finds nothing.
    pub async fn activate(&self, url: &Url) -> Activation {
        let settings = self.config.load();
        let (marker_found, location) = strip_pending_marker(url);

        let pending = if marker_found {
            self.handoff.get()
        } else {
            None
        };

        let auto_relayed = match &pending {
            Some(share) if settings.should_auto_relay() => {
                tracing::info!("Auto-relaying pending share");
                Some(self.relay_and_clear(share, &settings.relay_url).await)
            }
            Some(_) => {
                tracing::debug!("Pending share awaiting user decision");
                None
            }
            None => {
                if marker_found {
                    tracing::debug!("Activation marker present but slot empty");
                }
                None
            }
        };

        Activation {
            settings,
            logs: self.log.list(),
            marker_found,
            pending,
            auto_relayed,
            location,
        }
    }

    /// Re-read the handoff slot.
    pub fn pending(&self) -> Option<ShareData> {
        self.handoff.get()
    }

    /// Relay whatever share currently sits in the slot, then clear it.
    ///
    /// The slot is cleared whether the relay succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelayUrlMissing`] when no destination is configured
    /// and [`Error::NoPendingShare`] when the slot is empty. The slot is left
    /// untouched in both cases.
    pub async fn relay_pending(&self) -> Result<RelayResult> {
        let settings = self.config.load();
        if !settings.has_relay_url() {
            return Err(Error::RelayUrlMissing);
        }

        let share = self.handoff.get().ok_or(Error::NoPendingShare)?;
        Ok(self.relay_and_clear(&share, &settings.relay_url).await)
    }

    /// Drop the pending share without relaying it.
    ///
    /// No log entry is written. Returns whether a share was waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be cleared.
    pub fn discard_pending(&self) -> Result<bool> {
        let had_share = self.handoff.get().is_some();
        self.handoff.clear()?;
        if had_share {
            tracing::info!("Discarded pending share");
        }
        Ok(had_share)
    }

    /// Current relay settings.
    pub fn settings(&self) -> RelaySettings {
        self.config.load()
    }

    /// Persist new relay settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn save_settings(&self, settings: &RelaySettings) -> Result<()> {
        self.config.save(settings)
    }

    /// Relay log, newest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.list()
    }

    /// Empty the relay log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn clear_logs(&self) -> Result<()> {
        self.log.clear()
    }

    async fn relay_and_clear(&self, share: &ShareData, url: &str) -> RelayResult {
        let result = self.relay.relay(share, url).await;
        if let Err(e) = self.handoff.clear() {
            tracing::warn!("Relayed share left in slot: {}", e);
        }
        result
    }
}

/// Parse an activation URL, resolving relative input against `base`.
///
/// Accepts absolute URLs of any scheme as well as paths such as
/// `/?share-target=pending`.
///
/// # Errors
///
/// Returns [`Error::InvalidActivationUrl`] if neither form parses.
pub fn parse_activation_url(input: &str, base: &str) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidActivationUrl {
        url: input.to_string(),
        reason,
    };

    Url::parse(input).or_else(|e| {
        if input.contains("://") {
            return Err(invalid(e.to_string()));
        }
        Url::parse(base)
            .and_then(|base| base.join(input))
            .map_err(|e| invalid(e.to_string()))
    })
}

/// Remove the pending marker from `url`.
///
/// Returns whether the marker was present and the cleaned URL. Other query
/// pairs are kept in order; an emptied query is removed entirely.
#[must_use]
pub fn strip_pending_marker(url: &Url) -> (bool, Url) {
    let is_marker = |(k, v): &(String, String)| k == PENDING_MARKER_KEY && v == PENDING_MARKER_VALUE;

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let found = pairs.iter().any(is_marker);

    let mut cleaned = url.clone();
    if !found {
        return (false, cleaned);
    }

    let kept: Vec<_> = pairs.into_iter().filter(|p| !is_marker(p)).collect();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }

    (true, cleaned)
}
