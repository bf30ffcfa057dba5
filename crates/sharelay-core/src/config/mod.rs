//! Configuration management for Sharelay.
//!
//! This module handles loading, saving, and managing Sharelay configuration,
//! and provides the [`ConfigStore`] the session and relay read their relay
//! settings from.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/sharelay/config.toml` |
//! | macOS | `~/Library/Application Support/com.sharelay.Sharelay/config.toml` |
//! | Windows | `%APPDATA%\sharelay\Sharelay\config\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use sharelay_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Relaying to: {}", config.relay.url);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay settings
    pub relay: RelayConfig,
    /// Web server settings
    pub web: WebConfig,
    /// Storage settings
    pub storage: StorageConfig,
}

/// Relay configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Destination URL shares are posted to
    pub url: String,
    /// Relay a pending share on activation without asking
    pub auto_relay: bool,
    /// Request timeout; unset leaves the HTTP client's default in place
    #[serde(
        with = "humantime_serde_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

/// Web interface configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Web server port
    pub port: u16,
    /// Bind to localhost only
    pub localhost_only: bool,
    /// Largest accepted capture submission in bytes
    pub max_upload_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_WEB_PORT,
            localhost_only: true,
            max_upload_bytes: crate::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Storage configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the directory holding the handoff slot and relay log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Read `config.toml` from the platform config directory.
    ///
    /// A missing file yields [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read the TOML file at `path`, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Write `config.toml` to the platform config directory, creating it
    /// on first save.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Write the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Platform config directory for Sharelay.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sharelay", "Sharelay")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Where `config.toml` lives.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Directory holding the handoff slot and the relay log.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(crate::storage::default_data_dir)
    }

    /// The user-editable relay settings.
    #[must_use]
    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            relay_url: self.relay.url.clone(),
            auto_relay: self.relay.auto_relay,
        }
    }

    /// Replace the user-editable relay settings, keeping everything else.
    pub fn apply_relay_settings(&mut self, settings: &RelaySettings) {
        self.relay.url.clone_from(&settings.relay_url);
        self.relay.auto_relay = settings.auto_relay;
    }
}

/// The relay destination and auto-relay flag.
///
/// This is the singleton the session and relay engine consult; it is only
/// changed by an explicit user save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Destination URL, empty when unset
    pub relay_url: String,
    /// Relay automatically on activation
    pub auto_relay: bool,
}

impl RelaySettings {
    /// Whether a destination is set; whitespace alone does not count.
    #[must_use]
    pub fn has_relay_url(&self) -> bool {
        !self.relay_url.trim().is_empty()
    }

    /// Whether a pending share should be relayed without asking.
    #[must_use]
    pub fn should_auto_relay(&self) -> bool {
        self.auto_relay && self.has_relay_url()
    }

    /// Check the relay URL before it is saved.
    ///
    /// An empty URL is allowed and means "not configured".
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelayUrl`] for anything other than an
    /// absolute `http` or `https` URL.
    pub fn validate(&self) -> Result<()> {
        validate_relay_url(&self.relay_url)
    }
}

/// Check that `url` is empty or an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`Error::InvalidRelayUrl`] with the parser's reason.
pub fn validate_relay_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let invalid = |reason: String| Error::InvalidRelayUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = reqwest::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Durable store for [`RelaySettings`].
pub trait ConfigStore: Send + Sync {
    /// Load the settings; defaults when unset or unreadable.
    fn load(&self) -> RelaySettings;

    /// Persist the settings, replacing the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    fn save(&self, settings: &RelaySettings) -> Result<()>;
}

/// Config store backed by the `[relay]` section of `config.toml`.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileConfigStore {
    /// Open the store at the default configuration path.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open_at(Config::config_path())
    }

    /// Open the store at an explicit file path.
    #[must_use]
    pub fn open_at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Get the path to the configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> RelaySettings {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match Config::load_from(&self.path) {
            Ok(config) => config.relay_settings(),
            Err(e) => {
                tracing::warn!("Falling back to default relay settings: {}", e);
                RelaySettings::default()
            }
        }
    }

    fn save(&self, settings: &RelaySettings) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut config = Config::load_from(&self.path).unwrap_or_else(|e| {
            tracing::warn!("Rewriting unreadable config file: {}", e);
            Config::default()
        });
        config.apply_relay_settings(settings);
        config.save_to(&self.path)?;

        tracing::debug!(
            auto_relay = settings.auto_relay,
            has_url = !settings.relay_url.is_empty(),
            "Saved relay settings"
        );
        Ok(())
    }
}

/// In-memory config store, used in tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: Mutex<RelaySettings>,
}

impl MemoryConfigStore {
    /// Create a store holding `settings`.
    #[must_use]
    pub fn new(settings: RelaySettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> RelaySettings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, settings: &RelaySettings) -> Result<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

/// Parse a duration string like "30s", "2m" or "1h".
///
/// # Errors
///
/// Returns an error if the string has no recognised suffix or a bad number.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        return Err(format!("invalid duration format: '{s}'"));
    };

    let n = digits
        .parse::<u64>()
        .map_err(|e| format!("invalid duration '{s}': {e}"))?;
    n.checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration out of range: '{s}'"))
}

mod humantime_serde_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&format!("{}s", d.as_secs())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
