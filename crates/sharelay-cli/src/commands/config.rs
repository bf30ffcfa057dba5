//! Config command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use sharelay_core::config::{parse_duration, validate_relay_url, Config};
use sharelay_core::Error;

use super::{ConfigAction, ConfigArgs};

/// Every settable key with a one-line description.
const KEYS: &[(&str, &str)] = &[
    ("relay.url", "Destination URL shares are posted to"),
    ("relay.auto_relay", "Relay on activation without asking"),
    ("relay.timeout", "Relay request timeout, e.g. 30s or 2m"),
    ("web.port", "Port for the share target and session API"),
    ("web.localhost_only", "Bind the web server to 127.0.0.1 only"),
    ("web.max_upload_bytes", "Largest accepted share submission"),
    ("storage.data_dir", "Directory for the handoff slot and relay log"),
];

/// Run the config command.
pub async fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Get { key } => {
            let config = super::load_config();
            println!("{}", get_value(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            set_value(&mut config, &key, &value)?;
            config.save()?;
            println!("  {} = {}", key, display_value(&config, &key)?);
        }
        ConfigAction::Show => {
            let config = super::load_config();
            println!();
            println!("  # {}", Config::config_path().display());
            for (key, description) in KEYS {
                println!();
                println!("  # {}", description);
                println!("  {} = {}", key, display_value(&config, key)?);
            }
            println!();
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("  Configuration reset to defaults.");
        }
    }

    Ok(())
}

fn unknown_key(key: &str) -> Error {
    let known: Vec<_> = KEYS.iter().map(|(k, _)| *k).collect();
    Error::InvalidConfig {
        key: key.to_string(),
        reason: format!("unknown key (expected one of: {})", known.join(", ")),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Raw value of `key`; unset options read as an empty string.
fn get_value(config: &Config, key: &str) -> Result<String, Error> {
    Ok(match key {
        "relay.url" => config.relay.url.clone(),
        "relay.auto_relay" => config.relay.auto_relay.to_string(),
        "relay.timeout" => config
            .relay
            .timeout
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_default(),
        "web.port" => config.web.port.to_string(),
        "web.localhost_only" => config.web.localhost_only.to_string(),
        "web.max_upload_bytes" => config.web.max_upload_bytes.to_string(),
        "storage.data_dir" => config.data_dir().display().to_string(),
        _ => return Err(unknown_key(key)),
    })
}

fn display_value(config: &Config, key: &str) -> Result<String, Error> {
    let value = get_value(config, key)?;
    Ok(if value.is_empty() {
        "(unset)".to_string()
    } else {
        value
    })
}

fn set_value(config: &mut Config, key: &str, value: &str) -> Result<(), Error> {
    let value = value.trim();
    match key {
        "relay.url" => {
            validate_relay_url(value)?;
            config.relay.url = value.to_string();
        }
        "relay.auto_relay" => config.relay.auto_relay = parse_bool(key, value)?,
        "relay.timeout" => config.relay.timeout = parse_optional_duration(key, value)?,
        "web.port" => {
            config.web.port = value
                .parse()
                .map_err(|e| invalid(key, format!("{e}")))?;
        }
        "web.localhost_only" => config.web.localhost_only = parse_bool(key, value)?,
        "web.max_upload_bytes" => {
            config.web.max_upload_bytes = value
                .parse()
                .map_err(|e| invalid(key, format!("{e}")))?;
        }
        "storage.data_dir" => {
            config.storage.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(invalid(key, format!("expected true or false, got '{other}'"))),
    }
}

fn parse_optional_duration(key: &str, value: &str) -> Result<Option<Duration>, Error> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_duration(value).map(Some).map_err(|reason| invalid(key, reason))
}
