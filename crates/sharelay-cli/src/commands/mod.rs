//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use sharelay_core::config::{Config, ConfigStore, FileConfigStore};
use sharelay_core::handoff::{FileHandoffStore, HandoffStore};
use sharelay_core::history::{FileLogStore, LogStore};
use sharelay_core::relay::RelayEngine;
use sharelay_core::session::SessionController;

/// Read `config.toml`, falling back to defaults when it is missing or broken.
pub fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {}", e);
        Config::default()
    })
}

/// Open the handoff slot in the configured data directory.
pub fn handoff_store(config: &Config) -> Arc<dyn HandoffStore> {
    Arc::new(FileHandoffStore::open_in(&config.data_dir()))
}

/// Open the relay log in the configured data directory.
pub fn log_store(config: &Config) -> Arc<dyn LogStore> {
    Arc::new(FileLogStore::open_in(&config.data_dir()))
}

/// Build a session controller over the file stores.
pub fn session(config: &Config) -> anyhow::Result<SessionController> {
    let log = log_store(config);
    let settings: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::open_default());
    let relay = RelayEngine::with_timeout(log.clone(), config.relay.timeout)?;

    Ok(SessionController::new(
        handoff_store(config),
        settings,
        log,
        relay,
    ))
}

pub mod activate;
pub mod capture;
pub mod config;
pub mod logs;
pub mod serve;

/// Sharelay - relay shared content to an HTTP endpoint
#[derive(Parser)]
#[command(name = "sharelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Run the capture endpoint and session API
    Serve(ServeArgs),

    /// Capture a share from the command line
    Capture(CaptureArgs),

    /// Activate the foreground: relay or discard the pending share
    Activate(ActivateArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// View the relay log
    Logs(LogsArgs),
}

/// Arguments for the serve command
#[derive(Parser)]
pub struct ServeArgs {
    /// Port to listen on (defaults to web.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Listen on all interfaces instead of localhost only
    #[arg(long)]
    pub public: bool,
}

/// Arguments for the capture command
#[derive(Parser)]
pub struct CaptureArgs {
    /// Share title
    #[arg(long)]
    pub title: Option<String>,

    /// Free text
    #[arg(long)]
    pub text: Option<String>,

    /// Shared URL
    #[arg(long)]
    pub url: Option<String>,

    /// Attach a file (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Open the activation URL after capturing
    #[arg(long)]
    pub open: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the activate command
#[derive(Parser)]
pub struct ActivateArgs {
    /// Activation URL (defaults to the pending-share URL)
    pub url: Option<String>,

    /// Relay the pending share without asking
    #[arg(short, long, conflicts_with = "discard")]
    pub yes: bool,

    /// Discard the pending share without relaying
    #[arg(long)]
    pub discard: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show all configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Reset to defaults
    Reset,
}

/// Arguments for the logs command
#[derive(Parser)]
pub struct LogsArgs {
    /// Clear the log
    #[arg(long)]
    pub clear: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show at most this many entries
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}
