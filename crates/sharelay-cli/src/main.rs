//! Sharelay CLI - relay shared content to an HTTP endpoint
//!
//! Sharelay registers as a share target, parks whatever it receives in a
//! durable slot, and forwards it as JSON to a URL of your choosing.
//!
//! ## Quick Start
//!
//! ```bash
//! # Point Sharelay at a webhook
//! sharelay config set relay.url https://example.com/hook
//!
//! # Run the share target
//! sharelay serve
//!
//! # Or capture from the terminal and relay it
//! sharelay capture --text "https://x.com/abc"
//! sharelay activate
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Capture(args) => commands::capture::run(args).await,
        Command::Activate(args) => commands::activate::run(args).await,
        Command::Config(args) => commands::config::run(args).await,
        Command::Logs(args) => commands::logs::run(args).await,
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,sharelay=info,sharelay_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
