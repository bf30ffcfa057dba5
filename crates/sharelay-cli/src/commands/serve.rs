//! Serve command implementation.

use anyhow::Result;

use sharelay_core::web::{AppState, WebServer};

use super::ServeArgs;

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = super::load_config();
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if args.public {
        config.web.localhost_only = false;
    }

    let state = AppState::open(&config)?;
    let server = WebServer::new(state);
    let web = server.config().clone();

    crate::ui::banner();
    println!("  Listening on   {}", web.bind_addr());
    println!(
        "  Share target   POST {}{}",
        web.base_url().trim_end_matches('/'),
        sharelay_core::CAPTURE_PATH
    );
    println!("  Foreground     {}", web.base_url());

    let settings = config.relay_settings();
    if settings.relay_url.is_empty() {
        println!("  Relay          (not configured)");
    } else {
        let mode = if settings.auto_relay { "auto" } else { "ask" };
        println!("  Relay          {} ({})", settings.relay_url, mode);
    }
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
