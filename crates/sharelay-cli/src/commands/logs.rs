//! Logs command implementation.

use anyhow::Result;

use super::LogsArgs;
use crate::ui;

/// Run the logs command.
pub async fn run(args: LogsArgs) -> Result<()> {
    let config = super::load_config();
    let log = super::log_store(&config);

    if args.clear {
        log.clear()?;
        if args.json {
            println!("{}", serde_json::json!({ "cleared": true }));
        } else {
            println!("  Relay log cleared.");
        }
        return Ok(());
    }

    let entries: Vec<_> = log.list().into_iter().take(args.limit).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("  No relays yet.");
        return Ok(());
    }

    println!();
    for entry in &entries {
        ui::display_log_entry(entry);
    }
    println!();

    Ok(())
}
