//! Activate command implementation.
//!
//! This is the terminal rendition of the foreground: it activates the
//! session, reports an automatic relay, or asks what to do with the pending
//! share.

use anyhow::Result;

use sharelay_core::intercept::activation_url;
use sharelay_core::relay::RelayResult;
use sharelay_core::session::{parse_activation_url, Activation, SessionController};
use sharelay_core::web::WebServerConfig;

use super::ActivateArgs;
use crate::ui;

const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Relay,
    Discard,
    Keep,
}

impl Decision {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Relay => "relayed",
            Self::Discard => "discarded",
            Self::Keep => "kept",
        }
    }
}

/// Run the activate command.
pub async fn run(args: ActivateArgs) -> Result<()> {
    let config = super::load_config();
    let base = WebServerConfig::from(&config).base_url();
    let input = args.url.clone().unwrap_or_else(|| activation_url(&base));
    let url = parse_activation_url(&input, &base)?;

    let session = super::session(&config)?;
    let activation = session.activate(&url).await;

    if !args.json {
        ui::banner();
    }

    if let Some(result) = &activation.auto_relayed {
        return finish(&args, &activation, None, Some(result));
    }

    if activation.pending.is_none() {
        if !args.json {
            if activation.marker_found {
                println!("  No pending share.");
            }
            show_recent(&activation);
        }
        return finish(&args, &activation, None, None);
    }

    let decision = decide(&args, &activation).await?;
    let result = match decision {
        Decision::Relay => Some(relay(&session).await?),
        Decision::Discard => {
            session.discard_pending()?;
            None
        }
        Decision::Keep => None,
    };

    finish(&args, &activation, Some(decision), result.as_ref())
}

async fn decide(args: &ActivateArgs, activation: &Activation) -> Result<Decision> {
    if args.discard {
        return Ok(Decision::Discard);
    }
    if args.yes {
        return Ok(Decision::Relay);
    }
    if args.json {
        return Ok(Decision::Keep);
    }

    println!("  Pending share:");
    if let Some(share) = &activation.pending {
        ui::display_share(share);
    }
    println!();

    if !activation.settings.has_relay_url() {
        ui::print_error(&sharelay_core::Error::RelayUrlMissing);
        return Ok(Decision::Keep);
    }

    let question = format!("Relay to {}? [Y/n/d]", activation.settings.relay_url);
    let answer = ui::prompt(&question).await?;

    Ok(match answer.as_str() {
        "" | "y" | "yes" => Decision::Relay,
        "d" | "discard" => Decision::Discard,
        _ => Decision::Keep,
    })
}

async fn relay(session: &SessionController) -> Result<RelayResult> {
    session.relay_pending().await.map_err(|e| {
        ui::print_error(&e);
        e.into()
    })
}

fn finish(
    args: &ActivateArgs,
    activation: &Activation,
    decision: Option<Decision>,
    result: Option<&RelayResult>,
) -> Result<()> {
    let auto = activation.auto_relayed.is_some();

    if args.json {
        let action = if auto {
            Some("relayed")
        } else {
            decision.map(Decision::as_str)
        };
        let output = serde_json::json!({
            "markerFound": activation.marker_found,
            "pending": activation.pending.as_ref().map(sharelay_core::share::ShareData::summary),
            "autoRelay": auto,
            "action": action,
            "result": result,
            "location": activation.location.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match (decision, result) {
        (_, Some(result)) => {
            if auto {
                println!("  Auto-relayed pending share.");
            }
            print_result(result);
        }
        (Some(Decision::Discard), None) => println!("  Pending share discarded."),
        (Some(Decision::Keep), None) => println!("  Share left pending."),
        _ => {}
    }
    println!();
    Ok(())
}

fn print_result(result: &RelayResult) {
    if result.success {
        println!("  ✓ Relayed.");
        if let Some(response) = result.response.as_deref().filter(|r| !r.is_empty()) {
            println!("    Response: {}", ui::one_line(response, 60));
        }
    } else {
        println!("  ✗ Relay failed.");
        if let Some(error) = &result.error {
            println!("    {}", ui::one_line(error, 60));
        }
    }
}

fn show_recent(activation: &Activation) {
    if activation.logs.is_empty() {
        println!("  No relays yet.");
        return;
    }

    println!("  Recent relays:");
    for entry in activation.logs.iter().take(RECENT_ENTRIES) {
        ui::display_log_entry(entry);
    }
}
