//! Capture command implementation.

use anyhow::Result;

use sharelay_core::intercept::{
    activation_url, read_files_into, Interceptor, ShareCapture, FIELD_TEXT, FIELD_TITLE, FIELD_URL,
};
use sharelay_core::web::WebServerConfig;

use super::CaptureArgs;

/// Run the capture command.
pub async fn run(args: CaptureArgs) -> Result<()> {
    let config = super::load_config();

    let mut capture = ShareCapture::new();
    for (field, value) in [
        (FIELD_TITLE, args.title),
        (FIELD_TEXT, args.text),
        (FIELD_URL, args.url),
    ] {
        if let Some(value) = value {
            capture.text_field(field, value);
        }
    }
    read_files_into(&mut capture, &args.files).await;

    let report = Interceptor::new(super::handoff_store(&config)).store(capture);
    let url = activation_url(&WebServerConfig::from(&config).base_url());

    if args.json {
        let output = serde_json::json!({
            "stored": report.stored,
            "files": report.files,
            "dropped": report.dropped,
            "activationUrl": url,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        if report.stored {
            println!("  Share captured ({} file(s)).", report.files);
        } else {
            println!("  Share could not be stored; see the log output above.");
        }
        for name in &report.dropped {
            println!("  Skipped unreadable file: {}", name);
        }
        println!();
        println!("  Activate with:  sharelay activate");
        println!("  or open:        {}", url);
        println!();
    }

    if !report.stored {
        anyhow::bail!("capture lost");
    }

    if args.open {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open {}: {}", url, e);
        }
    }

    Ok(())
}
