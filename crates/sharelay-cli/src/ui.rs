//! UI utilities for Sharelay CLI.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use sharelay_core::history::{LogEntry, LogStatus};
use sharelay_core::share::ShareData;

const PREVIEW_WIDTH: usize = 60;

/// Print the banner shown at the top of interactive commands.
pub fn banner() {
    println!();
    println!("Sharelay v{}", sharelay_core::VERSION);
    println!("{}", "-".repeat(37));
    println!();
}

/// Print a share as it waits in the slot.
pub fn display_share(share: &ShareData) {
    for (label, value) in [("Title", &share.title), ("Text", &share.text), ("URL", &share.url)] {
        if !value.is_empty() {
            println!("  {:<7}{}", format!("{label}:"), one_line(value, PREVIEW_WIDTH));
        }
    }

    if !share.files.is_empty() {
        println!("  Files:");
        for file in &share.files {
            println!(
                "    {} ({}, {})",
                file.name,
                file.mime_type,
                format_size(file.decoded_len())
            );
        }
    }

    if share.is_empty() {
        println!("  (empty share)");
    }
}

/// Print one relay log entry.
pub fn display_log_entry(entry: &LogEntry) {
    let marker = match entry.status {
        LogStatus::Pending => "…",
        LogStatus::Success { .. } => "✓",
        LogStatus::Error { .. } => "✗",
    };

    println!(
        "  {} {}  {}",
        marker,
        entry.formatted_timestamp(),
        one_line(&headline(entry), PREVIEW_WIDTH)
    );

    match &entry.status {
        LogStatus::Error { error } => println!("      {}", one_line(error, PREVIEW_WIDTH)),
        LogStatus::Success { response } if !response.is_empty() => {
            println!("      {}", one_line(response, PREVIEW_WIDTH));
        }
        _ => {}
    }
}

/// Ask a question on stdout and read one trimmed, lowercased line.
pub async fn prompt(question: &str) -> io::Result<String> {
    print!("  {question} ");
    io::stdout().flush()?;

    let mut input = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader.read_line(&mut input).await?;
    Ok(input.trim().to_lowercase())
}

/// Print a core error with its suggestion, if it has one.
pub fn print_error(err: &sharelay_core::Error) {
    eprintln!();
    eprintln!("  Error: {err}");
    if let Some(hint) = err.suggestion() {
        eprintln!();
        for line in hint.lines() {
            eprintln!("  {}", line.trim_start());
        }
    }
    eprintln!();
}

fn headline(entry: &LogEntry) -> String {
    let payload = &entry.payload;
    let text = [&payload.title, &payload.text, &payload.url]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default();

    match (text.is_empty(), payload.files_count) {
        (true, 0) => "(empty share)".to_string(),
        (true, n) => format!("{n} file(s)"),
        (false, 0) => text,
        (false, n) => format!("{text} + {n} file(s)"),
    }
}

/// Collapse whitespace and cut `s` to at most `max` characters.
pub fn one_line(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Format a byte count for display.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
