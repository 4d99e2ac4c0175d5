use anyhow::Result;
use serde_json::json;

use retrokanal::config::Settings;
use retrokanal::{HttpTransport, Item, ResolveOutcome};

use super::build_channel;
use crate::OutputFormat;

pub async fn cmd_resolve(
    settings: &Settings,
    code: &str,
    url: &str,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let channel = build_channel(settings, code)?;
    let transport = HttpTransport::new()?;

    let mut item = Item::video(name.unwrap_or(url), url);
    eprintln!("🎬 Resolving: {}", item.name);

    let outcome = channel.update_video_item(&transport, &mut item).await;

    match format {
        OutputFormat::Json => {
            let report = json!({
                "outcome": outcome,
                "item": item,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_outcome(&outcome, &item),
    }

    Ok(())
}

fn print_outcome(outcome: &ResolveOutcome, item: &Item) {
    match outcome {
        ResolveOutcome::Resolved { streams } => println!("✅ Resolved: {streams} streams"),
        ResolveOutcome::PartiallyResolved { streams, skipped } => {
            println!("✅ Resolved: {streams} streams ({} entries skipped)", skipped.len());
            for entry in skipped {
                println!("   ⏭️  {} ({})", entry.url, entry.reason);
            }
        }
        ResolveOutcome::Failed { reason } => {
            println!("❌ Unplayable: {reason}");
            return;
        }
    }

    for part in item.parts() {
        for (k, v) in &part.http_headers {
            println!("   {k}: {v}");
        }
        for stream in part.streams() {
            println!("{:>6} kbps  {}", stream.bitrate, stream.url);
        }
        if let Some(path) = &part.subtitle_path {
            println!("💬 Subtitle: {}", path.display());
        }
    }
}
