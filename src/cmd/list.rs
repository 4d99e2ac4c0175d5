use anyhow::Result;

use retrokanal::config::Settings;
use retrokanal::{HttpTransport, Item};

use super::build_channel;
use crate::OutputFormat;

pub async fn cmd_list(
    settings: &Settings,
    code: &str,
    url: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let channel = build_channel(settings, code)?;
    let transport = HttpTransport::new()?;

    let parent = match url {
        Some(url) => Item::folder(url, url),
        None => channel.main_list_item(),
    };
    eprintln!("📺 {} → {}", channel.name(), parent.url);

    let items = channel.process_folder_list(&transport, &parent).await;

    // Cached texture mode queues placeholder and icon downloads while listing
    let textures = channel.config().textures();
    if textures.missing_textures() > 0 {
        let fetched = textures.fetch_textures(&transport).await;
        tracing::debug!("Fetched {fetched} bytes of textures");
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("(empty listing)");
            }
            for item in &items {
                print_item(item);
            }
        }
    }

    Ok(())
}

fn print_item(item: &Item) {
    let date = item
        .published
        .map(|d| format!(" [{d}]"))
        .unwrap_or_default();
    println!("{:<7} {}{date}", item.kind.label(), item.name);
    println!("        {}", item.url);
}
