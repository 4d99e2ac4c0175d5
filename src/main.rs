//! `retrokanal` CLI - Browse channel listings and resolve videos

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retrokanal")]
#[command(about = "Browse broadcaster video archives and resolve playable streams")]
#[command(version)]
struct Cli {
    /// Proxy for all requests (overrides the settings file)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Cache directory for subtitles and textures
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in channels
    Channels,

    /// Fetch a listing and show its items
    List {
        /// Channel code (see `channels`)
        code: String,

        /// Listing URL (default: the channel's main list)
        #[arg(short, long)]
        url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve a video URL into playable streams
    Resolve {
        /// Channel code (see `channels`)
        code: String,

        /// Video URL as shown by `list`
        url: String,

        /// Display name for the video
        #[arg(short, long)]
        name: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON document
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let settings = cmd::load_settings(cli.proxy, cli.cache_dir)?;

    match cli.command {
        Commands::Channels => cmd::channels::cmd_channels(),
        Commands::List { code, url, format } => {
            cmd::list::cmd_list(&settings, &code, url.as_deref(), format).await?;
        }
        Commands::Resolve {
            code,
            url,
            name,
            format,
        } => {
            cmd::resolve::cmd_resolve(&settings, &code, &url, name.as_deref(), format).await?;
        }
    }

    Ok(())
}
