pub mod channels;
pub mod list;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};

use retrokanal::channels::ChannelRouter;
use retrokanal::config::Settings;
use retrokanal::Channel;

/// Settings file with command-line overrides applied.
pub fn load_settings(proxy: Option<String>, cache_dir: Option<PathBuf>) -> Result<Settings> {
    let mut settings = Settings::load()?;
    if proxy.is_some() {
        settings.proxy = proxy;
    }
    if cache_dir.is_some() {
        settings.cache_dir = cache_dir;
    }
    Ok(settings)
}

pub fn build_channel(settings: &Settings, code: &str) -> Result<Channel> {
    ChannelRouter::new()
        .build(code, settings)
        .with_context(|| format!("cannot open channel '{code}' (see `retrokanal channels`)"))
}
