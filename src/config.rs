//! Settings loaded from `~/.config/retrokanal/config.toml`.
//!
//! ```toml
//! cache_dir = "/var/cache/retrokanal"
//! proxy = "http://127.0.0.1:3128"
//!
//! [textures]
//! mode = "cached"
//! url = "https://cdn.example.com/textures"
//!
//! [channels.oppetarkiv]
//! spoof_ip = "194.71.0.10"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::CacheDir;
use crate::textures::{TextureHandler, TextureMode};

/// Texture section of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextureSettings {
    #[serde(default)]
    pub mode: TextureMode,
    /// CDN base for `remote` and `cached` modes.
    pub url: Option<String>,
    /// Resource directory for `local` mode.
    pub path: Option<PathBuf>,
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub cache_dir: Option<PathBuf>,
    pub proxy: Option<String>,
    #[serde(default)]
    pub textures: TextureSettings,
    /// Named per-channel settings, keyed by channel code.
    #[serde(default)]
    pub channels: HashMap<String, HashMap<String, String>>,
}

impl Settings {
    /// Load the settings file.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Cache directory, defaulting to the platform cache dir.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("retrokanal")
        })
    }

    /// Build the texture handler the settings describe.
    ///
    /// `remote`/`cached` without a URL fall back to local textures.
    #[must_use]
    pub fn texture_handler(&self) -> TextureHandler {
        let textures = &self.textures;
        match (textures.mode, textures.url.as_deref()) {
            (TextureMode::Remote, Some(url)) => TextureHandler::remote(url),
            (TextureMode::Cached, Some(url)) => {
                TextureHandler::cached(url, CacheDir::new(self.cache_dir()))
            }
            _ => textures
                .path
                .clone()
                .map_or_else(TextureHandler::default, TextureHandler::local),
        }
    }

    /// Named settings for one channel code.
    #[must_use]
    pub fn channel_settings(&self, code: &str) -> HashMap<String, String> {
        self.channels.get(code).cloned().unwrap_or_default()
    }
}

/// Return the path to the settings file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retrokanal")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let settings = Settings::from_toml_str("").unwrap();
        assert!(settings.proxy.is_none());
        assert!(settings.channels.is_empty());
        assert_eq!(settings.textures.mode, TextureMode::Local);
    }

    #[test]
    fn parse_full_config() {
        let settings = Settings::from_toml_str(
            r#"
cache_dir = "/tmp/rk"
proxy = "http://127.0.0.1:3128"

[textures]
mode = "remote"
url = "https://cdn.example.com/t"

[channels.oppetarkiv]
spoof_ip = "194.71.0.10"
"#,
        )
        .unwrap();

        assert_eq!(settings.cache_dir(), PathBuf::from("/tmp/rk"));
        assert_eq!(settings.proxy.as_deref(), Some("http://127.0.0.1:3128"));
        assert_eq!(settings.texture_handler().mode(), TextureMode::Remote);
        assert_eq!(
            settings.channel_settings("oppetarkiv").get("spoof_ip").map(String::as_str),
            Some("194.71.0.10")
        );
        assert!(settings.channel_settings("nickelodeon").is_empty());
    }

    #[test]
    fn cached_mode_without_url_falls_back_to_local() {
        let settings = Settings::from_toml_str("[textures]\nmode = \"cached\"\n").unwrap();
        assert_eq!(settings.texture_handler().mode(), TextureMode::Local);
    }

    #[test]
    fn unknown_texture_mode_is_rejected() {
        assert!(Settings::from_toml_str("[textures]\nmode = \"kodi\"\n").is_err());
    }
}
