//! Per-channel configuration.
//!
//! Built once when a channel is constructed and shared read-only with
//! every item factory, pagination cursor and stream resolver.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::cache::CacheDir;
use crate::config::Settings;
use crate::error::{ChannelError, Result};
use crate::textures::TextureHandler;

/// Immutable channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Short code such as `oppetarkiv` or `nickno`.
    pub code: String,
    pub name: String,
    /// ISO country/language tag, if the channel has one.
    pub language: Option<String>,
    base_url: Url,
    /// Root listing URL.
    pub main_list_url: String,
    /// Placeholder image name for folders and videos without a thumbnail.
    pub no_image: Option<String>,
    pub icon: Option<String>,
    /// Sub-folder holding this channel's images.
    pub texture_folder: String,
    /// Player SWF used to verify RTMP streams.
    pub swf_url: Option<String>,
    pub proxy: Option<String>,
    pub cache_dir: PathBuf,
    textures: Arc<TextureHandler>,
    settings: HashMap<String, String>,
}

impl ChannelConfig {
    /// New configuration with `base_url` as main list URL.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] if `base_url` is not an absolute URL.
    pub fn new(code: &str, name: &str, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ChannelError::Config(format!("invalid base URL {base_url:?}: {e}")))?;

        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
            language: None,
            base_url: base,
            main_list_url: base_url.to_string(),
            no_image: None,
            icon: None,
            texture_folder: format!("channel.{code}"),
            swf_url: None,
            proxy: None,
            cache_dir: std::env::temp_dir().join("retrokanal"),
            textures: Arc::new(TextureHandler::default()),
            settings: HashMap::new(),
        })
    }

    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    #[must_use]
    pub fn with_main_list_url(mut self, url: &str) -> Self {
        self.main_list_url = url.to_string();
        self
    }

    #[must_use]
    pub fn with_no_image(mut self, file_name: &str) -> Self {
        self.no_image = Some(file_name.to_string());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, file_name: &str) -> Self {
        self.icon = Some(file_name.to_string());
        self
    }

    #[must_use]
    pub fn with_texture_folder(mut self, folder: &str) -> Self {
        self.texture_folder = folder.to_string();
        self
    }

    #[must_use]
    pub fn with_swf_url(mut self, swf_url: &str) -> Self {
        self.swf_url = Some(swf_url.to_string());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    #[must_use]
    pub fn with_textures(mut self, textures: Arc<TextureHandler>) -> Self {
        self.textures = textures;
        self
    }

    /// Set one named setting.
    #[must_use]
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    /// Layer the settings file over the code defaults.
    #[must_use]
    pub fn apply_settings(mut self, settings: &Settings) -> Self {
        if settings.proxy.is_some() {
            self.proxy.clone_from(&settings.proxy);
        }
        self.cache_dir = settings.cache_dir();
        self.textures = Arc::new(settings.texture_handler());
        self.settings.extend(settings.channel_settings(&self.code));
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Named setting, or `default` when unset.
    #[must_use]
    pub fn setting(&self, key: &str, default: &str) -> String {
        self.settings
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Resolve a scraped `href` against the base URL.
    ///
    /// Handles absolute, protocol-relative (`//host/..`) and root-relative
    /// links. Unparseable input comes back trimmed but otherwise untouched.
    #[must_use]
    pub fn absolute_url(&self, href: &str) -> String {
        let href = href.trim();
        self.base_url
            .join(href)
            .map_or_else(|_| href.to_string(), |u| u.to_string())
    }

    /// The cache directory as a persistence collaborator.
    #[must_use]
    pub fn cache(&self) -> CacheDir {
        CacheDir::new(&self.cache_dir)
    }

    #[must_use]
    pub fn textures(&self) -> &TextureHandler {
        &self.textures
    }

    /// URI of an image in this channel's texture folder.
    #[must_use]
    pub fn texture(&self, file_name: &str) -> String {
        self.textures.texture_uri(&self.texture_folder, file_name)
    }

    /// Placeholder image URI, if the channel has one.
    #[must_use]
    pub fn placeholder(&self) -> Option<String> {
        self.no_image.as_deref().map(|name| self.texture(name))
    }

    #[must_use]
    pub fn icon_uri(&self) -> Option<String> {
        self.icon.as_deref().map(|name| self.texture(name))
    }
}
