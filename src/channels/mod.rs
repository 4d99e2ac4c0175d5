//! Built-in channels.
//!
//! # Architecture
//!
//! - [`ChannelInfo`]: code, display name and language of one channel
//! - [`ChannelRouter`]: finds the module serving a code and builds it
//!
//! # Example
//!
//! ```rust,no_run
//! use retrokanal::channels::ChannelRouter;
//! use retrokanal::config::Settings;
//! use retrokanal::HttpTransport;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let router = ChannelRouter::new();
//! let channel = router.build("oppetarkiv", &Settings::default())?;
//! let transport = HttpTransport::new()?;
//!
//! for item in channel.process_folder_list(&transport, &channel.main_list_item()).await {
//!     println!("{} {}", item.kind.label(), item.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod nickelodeon;
pub mod oppetarkiv;

use serde::Serialize;
use tracing::debug;

use crate::channel::Channel;
use crate::config::Settings;
use crate::error::{ChannelError, Result};

/// Static description of a built-in channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub language: &'static str,
}

/// One channel module: the codes it serves and how to build them.
struct ChannelModule {
    name: &'static str,
    channels: &'static [ChannelInfo],
    build: fn(&str) -> Result<Channel>,
}

/// Routes channel codes to their modules.
///
/// Modules are checked in registration order. First match wins.
pub struct ChannelRouter {
    modules: Vec<ChannelModule>,
}

impl ChannelRouter {
    /// Create a router with all built-in channels.
    #[must_use]
    pub fn new() -> Self {
        let modules = vec![
            ChannelModule {
                name: "oppetarkiv",
                channels: oppetarkiv::CHANNELS,
                build: oppetarkiv::build,
            },
            ChannelModule {
                name: "nickelodeon",
                channels: nickelodeon::CHANNELS,
                build: nickelodeon::build,
            },
        ];

        Self { modules }
    }

    /// Every channel, in registration order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.modules.iter().flat_map(|m| m.channels.iter())
    }

    #[must_use]
    pub fn find(&self, code: &str) -> Option<&ChannelInfo> {
        self.channels().find(|c| c.code == code)
    }

    /// Build the channel for `code` with the settings file applied.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] for unknown codes.
    pub fn build(&self, code: &str, settings: &Settings) -> Result<Channel> {
        let module = self
            .modules
            .iter()
            .find(|m| m.channels.iter().any(|c| c.code == code))
            .ok_or_else(|| ChannelError::Config(format!("unknown channel code {code:?}")))?;
        debug!("Matched channel module: {}", module.name);

        let channel = (module.build)(code)?;
        Ok(channel.with_settings(settings))
    }
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_registers_all_channels() {
        let router = ChannelRouter::new();
        let codes: Vec<&str> = router.channels().map(|c| c.code).collect();
        assert_eq!(codes, vec!["oppetarkiv", "nickelodeon", "nickno"]);
    }

    #[test]
    fn find_by_code() {
        let router = ChannelRouter::new();
        assert_eq!(router.find("nickno").map(|c| c.language), Some("no"));
        assert!(router.find("svtplay").is_none());
    }

    #[test]
    fn build_applies_settings() {
        let settings = Settings::from_toml_str("proxy = \"http://127.0.0.1:3128\"\n").unwrap();
        let channel = ChannelRouter::new().build("nickno", &settings).unwrap();
        assert_eq!(channel.code(), "nickno");
        assert_eq!(channel.config().proxy.as_deref(), Some("http://127.0.0.1:3128"));
    }

    #[test]
    fn unknown_code_is_a_config_error() {
        let result = ChannelRouter::new().build("svtplay", &Settings::default());
        assert!(matches!(result, Err(ChannelError::Config(_))));
    }
}
