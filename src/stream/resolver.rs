//! Lazy stream resolution.
//!
//! A [`StreamResolver`] runs only when a video item is selected. It
//! fetches the item's primary descriptor, classifies every entry and hands
//! manifests to the matching [`ManifestAdapter`]. Entries that cannot be
//! used are recorded as [`SkippedEntry`] and never abort the resolution;
//! only a failed primary fetch (or an unreadable primary payload) does.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::adapter::ManifestAdapter;
use super::adapters::{HlsAdapter, RenditionAdapter};
use super::dialect::{Dialect, StreamDescriptor};
use super::subtitle::{correct_hours, subtitle_file_name};
use crate::cache::CacheDir;
use crate::channel::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::http_client::Transport;
use crate::item::{Item, MediaPart, MediaStream};

/// Header carrying the configured spoof address.
pub const SPOOF_HEADER: &str = "X-Forwarded-For";

/// Setting key for the spoof address.
pub const SPOOF_SETTING: &str = "spoof_ip";

const DEFAULT_SPOOF_IP: &str = "0.0.0.0";

/// Channel hook that turns a selected video into playable streams.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Resolve `item`.
    ///
    /// Errors mean the primary descriptor could not be fetched or read.
    /// A returned part without streams is a failed resolution too, but
    /// the decision belongs to the caller.
    async fn resolve(&self, ctx: &ResolveContext<'_>, item: &Item) -> Result<Resolution>;
}

/// A descriptor entry (or subtitle) that did not contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub url: String,
    pub reason: String,
}

impl SkippedEntry {
    pub fn new(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// What a resolver produced.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub part: MediaPart,
    pub skipped: Vec<SkippedEntry>,
}

/// Outcome of one resolution attempt as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// Every descriptor entry contributed.
    Resolved { streams: usize },
    /// Some entries were skipped but at least one stream was found.
    PartiallyResolved {
        streams: usize,
        skipped: Vec<SkippedEntry>,
    },
    Failed { reason: String },
}

impl ResolveOutcome {
    /// Resolved and partially resolved items are both playable.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Collaborators available to a resolver for one item.
pub struct ResolveContext<'a> {
    pub config: &'a ChannelConfig,
    pub transport: &'a dyn Transport,
    pub cache: &'a CacheDir,
}

impl<'a> ResolveContext<'a> {
    #[must_use]
    pub fn new(config: &'a ChannelConfig, transport: &'a dyn Transport, cache: &'a CacheDir) -> Self {
        Self {
            config,
            transport,
            cache,
        }
    }

    /// Fetch through the channel proxy without extra headers.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_text_with(url, &HashMap::new()).await
    }

    pub async fn fetch_text_with(&self, url: &str, headers: &HashMap<String, String>) -> Result<String> {
        self.transport
            .fetch_text(url, self.config.proxy.as_deref(), headers)
            .await
    }

    /// Headers every stream fetch of this channel carries.
    ///
    /// The spoof address defaults to `0.0.0.0`; an empty setting disables it.
    #[must_use]
    pub fn spoof_headers(&self) -> HashMap<String, String> {
        let spoof_ip = self.config.setting(SPOOF_SETTING, DEFAULT_SPOOF_IP);
        let mut headers = HashMap::new();
        if !spoof_ip.trim().is_empty() {
            headers.insert(SPOOF_HEADER.to_string(), spoof_ip);
        }
        headers
    }

    /// Expand descriptor entries into `part`, in entry order.
    ///
    /// Manifest expansions run concurrently; their results are appended in
    /// the order of the entries that produced them. Every expansion sends
    /// the part's headers.
    #[instrument(skip_all, fields(entries = descriptors.len()))]
    pub async fn collect_streams(
        &self,
        part: &mut MediaPart,
        descriptors: Vec<StreamDescriptor>,
    ) -> Vec<SkippedEntry> {
        let headers = part.http_headers.clone();
        let hls = HlsAdapter::new();
        let renditions = RenditionAdapter::new().with_swf_url(self.config.swf_url.clone());
        let adapters: [&dyn ManifestAdapter; 2] = [&hls, &renditions];

        let expansions = descriptors.iter().map(|descriptor| {
            let headers = &headers;
            let dialect = descriptor.dialect();
            let adapter = adapters.iter().copied().find(|a| a.dialect() == dialect);
            async move {
                match adapter {
                    Some(adapter) => Some(
                        adapter
                            .expand(
                                self.transport,
                                self.config.proxy.as_deref(),
                                &descriptor.url,
                                headers,
                            )
                            .await,
                    ),
                    None => None,
                }
            }
        });
        let expanded: Vec<Option<Result<Vec<MediaStream>>>> = join_all(expansions).await;

        let mut skipped = Vec::new();
        for (descriptor, expansion) in descriptors.iter().zip(expanded) {
            let dialect = descriptor.dialect();
            match (dialect, expansion) {
                (_, Some(Ok(streams))) => {
                    let added = part.extend_streams(streams);
                    debug!("{:?} {} -> {added} streams", dialect, descriptor.url);
                }
                (_, Some(Err(e))) => {
                    warn!("Skipping {}: {e}", descriptor.url);
                    skipped.push(SkippedEntry::new(&descriptor.url, e));
                }
                (Dialect::Direct, None) => {
                    let bitrate = descriptor.bitrate.unwrap_or_default();
                    let url = renditions.verifiable_url(&descriptor.url);
                    if !part.append_stream(url, bitrate) {
                        skipped.push(SkippedEntry::new(&descriptor.url, "unusable direct stream"));
                    }
                }
                (dialect, None) => {
                    debug!("Skipping {:?} entry {}", dialect, descriptor.url);
                    skipped.push(SkippedEntry::new(
                        &descriptor.url,
                        ChannelError::UnsupportedDialect(format!("{dialect:?}")),
                    ));
                }
            }
        }
        skipped
    }

    /// Fetch a subtitle, correct its hours and store it in the cache.
    ///
    /// Failures are returned as a skipped entry; the part keeps no subtitle.
    pub async fn attach_subtitle(&self, part: &mut MediaPart, url: &str) -> Option<SkippedEntry> {
        match self.store_subtitle(url).await {
            Ok(path) => {
                debug!("Saving subtitle to: {}", path.display());
                part.subtitle_path = Some(path);
                None
            }
            Err(e) => {
                warn!("Subtitle {url} unavailable: {e}");
                Some(SkippedEntry::new(url, e))
            }
        }
    }

    async fn store_subtitle(&self, url: &str) -> Result<PathBuf> {
        let raw = self.fetch_text(url).await?;
        let fixed = correct_hours(&raw);
        self.cache
            .write_file(&subtitle_file_name(url), fixed.as_bytes())
            .await
    }
}
