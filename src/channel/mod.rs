//! A channel: configuration plus parser bindings.
//!
//! [`Channel`] drives the two user-facing operations:
//!
//! - [`Channel::process_folder_list`]: fetch a listing URL and turn it into
//!   items (preprocess, extract, create, paginate)
//! - [`Channel::update_video_item`]: resolve a selected video into streams
//!
//! Neither ever fails. Unroutable URLs, fetch errors and bad payloads end
//! up as an empty listing or an unplayable video, with a warning logged.

mod config;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

pub use config::ChannelConfig;

use crate::config::Settings;
use crate::error::Result;
use crate::http_client::Transport;
use crate::item::{Item, ItemKind, ResolutionState};
use crate::parser::{ParserRegistry, Preprocessed};
use crate::stream::{ResolveContext, ResolveOutcome};

/// A configured channel.
#[derive(Debug)]
pub struct Channel {
    config: Arc<ChannelConfig>,
    registry: ParserRegistry,
}

impl Channel {
    #[must_use]
    pub fn new(config: ChannelConfig, registry: ParserRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    /// Layer the settings file over the channel's code defaults.
    #[must_use]
    pub fn with_settings(self, settings: &Settings) -> Self {
        let config = Arc::unwrap_or_clone(self.config).apply_settings(settings);
        Self {
            config: Arc::new(config),
            registry: self.registry,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.config.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Root folder of the channel.
    #[must_use]
    pub fn main_list_item(&self) -> Item {
        let mut item = Item::folder(&self.config.name, &self.config.main_list_url);
        item.icon = self.config.icon_uri();
        item.thumbnail = self.config.placeholder();
        item
    }

    /// Parse already fetched listing content for `url`.
    ///
    /// Preprocessor items come first, then extracted items in document
    /// order, then page items. Page links are looked for in the raw
    /// content, since the preprocessor may cut them off. A page item that
    /// points back at `url` (or repeats an earlier page) is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoBindingFound`](crate::ChannelError::NoBindingFound)
    /// when no binding applies to `url`.
    pub fn parse_listing(&self, url: &str, content: &str) -> Result<Vec<Item>> {
        let binding = self.registry.resolve(url)?;
        let config = self.config.as_ref();

        let Preprocessed {
            content: trimmed,
            items: embedded,
        } = binding
            .preprocessor
            .as_ref()
            .map_or_else(|| Preprocessed::unchanged(content), |pre| pre(content));

        let mut listing: Vec<Item> = embedded.into_iter().map(|item| self.decorate(item)).collect();

        let records = binding.extractor.extract(&trimmed);
        debug!("{} records extracted from {url}", records.len());
        for fields in &records {
            match (binding.creator)(config, fields) {
                Some(item) => listing.push(self.decorate(item)),
                None => debug!("Record dropped by item factory: {fields:?}"),
            }
        }

        if let Some(pagination) = &binding.pagination {
            let mut seen: HashSet<String> = HashSet::new();
            for fields in pagination.extractor.extract(content) {
                let Some(page) = (pagination.creator)(config, &fields) else {
                    continue;
                };
                if page.url == url || !seen.insert(page.url.clone()) {
                    debug!("Skipping non-advancing page {}", page.url);
                    continue;
                }
                listing.push(self.decorate(page));
            }
        }

        Ok(listing)
    }

    /// Fetch and parse the listing behind `parent`.
    ///
    /// Returns an empty list (and logs why) on any failure.
    #[instrument(skip(self, transport, parent), fields(channel = %self.config.code, url = %parent.url))]
    pub async fn process_folder_list(&self, transport: &dyn Transport, parent: &Item) -> Vec<Item> {
        if let Err(e) = self.registry.resolve(&parent.url) {
            warn!("Rendering nothing: {e}");
            return Vec::new();
        }

        let content = match transport
            .fetch_text(&parent.url, self.config.proxy.as_deref(), &Default::default())
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("Listing unavailable: {e}");
                return Vec::new();
            }
        };

        match self.parse_listing(&parent.url, &content) {
            Ok(items) => {
                info!("{} items for {}", items.len(), parent.name);
                items
            }
            Err(e) => {
                warn!("Rendering nothing: {e}");
                Vec::new()
            }
        }
    }

    /// Resolve a video item into playable streams.
    ///
    /// Only pending videos are fetched. A resolved video reports its
    /// current streams; a failed one must be [`Item::requeue`]d first.
    #[instrument(skip(self, transport, item), fields(channel = %self.config.code, url = %item.url))]
    pub async fn update_video_item(&self, transport: &dyn Transport, item: &mut Item) -> ResolveOutcome {
        if item.kind != ItemKind::Video {
            return ResolveOutcome::Failed {
                reason: format!("{} items have no streams", item.kind.label()),
            };
        }

        item.demote_if_empty();
        match item.state() {
            ResolutionState::Resolved => {
                return ResolveOutcome::Resolved {
                    streams: item.stream_count(),
                };
            }
            ResolutionState::Failed => {
                return ResolveOutcome::Failed {
                    reason: "previous attempt failed; requeue to retry".to_string(),
                };
            }
            // &mut access rules out a concurrent run, so this is a dropped attempt
            ResolutionState::Fetching => {
                warn!("Restarting interrupted resolution of {}", item.name);
                item.requeue();
            }
            ResolutionState::Pending => {}
        }

        if !item.begin_resolution() {
            return ResolveOutcome::Failed {
                reason: format!("{:?} item cannot start resolving", item.state()),
            };
        }
        debug!("Starting update_video_item for {} ({})", item.name, self.config.name);

        let resolver = match self.registry.resolve(&item.url) {
            Ok(binding) => binding.resolver.clone(),
            Err(e) => {
                warn!("No binding for video: {e}");
                None
            }
        };
        let Some(resolver) = resolver else {
            item.finish_resolution(None);
            return ResolveOutcome::Failed {
                reason: format!("no stream resolver for {}", item.url),
            };
        };

        let cache = self.config.cache();
        let ctx = ResolveContext::new(&self.config, transport, &cache);
        let outcome = match resolver.resolve(&ctx, item).await {
            Ok(resolution) => {
                let skipped = resolution.skipped;
                match item.finish_resolution(Some(resolution.part)) {
                    ResolutionState::Resolved if skipped.is_empty() => ResolveOutcome::Resolved {
                        streams: item.stream_count(),
                    },
                    ResolutionState::Resolved => ResolveOutcome::PartiallyResolved {
                        streams: item.stream_count(),
                        skipped,
                    },
                    _ => ResolveOutcome::Failed {
                        reason: format!("no playable streams ({} entries skipped)", skipped.len()),
                    },
                }
            }
            Err(e) => {
                item.finish_resolution(None);
                ResolveOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        item.demote_if_empty();
        match &outcome {
            ResolveOutcome::Failed { reason } => {
                warn!("{} ({}) is unplayable: {reason}", item.name, resolver.name());
            }
            _ => info!("{} resolved: {} streams", item.name, item.stream_count()),
        }
        outcome
    }

    /// Fill in placeholder images the factory left empty.
    fn decorate(&self, mut item: Item) -> Item {
        if item.thumbnail.is_none() && item.kind.uses_placeholder() {
            item.thumbnail = self.config.placeholder();
        }
        if item.icon.is_none() {
            item.icon = self.config.icon_uri();
        }
        item
    }
}
