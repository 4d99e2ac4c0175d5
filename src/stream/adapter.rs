//! Manifest adapter trait.
//!
//! A [`ManifestAdapter`] fetches one stream description document and
//! expands it into ranked `(url, bitrate)` pairs. Two implementations are
//! available: [`HlsAdapter`](super::adapters::HlsAdapter) for adaptive
//! master playlists and
//! [`RenditionAdapter`](super::adapters::RenditionAdapter) for XML
//! bitrate ladders.

use std::collections::HashMap;

use async_trait::async_trait;

use super::dialect::Dialect;
use crate::error::Result;
use crate::http_client::Transport;
use crate::item::MediaStream;

/// Decoder for one stream description dialect.
#[async_trait]
pub trait ManifestAdapter: Send + Sync {
    /// The dialect this adapter decodes.
    fn dialect(&self) -> Dialect;

    /// Fetch `manifest_url` with the caller's `headers` and list its
    /// variants.
    ///
    /// A manifest without variants yields an empty list, not an error.
    /// Fetch failures are errors so the caller can skip the entry.
    async fn expand(
        &self,
        transport: &dyn Transport,
        proxy: Option<&str>,
        manifest_url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<MediaStream>>;
}
