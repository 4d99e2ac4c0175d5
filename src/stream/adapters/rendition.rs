//! XML rendition ladder adapter
//!
//! Mediagen-style documents list one `<rendition>` per bitrate:
//!
//! ```xml
//! <rendition cdn="akamai" duration="660" width="640" height="360" bitrate="700" type="video/mp4">
//!   <src>rtmpe://cp12345.edgefcs.net/ondemand/mtvnorigin/nick/clip_640x360_700.mp4</src>
//! </rendition>
//! ```
//!
//! Each source is split into its RTMP application base (up to and
//! including `ondemand`) and the relative play path, then recombined.
//! Sources without an `ondemand` application are dropped.
//! When the channel has a player SWF configured the URL is made
//! verifiable by appending `swfurl=... swfvfy=1`.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::http_client::Transport;
use crate::item::MediaStream;
use crate::stream::adapter::ManifestAdapter;
use crate::stream::dialect::Dialect;

static RENDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<rendition\b[^>]*?\bbitrate="(?P<bitrate>\d+)"[^>]*>\s*<src>(?P<src>[^<]+)</src>"#)
        .expect("static rendition pattern")
});

/// Rendition ladder adapter
#[derive(Debug, Clone, Default)]
pub struct RenditionAdapter {
    swf_url: Option<String>,
}

impl RenditionAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make RTMP URLs verifiable against this player SWF.
    #[must_use]
    pub fn with_swf_url(mut self, swf_url: Option<String>) -> Self {
        self.swf_url = swf_url;
        self
    }

    /// Parse renditions in document order.
    #[must_use]
    pub fn parse_renditions(&self, document: &str) -> Vec<MediaStream> {
        RENDITION
            .captures_iter(document)
            .filter_map(|caps| {
                let bitrate: u32 = caps["bitrate"].parse().ok()?;
                let src = caps["src"].trim();
                let Some((base, play_path)) = split_source(src) else {
                    debug!("Skipping rendition without application base: {src}");
                    return None;
                };
                Some(MediaStream {
                    url: self.verifiable_url(&format!("{base}/{play_path}")),
                    bitrate,
                })
            })
            .collect()
    }

    /// Append SWF verification parameters to RTMP URLs.
    #[must_use]
    pub fn verifiable_url(&self, url: &str) -> String {
        match &self.swf_url {
            Some(swf) if url.starts_with("rtmp") => format!("{url} swfurl={swf} swfvfy=1"),
            _ => url.to_string(),
        }
    }
}

/// Split a rendition source into application base and play path.
///
/// The base runs up to the last `ondemand` segment. Sources without one
/// are not playable over RTMP and yield `None`.
fn split_source(src: &str) -> Option<(&str, &str)> {
    const APP: &str = "ondemand/";
    let idx = src.rfind(APP)?;
    let split = idx + APP.len() - 1;
    let play_path = &src[split + 1..];
    (idx > 0 && !play_path.is_empty()).then(|| (&src[..split], play_path))
}

#[async_trait]
impl ManifestAdapter for RenditionAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Renditions
    }

    #[instrument(skip(self, transport, headers))]
    async fn expand(
        &self,
        transport: &dyn Transport,
        proxy: Option<&str>,
        manifest_url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<MediaStream>> {
        let document = transport.fetch_text(manifest_url, proxy, headers).await?;
        let streams = self.parse_renditions(&document);
        debug!("Found {} renditions", streams.len());
        Ok(streams)
    }
}
