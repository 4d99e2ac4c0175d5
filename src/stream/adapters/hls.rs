//! HLS master playlist adapter
//!
//! Expands an adaptive master playlist into one stream per
//! `#EXT-X-STREAM-INF` variant. Supports:
//! - Quoted and unquoted attribute values
//! - Relative, root-relative and absolute variant URIs
//! - Bitrates reported in kbps (`BANDWIDTH` / 1000)

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::error::Result;
use crate::http_client::Transport;
use crate::item::MediaStream;
use crate::stream::adapter::ManifestAdapter;
use crate::stream::dialect::Dialect;

/// Adaptive (HLS) manifest adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct HlsAdapter;

impl HlsAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse master playlist content into variants, in playlist order.
    #[must_use]
    pub fn parse_master_playlist(content: &str, manifest_url: &str) -> Vec<HlsVariant> {
        let mut variants = Vec::new();
        let mut lines = content.lines().map(str::trim).peekable();

        while let Some(line) = lines.next() {
            let Some(rest) = line.strip_prefix("#EXT-X-STREAM-INF:") else {
                continue;
            };
            let attrs = Self::parse_attributes(rest);
            let bandwidth = attrs
                .get("BANDWIDTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let height = attrs
                .get("RESOLUTION")
                .and_then(|r| r.split('x').nth(1))
                .and_then(|h| h.parse().ok());

            while lines.peek().is_some_and(|l| l.is_empty()) {
                lines.next();
            }
            if let Some(uri_line) = lines.next_if(|l| !l.starts_with('#')) {
                variants.push(HlsVariant {
                    bandwidth,
                    height,
                    codecs: attrs.get("CODECS").cloned(),
                    uri: Self::resolve_url(manifest_url, uri_line),
                });
            }
        }

        variants
    }

    /// Turn variants into streams, lowest bitrate first.
    ///
    /// Variants without a usable `BANDWIDTH` are dropped.
    #[must_use]
    pub fn streams_from_variants(variants: &[HlsVariant]) -> Vec<MediaStream> {
        let mut streams: Vec<MediaStream> = variants
            .iter()
            .filter_map(|v| {
                let kbps = u32::try_from(v.bandwidth / 1000).ok()?;
                (kbps > 0).then(|| MediaStream {
                    url: v.uri.clone(),
                    bitrate: kbps,
                })
            })
            .collect();
        streams.sort_by_key(|s| s.bitrate);
        streams
    }

    fn parse_attributes(attr_str: &str) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        let mut chars = attr_str.chars().peekable();

        while chars.peek().is_some() {
            // Parse key
            let key: String = chars.by_ref().take_while(|&c| c != '=').collect();

            if key.is_empty() {
                break;
            }

            // Parse value (handle quoted values)
            let value = if chars.peek() == Some(&'"') {
                chars.next(); // consume opening quote
                let v: String = chars.by_ref().take_while(|&c| c != '"').collect();
                chars.next(); // consume comma if present
                v
            } else {
                chars.by_ref().take_while(|&c| c != ',').collect()
            };

            attrs.insert(key.trim().to_string(), value.trim().to_string());
        }

        attrs
    }

    fn resolve_url(manifest_url: &str, relative: &str) -> String {
        Url::parse(manifest_url)
            .and_then(|base| base.join(relative))
            .map_or_else(|_| relative.to_string(), |u| u.to_string())
    }
}

#[async_trait]
impl ManifestAdapter for HlsAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Adaptive
    }

    #[instrument(skip(self, transport, headers))]
    async fn expand(
        &self,
        transport: &dyn Transport,
        proxy: Option<&str>,
        manifest_url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<MediaStream>> {
        let content = transport.fetch_text(manifest_url, proxy, headers).await?;
        let variants = Self::parse_master_playlist(&content, manifest_url);
        debug!("Found {} quality variants", variants.len());
        Ok(Self::streams_from_variants(&variants))
    }
}

/// One `#EXT-X-STREAM-INF` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsVariant {
    /// Bits per second.
    pub bandwidth: u64,
    pub height: Option<u32>,
    pub codecs: Option<String>,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::testing::FakeTransport;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"\n\
hls-720.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=500000,RESOLUTION=480x270\n\
\n\
/vod/hls-270.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=1200000\n\
https://cdn.example.com/hls-480.m3u8\n";

    const MANIFEST_URL: &str = "https://svt.example.com/d/123/master.m3u8?alt=1";

    #[test]
    fn test_parse_attributes() {
        let attrs = HlsAdapter::parse_attributes("BANDWIDTH=1280000,RESOLUTION=720x480");
        assert_eq!(attrs.get("BANDWIDTH"), Some(&"1280000".to_string()));
        assert_eq!(attrs.get("RESOLUTION"), Some(&"720x480".to_string()));

        let attrs2 =
            HlsAdapter::parse_attributes("CODECS=\"avc1.4d401f,mp4a.40.2\",BANDWIDTH=2000000");
        assert_eq!(
            attrs2.get("CODECS"),
            Some(&"avc1.4d401f,mp4a.40.2".to_string())
        );
        assert_eq!(attrs2.get("BANDWIDTH"), Some(&"2000000".to_string()));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            HlsAdapter::resolve_url("https://example.com/path/master.m3u8", "video.m3u8"),
            "https://example.com/path/video.m3u8"
        );
        assert_eq!(
            HlsAdapter::resolve_url("https://example.com/path/master.m3u8", "/video.m3u8"),
            "https://example.com/video.m3u8"
        );
        assert_eq!(
            HlsAdapter::resolve_url(
                "https://example.com/path/master.m3u8",
                "https://cdn.example.com/video.m3u8"
            ),
            "https://cdn.example.com/video.m3u8"
        );
    }

    #[test]
    fn parses_variants_in_playlist_order() {
        let variants = HlsAdapter::parse_master_playlist(MASTER, MANIFEST_URL);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].uri, "https://svt.example.com/d/123/hls-720.m3u8");
        assert_eq!(variants[0].height, Some(720));
        assert_eq!(variants[1].uri, "https://svt.example.com/vod/hls-270.m3u8");
        assert_eq!(variants[2].height, None);
    }

    #[test]
    fn streams_are_kbps_ascending() {
        let variants = HlsAdapter::parse_master_playlist(MASTER, MANIFEST_URL);
        let streams = HlsAdapter::streams_from_variants(&variants);
        let bitrates: Vec<u32> = streams.iter().map(|s| s.bitrate).collect();
        assert_eq!(bitrates, vec![500, 1200, 2800]);
    }

    #[test]
    fn media_playlist_has_no_variants() {
        let media = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:10,\nseg0.ts\n#EXT-X-ENDLIST\n";
        assert!(HlsAdapter::parse_master_playlist(media, MANIFEST_URL).is_empty());
    }

    #[tokio::test]
    async fn expand_sends_headers_and_is_deterministic() {
        let transport = FakeTransport::new().with(MANIFEST_URL, MASTER);
        let mut headers = HashMap::new();
        headers.insert("X-Forwarded-For".to_string(), "194.71.0.10".to_string());

        let first = HlsAdapter
            .expand(&transport, None, MANIFEST_URL, &headers)
            .await
            .unwrap();
        let second = HlsAdapter
            .expand(&transport, None, MANIFEST_URL, &headers)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(
            transport.headers_for(MANIFEST_URL).unwrap()["X-Forwarded-For"],
            "194.71.0.10"
        );
    }

    #[tokio::test]
    async fn expand_propagates_fetch_failure() {
        let result = HlsAdapter
            .expand(&FakeTransport::new(), None, MANIFEST_URL, &HashMap::new())
            .await;
        assert!(result.is_err());
    }
}
