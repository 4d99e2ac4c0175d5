//! Stream descriptor classification.

use serde::Serialize;

/// Stream description format of one descriptor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// HLS master playlist advertising several variants.
    Adaptive,
    /// XML rendition ladder (one RTMP/HTTP source per bitrate).
    Renditions,
    /// A single media URL with a known bitrate.
    Direct,
    /// Flash HDS manifest, kept by sites only for old players.
    LegacyFlash,
    Unsupported,
}

impl Dialect {
    /// Whether an adapter exists for this dialect.
    #[must_use]
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::LegacyFlash | Self::Unsupported)
    }
}

/// One site-provided entry describing how to obtain media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub url: String,
    /// Site format tag such as `"hls"` or `"hds"`, if given.
    pub format: Option<String>,
    /// Bitrate in kbps, if given.
    pub bitrate: Option<u32>,
}

impl StreamDescriptor {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            bitrate: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Classify this entry.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        classify(self)
    }
}

/// Classify a descriptor by its URL, falling back to the format tag when
/// the URL does not name a known manifest type.
#[must_use]
pub fn classify(descriptor: &StreamDescriptor) -> Dialect {
    let path = descriptor
        .url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if path.ends_with(".f4m") {
        return Dialect::LegacyFlash;
    }
    if path.ends_with(".m3u8") {
        return Dialect::Adaptive;
    }
    if path.contains("mediagen") {
        return Dialect::Renditions;
    }

    let format = descriptor
        .format
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match format.as_str() {
        "hds" | "f4m" | "flash" => Dialect::LegacyFlash,
        "mediagen" => Dialect::Renditions,
        f if f == "hls" || f.starts_with("hls-") => Dialect::Adaptive,
        _ if descriptor.bitrate.is_some_and(|b| b > 0) => Dialect::Direct,
        _ => Dialect::Unsupported,
    }
}
