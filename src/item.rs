//! Browsable items and their playable media.
//!
//! An [`Item`] is a node in the channel hierarchy. Folders, episodes and
//! page cursors are complete as soon as they are created. Videos start out
//! [`ResolutionState::Pending`] and only become playable once a stream
//! resolver attaches a [`MediaPart`] with at least one stream.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// What kind of node an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Episode,
    Page,
    Video,
}

impl ItemKind {
    /// Lowercase label used in CLI output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Episode => "episode",
            Self::Page => "page",
            Self::Video => "video",
        }
    }

    /// Kinds that fall back to the channel placeholder image.
    #[must_use]
    pub fn uses_placeholder(self) -> bool {
        matches!(self, Self::Folder | Self::Video)
    }
}

/// Resolution progress of a video item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Never attempted, or re-queued after a failure.
    Pending,
    /// A resolver is running.
    Fetching,
    /// At least one stream is attached.
    Resolved,
    /// The last attempt produced no streams.
    Failed,
}

/// One playable rendition: a URL and its bitrate in kbps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaStream {
    pub url: String,
    pub bitrate: u32,
}

/// A playable part of a video.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaPart {
    /// Headers sent with every fetch of this part's streams.
    pub http_headers: HashMap<String, String>,
    streams: Vec<MediaStream>,
    /// Local path of the normalized subtitle file.
    pub subtitle_path: Option<PathBuf>,
}

impl MediaPart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Part that sends the given headers with every stream fetch.
    #[must_use]
    pub fn with_headers(http_headers: HashMap<String, String>) -> Self {
        Self {
            http_headers,
            ..Self::default()
        }
    }

    /// Append a stream. Returns `false` (and drops it) when the bitrate is
    /// zero or the URL is empty.
    pub fn append_stream(&mut self, url: impl Into<String>, bitrate: u32) -> bool {
        let url = url.into();
        if bitrate == 0 || url.trim().is_empty() {
            debug!("Dropping stream without bitrate or url: {url:?} @ {bitrate}");
            return false;
        }
        self.streams.push(MediaStream { url, bitrate });
        true
    }

    /// Append every stream from an adapter result.
    pub fn extend_streams(&mut self, streams: impl IntoIterator<Item = MediaStream>) -> usize {
        streams
            .into_iter()
            .filter(|s| self.append_stream(s.url.clone(), s.bitrate))
            .count()
    }

    #[must_use]
    pub fn streams(&self) -> &[MediaStream] {
        &self.streams
    }

    /// Highest-bitrate stream, if any.
    #[must_use]
    pub fn best_stream(&self) -> Option<&MediaStream> {
        self.streams.iter().max_by_key(|s| s.bitrate)
    }
}

/// A node in the browsing hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub kind: ItemKind,
    pub name: String,
    /// URL used to fetch the item's children or its stream data.
    pub url: String,
    pub thumbnail: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub published: Option<NaiveDate>,
    state: ResolutionState,
    parts: Vec<MediaPart>,
}

impl Item {
    fn new(kind: ItemKind, name: impl Into<String>, url: impl Into<String>) -> Self {
        let state = if kind == ItemKind::Video {
            ResolutionState::Pending
        } else {
            ResolutionState::Resolved
        };
        Self {
            kind,
            name: name.into(),
            url: url.into(),
            thumbnail: None,
            icon: None,
            description: None,
            published: None,
            state,
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn folder(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ItemKind::Folder, name, url)
    }

    #[must_use]
    pub fn episode(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ItemKind::Episode, name, url)
    }

    #[must_use]
    pub fn page(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ItemKind::Page, name, url)
    }

    /// A video awaiting stream resolution.
    #[must_use]
    pub fn video(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ItemKind::Video, name, url)
    }

    /// Publication date, if the listing carried one.
    #[must_use]
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.published = date;
        self
    }

    /// Attach a directly playable stream found in the listing itself.
    ///
    /// The item is only marked resolved if the stream was accepted.
    #[must_use]
    pub fn with_direct_stream(mut self, url: impl Into<String>, bitrate: u32) -> Self {
        let mut part = MediaPart::new();
        if part.append_stream(url, bitrate) {
            self.parts.push(part);
            self.state = ResolutionState::Resolved;
        }
        self
    }

    /// Set the publication date from year/month/day. Invalid dates are ignored.
    pub fn set_date(&mut self, year: i32, month: u32, day: u32) -> bool {
        self.published = NaiveDate::from_ymd_opt(year, month, day);
        self.published.is_some()
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        self.state
    }

    #[must_use]
    pub fn parts(&self) -> &[MediaPart] {
        &self.parts
    }

    /// Total number of streams across all parts.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.parts.iter().map(|p| p.streams().len()).sum()
    }

    /// True when nothing further is needed to display or play the item.
    ///
    /// A video only counts as complete with at least one stream attached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self.kind {
            ItemKind::Video => self.state == ResolutionState::Resolved && self.stream_count() > 0,
            _ => true,
        }
    }

    /// Pending → Fetching. Returns `false` for any other starting state.
    pub(crate) fn begin_resolution(&mut self) -> bool {
        if self.kind != ItemKind::Video || self.state != ResolutionState::Pending {
            return false;
        }
        self.state = ResolutionState::Fetching;
        true
    }

    /// Fetching → Resolved with the given part, or Failed if it has no streams.
    pub(crate) fn finish_resolution(&mut self, part: Option<MediaPart>) -> ResolutionState {
        if self.state != ResolutionState::Fetching {
            warn!("finish_resolution called on {:?} item {}", self.state, self.name);
            return self.state;
        }
        match part {
            Some(part) if !part.streams().is_empty() => {
                self.parts = vec![part];
                self.state = ResolutionState::Resolved;
            }
            _ => {
                self.parts.clear();
                self.state = ResolutionState::Failed;
            }
        }
        self.state
    }

    /// Failed or Fetching → Pending so a resolver can be retried.
    ///
    /// An item left in Fetching belongs to an attempt that was dropped
    /// before it finished (timeout, cancelled task).
    pub fn requeue(&mut self) -> bool {
        if matches!(self.state, ResolutionState::Failed | ResolutionState::Fetching) {
            self.state = ResolutionState::Pending;
            true
        } else {
            false
        }
    }

    /// Safety net: a video marked resolved without streams goes back to
    /// pending. Returns `true` if the item was demoted.
    pub(crate) fn demote_if_empty(&mut self) -> bool {
        if self.kind == ItemKind::Video
            && self.state == ResolutionState::Resolved
            && self.stream_count() == 0
        {
            warn!("Video {} claimed completeness without streams", self.name);
            self.state = ResolutionState::Pending;
            return true;
        }
        false
    }
}
