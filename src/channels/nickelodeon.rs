//! Nickelodeon (NL and NO sites).
//!
//! Both sites share markup and the MTVN media backend; only the base and
//! main list URLs differ. Video pages embed a playlist GUID that resolves
//! through three documents:
//!
//! 1. video page HTML → playlist GUID
//! 2. MRSS playlist (`api.mtvnn.com`) → mediagen URL
//! 3. mediagen XML → RTMP rendition ladder

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::channel::{Channel, ChannelConfig};
use crate::error::{ChannelError, Result};
use crate::item::{Item, MediaPart};
use crate::parser::preprocess::truncate_at;
use crate::parser::{decode_entities, Binding, Extractor, Fields, PageCursor, ParserRegistry, UrlMatch};
use crate::stream::{ResolveContext, Resolution, StreamDescriptor, StreamResolver};

use super::ChannelInfo;

pub(super) const CHANNELS: &[ChannelInfo] = &[
    ChannelInfo {
        code: "nickelodeon",
        name: "Nickelodeon",
        language: "nl",
    },
    ChannelInfo {
        code: "nickno",
        name: "Nickelodeon Norge",
        language: "no",
    },
];

pub const SWF_URL: &str = "http://origin-player.mtvnn.com/g2/g2player_2.1.7.swf";

const MRSS_URL: &str =
    "http://api.mtvnn.com/v2/mrss.xml?uri=mgid%3Asensei%3Avideo%3Amtvnn.com%3Alocal_playlist-";

/// Marks the start of the Nick Jr. rows on the show index.
pub const NICK_JR_MARKER: &str = "<h2 class='row-title'>Nick Jr";

/// Markers of the "related videos" block on video pages (per site language).
pub const RELATED_MARKERS: &[&str] = &[
    "<li class=\"divider playlist-item\">",
    "<p>Liknande videos</p>",
    "<p>Lignende videoer</p>",
    "<p>Andere leuke video’s</p>",
];

const EPISODE_PATTERN: &str = concat!(
    r#"<a[^>]+href="(?P<url>/[^"]+)"[^>]*>\W*<img[^>]+src='(?P<thumburl>[^']+)'[^>]*>\W*"#,
    r#"<div class='info'>\W+<h2 class='title'>(?P<title>[^<]+)</h2>\W+"#,
    r#"<p class='sub_title'>(?P<description>[^<]+)</p>"#,
);

const VIDEO_PATTERN: &str = concat!(
    r#"<li[^>]+data-item-id='\d+'>\W+<a href='(?P<url>[^']+)'>\W+"#,
    r#"<img[^>]+src="(?P<thumburl>[^"]+)"[^>]*>\W+<p class='title'>(?P<title>[^<]+)</p>\W+"#,
    r#"<p[^>]+class='subtitle'[^>]*>(?P<subtitle>[^>]+)</p>"#,
);

const PAGE_PATTERN: &str = r#"href="(?P<url>/video[^?"]+\?page_\d*=)(?P<page>\d+)""#;

static PLAYLIST_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<div[^>]+data-playlist-id='(?P<guid>[^']+)'[^>]+></div>").expect("static playlist pattern")
});

static LOCAL_PLAYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"local_playlist[", -]+(?P<guid>[a-f0-9]{20})""#).expect("static playlist pattern")
});

static MEDIA_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<media:content[^>]+url="(?P<url>[^"]+)&amp;force_country="#).expect("static mrss pattern")
});

/// Build the channel for one of the site codes.
///
/// # Errors
///
/// Fails for codes this module does not serve.
pub fn build(code: &str) -> Result<Channel> {
    let config = config(code)?;
    let registry = registry(&config.main_list_url)?;
    Ok(Channel::new(config, registry))
}

/// Code defaults for `code`.
pub fn config(code: &str) -> Result<ChannelConfig> {
    let (name, base_url, main_list_url, language) = match code {
        "nickelodeon" => (
            "Nickelodeon",
            "http://www.nickelodeon.nl",
            "http://www.nickelodeon.nl/shows",
            "nl",
        ),
        "nickno" => (
            "Nickelodeon Norge",
            "http://www.nickelodeon.no",
            "http://www.nickelodeon.no/program/",
            "no",
        ),
        _ => return Err(ChannelError::Config(format!("unknown channel code {code:?}"))),
    };

    Ok(ChannelConfig::new(code, name, base_url)?
        .with_language(language)
        .with_main_list_url(main_list_url)
        .with_no_image("nickelodeonimage.png")
        .with_icon("nickelodeonicon.png")
        .with_texture_folder("channel.nick.nickelodeon")
        .with_swf_url(SWF_URL))
}

/// Show index first, then video pages for everything else.
pub fn registry(main_list_url: &str) -> Result<ParserRegistry> {
    Ok(ParserRegistry::new()
        .with(
            Binding::new(
                UrlMatch::exact(main_list_url),
                Extractor::regex(EPISODE_PATTERN)?,
                create_episode_item,
            )
            .with_preprocessor(truncate_at(&[NICK_JR_MARKER])),
        )
        .with(
            Binding::new(UrlMatch::Wildcard, Extractor::regex(VIDEO_PATTERN)?, create_video_item)
                .with_preprocessor(truncate_at(RELATED_MARKERS))
                .with_pagination(Extractor::regex(PAGE_PATTERN)?, PageCursor::new().into_factory())
                .with_resolver(NickResolver),
        ))
}

/// Show folder.
#[must_use]
pub fn create_episode_item(config: &ChannelConfig, fields: &Fields) -> Option<Item> {
    let title = decode_entities(fields.get("title")?);
    let url = config.absolute_url(&decode_entities(fields.get("url")?));

    let mut item = Item::folder(title, url);
    item.thumbnail = fields.get("thumburl").map(|t| config.absolute_url(t));
    item.description = fields.get("description").map(decode_entities);
    Some(item)
}

/// Video tile, named `"<title> - <subtitle>"` when a subtitle is present.
#[must_use]
pub fn create_video_item(config: &ChannelConfig, fields: &Fields) -> Option<Item> {
    let title = decode_entities(fields.get("title")?);
    let url = config.absolute_url(&decode_entities(fields.get("url")?));

    let name = match fields.get("subtitle") {
        Some(subtitle) => format!("{title} - {}", decode_entities(subtitle)),
        None => title,
    };

    let mut item = Item::video(name, url);
    item.thumbnail = fields.get("thumburl").map(|t| config.absolute_url(t));
    Some(item)
}

/// Resolves video pages through the MTVN playlist chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct NickResolver;

impl NickResolver {
    /// Playlist GUID embedded in a video page.
    ///
    /// Older pages carry a `data-playlist-id` attribute, newer ones only a
    /// `local_playlist` reference in inline script.
    #[must_use]
    pub fn playlist_guid(page: &str) -> Option<&str> {
        PLAYLIST_ID
            .captures(page)
            .or_else(|| LOCAL_PLAYLIST.captures(page))
            .and_then(|caps| caps.name("guid"))
            .map(|m| m.as_str())
    }

    /// MRSS feed for a playlist GUID. The GUID is scraped, so it is encoded
    /// before landing in the `uri` query value.
    #[must_use]
    pub fn playlist_url(guid: &str) -> String {
        format!("{MRSS_URL}{}", urlencoding::encode(guid))
    }

    /// Mediagen URL of the first playlist entry.
    #[must_use]
    pub fn mediagen_url(playlist: &str) -> Option<String> {
        MEDIA_CONTENT
            .captures(playlist)
            .map(|caps| decode_entities(&caps["url"]))
    }
}

#[async_trait]
impl StreamResolver for NickResolver {
    fn name(&self) -> &'static str {
        "mtvn-playlist"
    }

    async fn resolve(&self, ctx: &ResolveContext<'_>, item: &Item) -> Result<Resolution> {
        let page = ctx.fetch_text(&item.url).await?;
        let guid = Self::playlist_guid(&page)
            .ok_or_else(|| ChannelError::MalformedPayload("no playlist id on video page".to_string()))?;
        trace!("Playlist GUID {guid}");

        let playlist = ctx.fetch_text(&Self::playlist_url(guid)).await?;
        let mediagen = Self::mediagen_url(&playlist)
            .ok_or_else(|| ChannelError::MalformedPayload("playlist has no media content".to_string()))?;
        debug!("Mediagen: {mediagen}");

        let mut part = MediaPart::new();
        let descriptor = StreamDescriptor::new(mediagen).with_format("mediagen");
        let skipped = ctx.collect_streams(&mut part, vec![descriptor]).await;
        Ok(Resolution { part, skipped })
    }
}
