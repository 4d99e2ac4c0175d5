//! SVT Öppet arkiv.
//!
//! Listing chain: title index (`/kategori/titel`) → program pages with
//! video tiles and `?sida=N` pagination. Videos resolve through the
//! `?output=json` descriptor, which carries HLS and HDS references plus
//! subtitle links.

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::channel::{Channel, ChannelConfig};
use crate::error::{ChannelError, Result};
use crate::item::{Item, MediaPart};
use crate::parser::date::parse_marked_date;
use crate::parser::pagination::append_params;
use crate::parser::{decode_entities, Binding, Extractor, Fields, PageCursor, ParserRegistry, UrlMatch};
use crate::stream::{ResolveContext, Resolution, StreamDescriptor, StreamResolver};

use super::ChannelInfo;

pub const CODE: &str = "oppetarkiv";
pub const BASE_URL: &str = "http://www.oppetarkiv.se";
pub const MAIN_LIST_URL: &str = "http://www.oppetarkiv.se/kategori/titel";

pub(super) const CHANNELS: &[ChannelInfo] = &[ChannelInfo {
    code: CODE,
    name: "Öppet arkiv",
    language: "se",
}];

const EPISODE_PATTERN: &str =
    r#"<li class="svtoa[^>]*>\W*<a[^>]+href="(?P<url>[^"]+)"[^>]*>(?P<title>[^<]+)</a>\W*</li>"#;

const VIDEO_PATTERN: &str = concat!(
    r#"<img[^>]+name="(?P<thumb>[^"]+)"[^>]+>\W+</figure>\W+<[^>]+>\W+"#,
    r#"(?:<h1[^>]+>(?P<season>[^<]*)</h1>\W+)?"#,
    r#"<h\d[^>]+><a[^>]+title="(?P<title>[^"]+)[^>]+href="(?P<url>[^"]+video/(?P<id>\d+)/[^"]*)"[^>]*>[^>]+</a></h\d>\W+"#,
    r#"<p class="svt-text-time[^>]+\W+(?P<date>[^>]+)"#,
);

const PAGE_PATTERN: &str =
    r#"<a href="(?P<url>http://www.oppetarkiv.se/[^?]+\?sida=)(?P<page>\d+)(?P<suffix>&amp;sort=[^"]+)"#;

const DATE_MARKER: &str = "datetime=\"";

/// Build the channel.
///
/// # Errors
///
/// Fails for codes this module does not serve.
pub fn build(code: &str) -> Result<Channel> {
    let config = config(code)?;
    Ok(Channel::new(config, registry()?))
}

/// Code defaults for `code`.
pub fn config(code: &str) -> Result<ChannelConfig> {
    if code != CODE {
        return Err(ChannelError::Config(format!("unknown channel code {code:?}")));
    }
    Ok(ChannelConfig::new(CODE, "Öppet arkiv", BASE_URL)?
        .with_language("se")
        .with_main_list_url(MAIN_LIST_URL)
        .with_no_image("oppetarkivimage.png")
        .with_icon("oppetarkivicon.png")
        .with_texture_folder("channel.se.oppetarkiv")
        .with_swf_url(&format!(
            "{BASE_URL}/public/swf/svtplayer-9017918b040e054d1e3c902fc13ceb5d.swf"
        )))
}

/// Listing bindings: the title index, then every other page.
pub fn registry() -> Result<ParserRegistry> {
    let cursor = PageCursor::new().keep_param("embed", "true");
    Ok(ParserRegistry::new()
        .with(Binding::new(
            UrlMatch::exact(MAIN_LIST_URL),
            Extractor::regex(EPISODE_PATTERN)?,
            create_episode_item,
        ))
        .with(
            Binding::new(UrlMatch::Wildcard, Extractor::regex(VIDEO_PATTERN)?, create_video_item)
                .with_pagination(Extractor::regex(PAGE_PATTERN)?, cursor.into_factory())
                .with_resolver(SvtResolver),
        ))
}

/// Program folder. Links to the embedded, oldest-first view of page 1.
#[must_use]
pub fn create_episode_item(config: &ChannelConfig, fields: &Fields) -> Option<Item> {
    trace!("{fields:?}");
    let title = fields.get("title")?;
    let href = decode_entities(fields.get("url")?);
    let url = append_params(
        &config.absolute_url(&href),
        &[
            ("sida".to_string(), "1".to_string()),
            ("sort".to_string(), "tid_stigande".to_string()),
            ("embed".to_string(), "true".to_string()),
        ],
    );

    Some(Item::folder(decode_entities(title), url))
}

/// Video tile. Resolution goes through the JSON descriptor.
#[must_use]
pub fn create_video_item(config: &ChannelConfig, fields: &Fields) -> Option<Item> {
    trace!("{fields:?}");
    let title = decode_entities(fields.get("title")?);
    let id = fields.get("id")?;

    let name = match fields.get("season") {
        Some(season) => format!("{} - {title}", decode_entities(season)),
        None => title,
    };
    let url = format!("{BASE_URL}/video/{id}?output=json");

    let published = fields
        .get("date")
        .and_then(|d| parse_marked_date(d, DATE_MARKER));
    let mut item = Item::video(name, url).with_date(published);
    if let Some(thumb) = fields.get("thumb") {
        item.thumbnail = Some(config.absolute_url(thumb));
    }
    Some(item)
}

/// Resolves `?output=json` descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvtResolver;

impl SvtResolver {
    /// Stream descriptors of a `video` object, in document order.
    #[must_use]
    pub fn descriptors(video: &Value) -> Vec<StreamDescriptor> {
        video
            .get("videoReferences")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|reference| {
                let url = reference.get("url")?.as_str()?;
                let mut descriptor = StreamDescriptor::new(url);
                if let Some(format) = reference.get("playerType").and_then(Value::as_str) {
                    descriptor = descriptor.with_format(format);
                }
                if let Some(bitrate) = reference
                    .get("bitrate")
                    .and_then(Value::as_u64)
                    .and_then(|b| u32::try_from(b).ok())
                {
                    descriptor = descriptor.with_bitrate(bitrate);
                }
                Some(descriptor)
            })
            .collect()
    }

    /// URL of the first subtitle reference.
    #[must_use]
    pub fn subtitle_url(video: &Value) -> Option<&str> {
        video
            .pointer("/subtitleReferences/0/url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
    }
}

#[async_trait]
impl StreamResolver for SvtResolver {
    fn name(&self) -> &'static str {
        "svt-json"
    }

    async fn resolve(&self, ctx: &ResolveContext<'_>, item: &Item) -> Result<Resolution> {
        let data = ctx.fetch_text(&item.url).await?;
        let json: Value = serde_json::from_str(&data)?;
        let video = json
            .get("video")
            .filter(|v| v.is_object())
            .ok_or_else(|| ChannelError::MalformedPayload("descriptor has no video data".to_string()))?;

        let mut part = MediaPart::with_headers(ctx.spoof_headers());
        let mut skipped = ctx.collect_streams(&mut part, Self::descriptors(video)).await;

        if let Some(subtitle) = Self::subtitle_url(video) {
            skipped.extend(ctx.attach_subtitle(&mut part, subtitle).await);
        }

        Ok(Resolution { part, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::testing::FakeTransport;
    use crate::item::{ItemKind, ResolutionState};
    use crate::stream::ResolveOutcome;
    use chrono::NaiveDate;

    const TITLE_INDEX: &str = r#"<ul class="svtoa-alphabet-list">
  <li class="svtoa-js-searchlist-item">
    <a class="svt-text-bread" href="/etikett/titel/Abba-dabba/">Abba dabba</a>
  </li>
  <li class="svtoa-js-searchlist-item">
    <a class="svt-text-bread" href="/etikett/titel/Hem%20till%20byn/">Hem till byn</a>
  </li>
</ul>"#;

    const PROGRAM_PAGE: &str = r#"<article class="svtUnit">
  <figure>
    <img class="svtHide" name="//www.svtstatic.se/image/medium/1/abc.jpg" alt="">
  </figure>
  <div class="svt-text">
    <h1 class="svt-heading-xs">Säsong 2</h1>
    <h3 class="svt-heading"><a class="svt-link" title="Avsnitt 4" href="/video/1234567/hem-till-byn-avsnitt-4">Avsnitt 4</a></h3>
    <p class="svt-text-time"><time datetime="1973-10-07T20:00:00+01:00">7 okt 1973</time></p>
  </div>
</article>
<article class="svtUnit">
  <figure>
    <img class="svtHide" name="/image/small/2/def.jpg" alt="">
  </figure>
  <div class="svt-text">
    <h3 class="svt-heading"><a class="svt-link" title="Julspecial" href="/video/7654321/julspecial">Julspecial</a></h3>
    <p class="svt-text-time">Okänt datum</p>
  </div>
</article>
<a href="http://www.oppetarkiv.se/etikett/titel/Hem%20till%20byn/?sida=2&amp;sort=tid_stigande">Visa fler</a>"#;

    const DESCRIPTOR: &str = r#"{
  "video": {
    "videoReferences": [
      {"url": "http://svtplay-f.akamaihd.net/z/o/1234567/manifest.f4m", "playerType": "flash"},
      {"url": "http://svtplay-i.akamaihd.net/i/o/1234567/master.m3u8", "playerType": "ios"}
    ],
    "subtitleReferences": [{"url": "http://media.svt.se/sub/1234567.srt"}]
  }
}"#;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=1600000,RESOLUTION=704x396\n\
index_3_av.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=320000,RESOLUTION=320x180\n\
index_1_av.m3u8\n";

    #[test]
    fn title_index_yields_folders() {
        let channel = build(CODE).unwrap();
        let items = channel.parse_listing(MAIN_LIST_URL, TITLE_INDEX).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.kind == ItemKind::Folder));
        assert_eq!(items[0].name, "Abba dabba");
        assert_eq!(
            items[0].url,
            "http://www.oppetarkiv.se/etikett/titel/Abba-dabba/?sida=1&sort=tid_stigande&embed=true"
        );
    }

    #[test]
    fn program_page_yields_videos_and_next_page() {
        let channel = build(CODE).unwrap();
        let url = "http://www.oppetarkiv.se/etikett/titel/Hem%20till%20byn/?sida=1&sort=tid_stigande&embed=true";
        let items = channel.parse_listing(url, PROGRAM_PAGE).unwrap();
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(first.kind, ItemKind::Video);
        assert_eq!(first.name, "Säsong 2 - Avsnitt 4");
        assert_eq!(first.url, "http://www.oppetarkiv.se/video/1234567?output=json");
        assert_eq!(
            first.thumbnail.as_deref(),
            Some("http://www.svtstatic.se/image/medium/1/abc.jpg")
        );
        assert_eq!(first.published, NaiveDate::from_ymd_opt(1973, 10, 7));
        assert!(!first.is_complete());

        let second = &items[1];
        assert_eq!(second.name, "Julspecial");
        assert_eq!(
            second.thumbnail.as_deref(),
            Some("http://www.oppetarkiv.se/image/small/2/def.jpg")
        );
        assert!(second.published.is_none());

        let page = &items[2];
        assert_eq!(page.kind, ItemKind::Page);
        assert_eq!(page.name, "2");
        assert_eq!(
            page.url,
            "http://www.oppetarkiv.se/etikett/titel/Hem%20till%20byn/?sida=2&sort=tid_stigande&embed=true"
        );
    }

    #[test]
    fn descriptors_keep_document_order() {
        let json: Value = serde_json::from_str(DESCRIPTOR).unwrap();
        let descriptors = SvtResolver::descriptors(&json["video"]);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].format.as_deref(), Some("flash"));
        assert_eq!(
            SvtResolver::subtitle_url(&json["video"]),
            Some("http://media.svt.se/sub/1234567.srt")
        );
    }

    #[tokio::test]
    async fn adaptive_entry_resolves_and_legacy_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let video_url = "http://www.oppetarkiv.se/video/1234567?output=json";
        let transport = FakeTransport::new()
            .with(video_url, DESCRIPTOR)
            .with("http://svtplay-i.akamaihd.net/i/o/1234567/master.m3u8", MASTER)
            .with("http://media.svt.se/sub/1234567.srt", "1\n10:00:01,000 --> 10:00:02,000\nHej\n");
        let channel = Channel::new(config(CODE).unwrap().with_cache_dir(dir.path()), registry().unwrap());

        let mut item = Item::video("Avsnitt 4", video_url);
        let outcome = channel.update_video_item(&transport, &mut item).await;

        assert!(matches!(outcome, ResolveOutcome::PartiallyResolved { streams: 2, .. }));
        assert!(item.is_complete());
        let part = &item.parts()[0];
        assert_eq!(part.streams()[0].bitrate, 320);
        assert_eq!(
            part.streams()[1].url,
            "http://svtplay-i.akamaihd.net/i/o/1234567/index_3_av.m3u8"
        );
        assert_eq!(part.http_headers["X-Forwarded-For"], "0.0.0.0");
        let subtitle = std::fs::read_to_string(part.subtitle_path.as_ref().unwrap()).unwrap();
        assert!(subtitle.contains("00:00:01,000 --> 00:00:02,000"));
    }

    #[tokio::test]
    async fn descriptor_without_video_fails() {
        let video_url = "http://www.oppetarkiv.se/video/1?output=json";
        let transport = FakeTransport::new().with(video_url, r#"{"context": {}}"#);
        let channel = build(CODE).unwrap();

        let mut item = Item::video("x", video_url);
        let outcome = channel.update_video_item(&transport, &mut item).await;
        assert!(matches!(outcome, ResolveOutcome::Failed { ref reason } if reason.contains("malformed")));
        assert_eq!(item.state(), ResolutionState::Failed);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(build("svtplay").is_err());
    }
}
