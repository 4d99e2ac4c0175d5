//! "Next page" cursors.
//!
//! Page links are extracted like any other record. The cursor rebuilds the
//! link from its captured pieces (`url`, `page`, `suffix`), decodes HTML
//! entities, resolves it against the channel base URL and appends the
//! channel's continuation parameters so the next fetch behaves like the
//! current one. It never fetches anything.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use super::fields::Fields;
use super::registry::ItemFactory;
use super::decode_entities;
use crate::channel::ChannelConfig;
use crate::item::Item;

/// Builds page items from pagination records.
#[derive(Debug, Clone, Default)]
pub struct PageCursor {
    continuation: Vec<(String, String)>,
}

impl PageCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query parameter to carry over to every page URL.
    #[must_use]
    pub fn keep_param(mut self, key: &str, value: &str) -> Self {
        self.continuation.push((key.to_string(), value.to_string()));
        self
    }

    /// Create a page item from a record with `url`, `page` and an optional
    /// `suffix` field. Returns `None` when `url` or `page` is missing.
    #[must_use]
    pub fn create_page_item(&self, config: &ChannelConfig, fields: &Fields) -> Option<Item> {
        let page = fields.get("page")?;
        let prefix = fields.raw("url").filter(|u| !u.trim().is_empty())?;
        let suffix = fields.raw("suffix").unwrap_or_default();

        let joined = decode_entities(&format!("{}{page}{suffix}", prefix.trim()));
        let absolute = config.absolute_url(&joined);
        let url = append_params(&absolute, &self.continuation);
        debug!("Page {page}: {url}");

        Some(Item::page(page, url))
    }

    /// Wrap this cursor as a binding item factory.
    #[must_use]
    pub fn into_factory(self) -> ItemFactory {
        Arc::new(move |config: &ChannelConfig, fields: &Fields| self.create_page_item(config, fields))
    }
}

/// Append `params` to `url`, skipping keys the URL already carries.
#[must_use]
pub fn append_params(url: &str, params: &[(String, String)]) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let present: Vec<String> = parsed.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let missing: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| !present.iter().any(|p| p == k))
        .collect();

    if !missing.is_empty() {
        let mut query = parsed.query_pairs_mut();
        for (k, v) in missing {
            query.append_pair(k, v);
        }
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChannelConfig {
        ChannelConfig::new("test", "Test", "http://www.oppetarkiv.se").unwrap()
    }

    fn record(page: &str) -> Fields {
        Fields::new()
            .with("url", "http://www.oppetarkiv.se/etikett/titel/abba/?sida=")
            .with("page", page)
            .with("suffix", "&amp;sort=tid_stigande")
    }

    #[test]
    fn keeps_sort_and_adds_embed() {
        let cursor = PageCursor::new().keep_param("embed", "true");
        let item = cursor.create_page_item(&config(), &record("2")).unwrap();
        assert_eq!(item.name, "2");
        assert_eq!(
            item.url,
            "http://www.oppetarkiv.se/etikett/titel/abba/?sida=2&sort=tid_stigande&embed=true"
        );
    }

    #[test]
    fn increasing_pages_never_repeat_urls() {
        let cursor = PageCursor::new().keep_param("embed", "true");
        let cfg = config();
        let urls: Vec<String> = (2..6)
            .map(|p| cursor.create_page_item(&cfg, &record(&p.to_string())).unwrap().url)
            .collect();
        for (i, a) in urls.iter().enumerate() {
            for b in &urls[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn relative_links_resolve_against_base() {
        let fields = Fields::new().with("url", "/video/1-a?page_1=").with("page", "3");
        let item = PageCursor::new().create_page_item(&config(), &fields).unwrap();
        assert_eq!(item.url, "http://www.oppetarkiv.se/video/1-a?page_1=3");
    }

    #[test]
    fn existing_param_is_not_duplicated() {
        let url = append_params(
            "http://a.se/x?sida=1&embed=true",
            &[("embed".to_string(), "true".to_string())],
        );
        assert_eq!(url, "http://a.se/x?sida=1&embed=true");
    }

    #[test]
    fn missing_page_number_yields_nothing() {
        let fields = Fields::new().with("url", "/a?sida=");
        assert!(PageCursor::new().create_page_item(&config(), &fields).is_none());
    }
}
