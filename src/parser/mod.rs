//! Listing parsing: from raw page content to typed items.
//!
//! # Architecture
//!
//! - [`ParserRegistry`]: ordered URL → [`Binding`] table, first match wins
//! - [`Extractor`]: regex / JSON pointer / CSS selector record extraction
//! - [`Fields`]: one extracted record, keyed by field name
//! - [`Preprocessor`]: optional content trimming ahead of extraction
//! - [`PageCursor`]: next-page item construction
//!
//! Everything here is pure; fetching is the caller's job.

pub mod date;
pub mod extract;
pub mod fields;
pub mod pagination;
pub mod preprocess;
pub mod registry;

use scraper::{Html, Selector};

pub use extract::{Extractor, HtmlField};
pub use fields::Fields;
pub use pagination::PageCursor;
pub use preprocess::{Preprocessed, Preprocessor};
pub use registry::{Binding, ItemFactory, Pagination, ParserRegistry, UrlMatch};

/// Decode HTML entities in a value scraped out of raw markup.
///
/// Decoded with attribute-value rules, so query strings like `?a=1&copy=2`
/// survive while `&amp;` becomes `&`.
#[must_use]
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let fragment = Html::parse_fragment(&format!("<a data-v=\"{}\"></a>", raw.replace('"', "&quot;")));
    let Ok(selector) = Selector::parse("a") else {
        return raw.to_string();
    };
    fragment
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("data-v"))
        .map_or_else(|| raw.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_entities() {
        assert_eq!(decode_entities("a?x=1&amp;y=2"), "a?x=1&y=2");
        assert_eq!(decode_entities("Sam &amp; Cat"), "Sam & Cat");
        assert_eq!(decode_entities("&quot;Hej&quot;"), "\"Hej\"");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(decode_entities("/video/123"), "/video/123");
        assert_eq!(decode_entities("?a=1&copy=2"), "?a=1&copy=2");
    }
}
