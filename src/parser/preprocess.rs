//! Content preprocessing before extraction.
//!
//! A preprocessor may trim the raw page (typically cutting off a trailing
//! "related videos" block whose markup would otherwise match the listing
//! pattern) and may emit extra items that are placed ahead of the
//! extractor's output.

use std::sync::Arc;

use tracing::debug;

use crate::item::Item;

/// Result of preprocessing one page.
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    pub content: String,
    pub items: Vec<Item>,
}

impl Preprocessed {
    /// Content passed through unchanged with no extra items.
    #[must_use]
    pub fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            items: Vec::new(),
        }
    }
}

/// Channel hook run on raw listing content.
pub type Preprocessor = Arc<dyn Fn(&str) -> Preprocessed + Send + Sync>;

/// Byte offset of the earliest marker occurrence past the start of `content`.
#[must_use]
pub fn earliest_marker(content: &str, markers: &[&str]) -> Option<usize> {
    markers
        .iter()
        .filter_map(|marker| content.find(marker))
        .filter(|&pos| pos > 0)
        .min()
}

/// Cut `content` at the earliest of `markers`; unchanged if none occur.
///
/// Cutting at the earliest occurrence means no marker survives in the
/// result, so applying this twice equals applying it once.
#[must_use]
pub fn truncate_at_markers(content: &str, markers: &[&str]) -> Preprocessed {
    match earliest_marker(content, markers) {
        Some(end) => {
            debug!("Trailing section found at {end}, truncating");
            Preprocessed {
                content: content[..end].to_string(),
                items: Vec::new(),
            }
        }
        None => Preprocessed::unchanged(content),
    }
}

/// Preprocessor that truncates at the given markers.
#[must_use]
pub fn truncate_at(markers: &[&'static str]) -> Preprocessor {
    let markers = markers.to_vec();
    Arc::new(move |content: &str| truncate_at_markers(content, &markers))
}
