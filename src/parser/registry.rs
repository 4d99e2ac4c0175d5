//! URL → parser binding table.
//!
//! Bindings are registered once when a channel is built. Lookup checks
//! exact, prefix and regex bindings in registration order (first match
//! wins, not best match) and falls back to the first wildcard binding.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::trace;

use super::extract::Extractor;
use super::fields::Fields;
use super::preprocess::Preprocessor;
use crate::channel::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::item::Item;
use crate::stream::StreamResolver;

/// Maps one extracted record to an item. Returning `None` drops the record.
pub type ItemFactory = Arc<dyn Fn(&ChannelConfig, &Fields) -> Option<Item> + Send + Sync>;

/// How a binding matches listing URLs.
#[derive(Debug, Clone)]
pub enum UrlMatch {
    /// String equality.
    Exact(String),
    /// URL starts with the given text.
    Prefix(String),
    /// Regex search anywhere in the URL.
    Regex(Regex),
    /// Any URL no other binding claims.
    Wildcard,
}

impl UrlMatch {
    #[must_use]
    pub fn exact(url: &str) -> Self {
        Self::Exact(url.to_string())
    }

    #[must_use]
    pub fn prefix(prefix: &str) -> Self {
        Self::Prefix(prefix.to_string())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Whether this matcher claims `url`. Wildcards never claim directly.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(expected) => url == expected,
            Self::Prefix(prefix) => url.starts_with(prefix.as_str()),
            Self::Regex(re) => re.is_match(url),
            Self::Wildcard => false,
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

/// Next-page extraction attached to a binding.
pub struct Pagination {
    pub extractor: Extractor,
    pub creator: ItemFactory,
}

/// Everything a channel needs to parse one kind of listing page.
pub struct Binding {
    pub url_match: UrlMatch,
    pub preprocessor: Option<Preprocessor>,
    pub extractor: Extractor,
    pub creator: ItemFactory,
    pub pagination: Option<Pagination>,
    pub resolver: Option<Arc<dyn StreamResolver>>,
}

impl Binding {
    pub fn new<F>(url_match: UrlMatch, extractor: Extractor, creator: F) -> Self
    where
        F: Fn(&ChannelConfig, &Fields) -> Option<Item> + Send + Sync + 'static,
    {
        Self {
            url_match,
            preprocessor: None,
            extractor,
            creator: Arc::new(creator),
            pagination: None,
            resolver: None,
        }
    }

    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, extractor: Extractor, creator: ItemFactory) -> Self {
        self.pagination = Some(Pagination { extractor, creator });
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl StreamResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("url_match", &self.url_match)
            .field("preprocessor", &self.preprocessor.is_some())
            .field("extractor", &self.extractor)
            .field("pagination", &self.pagination.is_some())
            .field("resolver", &self.resolver.as_ref().map(|r| r.name()))
            .finish()
    }
}

/// Ordered set of bindings for one channel.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    bindings: Vec<Binding>,
}

impl ParserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding after all existing ones.
    pub fn register(&mut self, binding: Binding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, binding: Binding) -> Self {
        self.register(binding);
        self
    }

    /// Find the binding for `url`.
    pub fn resolve(&self, url: &str) -> Result<&Binding> {
        let binding = self
            .bindings
            .iter()
            .find(|b| b.url_match.matches(url))
            .or_else(|| self.bindings.iter().find(|b| b.url_match.is_wildcard()))
            .ok_or_else(|| ChannelError::NoBindingFound(url.to_string()))?;
        trace!("{url} -> {:?}", binding.url_match);
        Ok(binding)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
