//! Listing extraction strategies.
//!
//! An [`Extractor`] turns raw page content into an ordered list of
//! [`Fields`]. Three interchangeable strategies are supported:
//!
//! | Strategy | Input | One record per |
//! |----------|-------|----------------|
//! | [`Extractor::Regex`] | HTML/text | non-overlapping match, document order |
//! | [`Extractor::Json`] | JSON | element of the array at a JSON pointer |
//! | [`Extractor::Html`] | HTML | element matching a CSS selector |
//!
//! Extraction never performs I/O and never fails at runtime: content that
//! does not match (or does not parse) yields an empty list.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, trace};

use super::fields::Fields;
use crate::error::{ChannelError, Result};

/// Where an HTML field's value comes from, relative to the matched element.
#[derive(Debug, Clone)]
pub struct HtmlField {
    name: String,
    selector: Option<Selector>,
    attr: Option<String>,
}

impl HtmlField {
    /// Text content of the matched element itself.
    #[must_use]
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: None,
            attr: None,
        }
    }

    /// Attribute of the matched element itself.
    #[must_use]
    pub fn attr(name: &str, attr: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: None,
            attr: Some(attr.to_string()),
        }
    }

    /// Narrow to the first descendant matching `selector`.
    pub fn within(mut self, selector: &str) -> Result<Self> {
        self.selector = Some(parse_selector(selector)?);
        Ok(self)
    }
}

/// Structural pattern applied to listing content.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Capture groups become fields (named, or by index when unnamed).
    Regex(Regex),
    /// Each element of the array at `items` becomes a record.
    ///
    /// `fields` maps a field name to a JSON pointer relative to the element.
    /// With no fields, the element's top-level scalar members are used.
    Json {
        items: String,
        fields: Vec<(String, String)>,
    },
    /// Each element matching `items` becomes a record.
    Html {
        items: Selector,
        fields: Vec<HtmlField>,
    },
}

impl Extractor {
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    #[must_use]
    pub fn json(items: &str, fields: &[(&str, &str)]) -> Self {
        Self::Json {
            items: items.to_string(),
            fields: fields
                .iter()
                .map(|(name, pointer)| ((*name).to_string(), (*pointer).to_string()))
                .collect(),
        }
    }

    pub fn html(items: &str, fields: Vec<HtmlField>) -> Result<Self> {
        Ok(Self::Html {
            items: parse_selector(items)?,
            fields,
        })
    }

    /// Apply the pattern to `content`.
    #[must_use]
    pub fn extract(&self, content: &str) -> Vec<Fields> {
        let results = match self {
            Self::Regex(re) => extract_regex(re, content),
            Self::Json { items, fields } => extract_json(items, fields, content),
            Self::Html { items, fields } => extract_html(items, fields, content),
        };
        debug!("Extracted {} records", results.len());
        results
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ChannelError::InvalidPattern(format!("{selector}: {e:?}")))
}

fn extract_regex(re: &Regex, content: &str) -> Vec<Fields> {
    let names: Vec<String> = re
        .capture_names()
        .enumerate()
        .map(|(i, name)| name.map_or_else(|| i.to_string(), str::to_string))
        .collect();

    re.captures_iter(content)
        .map(|caps| {
            let mut fields = Fields::new();
            for (i, name) in names.iter().enumerate().skip(1) {
                if let Some(m) = caps.get(i) {
                    fields.insert(name.as_str(), m.as_str());
                }
            }
            trace!("{fields:?}");
            fields
        })
        .collect()
}

fn extract_json(items: &str, fields: &[(String, String)], content: &str) -> Vec<Fields> {
    let root: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            debug!("Listing is not JSON: {e}");
            return Vec::new();
        }
    };

    let Some(array) = root.pointer(items).and_then(Value::as_array) else {
        debug!("No array at {items:?}");
        return Vec::new();
    };

    array
        .iter()
        .map(|element| -> Fields {
            if fields.is_empty() {
                element
                    .as_object()
                    .map(|obj| -> Fields {
                        obj.iter()
                            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                            .collect()
                    })
                    .unwrap_or_default()
            } else {
                fields
                    .iter()
                    .filter_map(|(name, pointer)| {
                        element
                            .pointer(pointer)
                            .and_then(scalar_to_string)
                            .map(|v| (name.clone(), v))
                    })
                    .collect()
            }
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn extract_html(items: &Selector, fields: &[HtmlField], content: &str) -> Vec<Fields> {
    let document = Html::parse_document(content);

    document
        .select(items)
        .map(|element| {
            let mut record = Fields::new();
            for field in fields {
                let target = match &field.selector {
                    Some(sel) => element.select(sel).next(),
                    None => Some(element),
                };
                let Some(target) = target else { continue };
                let value = match &field.attr {
                    Some(attr) => target.value().attr(attr).map(str::to_string),
                    None => Some(target.text().collect::<String>()),
                };
                if let Some(value) = value {
                    record.insert(field.name.as_str(), value);
                }
            }
            record
        })
        .collect()
}
