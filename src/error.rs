//! Error taxonomy for listing and stream resolution.
//!
//! Most of these are absorbed close to where they happen: a failed
//! manifest fetch drops one descriptor entry, an unroutable listing URL
//! renders as an empty folder. Only [`Channel`](crate::channel::Channel)
//! decides what reaches the caller.
//!
//! An empty extraction result is not an error and has no variant here.

use thiserror::Error;

/// Errors raised by the parsing-and-resolution engine.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No registered binding matches the listing URL and no wildcard exists.
    #[error("no parser binding for {0}")]
    NoBindingFound(String),

    /// A single resource could not be fetched.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Structured data was absent or had an unexpected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A stream descriptor in a format no adapter handles.
    #[error("unsupported stream dialect: {0}")]
    UnsupportedDialect(String),

    /// A listing pattern or selector failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Channel construction or settings problem.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Build a transport error from anything displayable.
    pub fn transport(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<regex::Error> for ChannelError {
    fn from(e: regex::Error) -> Self {
        Self::InvalidPattern(e.to_string())
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
