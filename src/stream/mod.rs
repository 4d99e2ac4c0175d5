//! Stream resolution for selected videos
//!
//! Supports adaptive HLS master playlists and XML rendition ladders,
//! plus direct single-bitrate URLs and subtitle hour correction.

pub mod adapter;
pub mod adapters;
pub mod dialect;
pub mod resolver;
pub mod subtitle;

pub use adapter::ManifestAdapter;
pub use dialect::{Dialect, StreamDescriptor};
pub use resolver::{ResolveContext, ResolveOutcome, Resolution, SkippedEntry, StreamResolver};
