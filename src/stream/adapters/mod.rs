//! Manifest adapter implementations

pub mod hls;
pub mod rendition;

pub use hls::HlsAdapter;
pub use rendition::RenditionAdapter;
