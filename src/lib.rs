//! `retrokanal` - Catalog and playback resolution for broadcaster video sites
//!
//! # Features
//!
//! - **Pattern registry**: URL → (preprocessor, extractor, item factory, resolver) bindings
//! - **Extraction**: regex capture groups, JSON pointers or CSS selectors into named fields
//! - **Lazy resolution**: videos stay pending until selected, then resolve into ranked streams
//! - **Manifest adapters**: HLS master playlists and RTMP rendition ladders
//! - **Subtitles**: hour correction and MD5-named cache files
//!
//! # Example
//!
//! ```rust,no_run
//! use retrokanal::channels::ChannelRouter;
//! use retrokanal::config::Settings;
//! use retrokanal::{HttpTransport, ItemKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let channel = ChannelRouter::new().build("oppetarkiv", &Settings::load()?)?;
//!     let transport = HttpTransport::new()?;
//!
//!     let shows = channel.process_folder_list(&transport, &channel.main_list_item()).await;
//!     println!("Found {} shows", shows.len());
//!
//!     if let Some(show) = shows.first() {
//!         for mut video in channel.process_folder_list(&transport, show).await {
//!             if video.kind == ItemKind::Video {
//!                 let outcome = channel.update_video_item(&transport, &mut video).await;
//!                 println!("{}: {outcome:?}", video.name);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod channel;
pub mod channels;
pub mod config;
pub mod error;
pub mod http_client;
pub mod item;
pub mod parser;
pub mod stream;
pub mod textures;

pub use cache::CacheDir;
pub use channel::{Channel, ChannelConfig};
pub use error::{ChannelError, Result};
pub use http_client::{HttpTransport, Transport};
pub use item::{Item, ItemKind, MediaPart, MediaStream, ResolutionState};
pub use parser::{Binding, Extractor, Fields, ParserRegistry, UrlMatch};
pub use stream::{ResolveOutcome, StreamResolver};
pub use textures::{TextureHandler, TextureMode};

/// Version of retrokanal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
