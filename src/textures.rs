//! Channel image resolution.
//!
//! Channels refer to their icons and placeholder images by file name. A
//! [`TextureHandler`] turns those names into something a display layer can
//! load:
//!
//! | Mode | `texture_uri` returns |
//! |------|-----------------------|
//! | `local` | `<root>/<folder>/<file>` |
//! | `remote` | `<url>/<folder>/<file>` |
//! | `cached` | `<cache>/textures/<folder>/<file>`, downloaded on demand |
//!
//! `<folder>` is the channel's texture folder, e.g. `channel.se.oppetarkiv`.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::CacheDir;
use crate::http_client::Transport;

/// Texture mode as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureMode {
    #[default]
    Local,
    Remote,
    Cached,
}

#[derive(Debug)]
enum Source {
    Local { root: PathBuf },
    Remote { url: String },
    Cached { url: String, cache: CacheDir },
}

/// A texture the cached mode still has to download.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MissingTexture {
    remote: String,
    name: String,
}

/// Resolves channel image names.
#[derive(Debug)]
pub struct TextureHandler {
    source: Source,
    missing: Mutex<Vec<MissingTexture>>,
}

impl TextureHandler {
    fn with_source(source: Source) -> Self {
        Self {
            source,
            missing: Mutex::new(Vec::new()),
        }
    }

    /// Images shipped on disk under `root`.
    #[must_use]
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::Local { root: root.into() })
    }

    /// Images served from a CDN.
    #[must_use]
    pub fn remote(url: &str) -> Self {
        Self::with_source(Source::Remote {
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Images mirrored from a CDN into the cache directory.
    #[must_use]
    pub fn cached(url: &str, cache: CacheDir) -> Self {
        Self::with_source(Source::Cached {
            url: url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    #[must_use]
    pub fn mode(&self) -> TextureMode {
        match self.source {
            Source::Local { .. } => TextureMode::Local,
            Source::Remote { .. } => TextureMode::Remote,
            Source::Cached { .. } => TextureMode::Cached,
        }
    }

    /// Full URI for `file_name` in the channel's texture `folder`.
    ///
    /// Names that already are URLs pass through untouched.
    pub fn texture_uri(&self, folder: &str, file_name: &str) -> String {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            return file_name.to_string();
        }

        match &self.source {
            Source::Local { root } => root.join(folder).join(file_name).display().to_string(),
            Source::Remote { url } => format!("{url}/{folder}/{file_name}"),
            Source::Cached { url, cache } => {
                let name = format!("textures/{folder}/{file_name}");
                let local = match cache.path_for(&name) {
                    Ok(path) => path,
                    Err(e) => {
                        warn!("Unusable texture name {file_name}: {e}");
                        return format!("{url}/{folder}/{file_name}");
                    }
                };
                if !local.is_file() {
                    let entry = MissingTexture {
                        remote: format!("{url}/{folder}/{file_name}"),
                        name,
                    };
                    let mut missing = self.missing.lock().unwrap_or_else(PoisonError::into_inner);
                    if !missing.contains(&entry) {
                        debug!("Texture not cached yet: {}", entry.remote);
                        missing.push(entry);
                    }
                }
                local.display().to_string()
            }
        }
    }

    /// Number of textures waiting to be downloaded.
    pub fn missing_textures(&self) -> usize {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Download missing textures into the cache. Returns bytes stored.
    ///
    /// Textures that fail to download or to be written stay queued for
    /// the next call.
    pub async fn fetch_textures(&self, transport: &dyn Transport) -> u64 {
        let Source::Cached { cache, .. } = &self.source else {
            return 0;
        };

        let pending: Vec<MissingTexture> =
            std::mem::take(&mut *self.missing.lock().unwrap_or_else(PoisonError::into_inner));

        let mut fetched = 0u64;
        let mut failed = Vec::new();
        for texture in pending {
            match transport
                .fetch_bytes(&texture.remote, None, &std::collections::HashMap::new())
                .await
            {
                Ok(bytes) => match cache.write_file(&texture.name, &bytes).await {
                    Ok(_) => fetched += bytes.len() as u64,
                    Err(e) => {
                        warn!("Texture {} not stored: {e}", texture.name);
                        failed.push(texture);
                    }
                },
                Err(e) => {
                    warn!("Texture download failed: {e}");
                    failed.push(texture);
                }
            }
        }

        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(failed);
        fetched
    }
}

impl Default for TextureHandler {
    fn default() -> Self {
        Self::local(
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("retrokanal")
                .join("textures"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::testing::FakeTransport;

    #[test]
    fn local_and_remote_uris() {
        let local = TextureHandler::local("/usr/share/retrokanal");
        assert_eq!(
            local.texture_uri("channel.se.oppetarkiv", "oppetarkivimage.png"),
            "/usr/share/retrokanal/channel.se.oppetarkiv/oppetarkivimage.png"
        );

        let remote = TextureHandler::remote("https://cdn.example.com/textures/");
        assert_eq!(
            remote.texture_uri("channel.nick.nickelodeon", "nickelodeonimage.png"),
            "https://cdn.example.com/textures/channel.nick.nickelodeon/nickelodeonimage.png"
        );
        assert_eq!(remote.mode(), TextureMode::Remote);
    }

    #[test]
    fn urls_pass_through() {
        let handler = TextureHandler::remote("https://cdn.example.com");
        assert_eq!(
            handler.texture_uri("x", "https://img.example.com/a.jpg"),
            "https://img.example.com/a.jpg"
        );
    }

    #[tokio::test]
    async fn cached_mode_downloads_missing_textures() {
        let dir = tempfile::tempdir().unwrap();
        let handler = TextureHandler::cached("https://cdn.example.com", CacheDir::new(dir.path()));

        let uri = handler.texture_uri("channel.se.oppetarkiv", "icon.png");
        handler.texture_uri("channel.se.oppetarkiv", "icon.png");
        assert!(uri.starts_with(&dir.path().display().to_string()));
        assert_eq!(handler.missing_textures(), 1);

        let transport = FakeTransport::new()
            .with("https://cdn.example.com/channel.se.oppetarkiv/icon.png", "PNGDATA");
        let fetched = handler.fetch_textures(&transport).await;
        assert_eq!(fetched, 7);
        assert_eq!(handler.missing_textures(), 0);
        assert!(std::path::Path::new(&uri).is_file());

        // Already on disk now, nothing new to fetch.
        handler.texture_uri("channel.se.oppetarkiv", "icon.png");
        assert_eq!(handler.missing_textures(), 0);
    }

    #[tokio::test]
    async fn failed_texture_downloads_stay_queued() {
        let dir = tempfile::tempdir().unwrap();
        let handler = TextureHandler::cached("https://cdn.example.com", CacheDir::new(dir.path()));
        handler.texture_uri("f", "gone.png");

        let fetched = handler.fetch_textures(&FakeTransport::new()).await;
        assert_eq!(fetched, 0);
        assert_eq!(handler.missing_textures(), 1);
    }

    #[tokio::test]
    async fn unwritable_cache_keeps_whole_queue() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let handler = TextureHandler::cached("https://cdn.example.com", CacheDir::new(&blocker));
        handler.texture_uri("f", "icon.png");
        handler.texture_uri("f", "image.png");
        assert_eq!(handler.missing_textures(), 2);

        let transport = FakeTransport::new()
            .with("https://cdn.example.com/f/icon.png", "PNG1")
            .with("https://cdn.example.com/f/image.png", "PNG2");
        let fetched = handler.fetch_textures(&transport).await;
        assert_eq!(fetched, 0);
        assert_eq!(handler.missing_textures(), 2);
    }
}
