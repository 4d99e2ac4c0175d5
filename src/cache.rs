//! Single-directory file cache for subtitles and textures.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{ChannelError, Result};

/// A cache directory. Every path handed out lies inside it.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a relative name. Rejects absolute names and `..` components.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let safe = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ChannelError::Config(format!(
                "cache entry {name:?} escapes the cache directory {}",
                self.root().display()
            )));
        }
        Ok(self.root.join(relative))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.is_file())
    }

    /// Write `content` to `name`, creating directories as needed.
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        debug!("Saved {} bytes to: {}", content.len(), path.display());
        Ok(path)
    }
}
