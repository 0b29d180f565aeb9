//! The media library that finished clips are saved into.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Destination for recorded clips.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Whether the library accepts the container at `path`.
    fn is_compatible(&self, path: &Path) -> bool;

    /// Save the clip at `path` and return where it now lives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveFailed`] if the clip cannot be stored.
    async fn save_to_library(&self, path: &Path) -> Result<PathBuf>;
}

/// A library backed by a plain directory.
///
/// Clips are stored as `<blake3 hash>.<ext>`, so saving the same clip twice
/// leaves a single file.
#[derive(Debug, Clone)]
pub struct DirectoryMediaLibrary {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryMediaLibrary {
    /// A library in `dir` accepting the given container extensions.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    /// The library directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    fn is_compatible(&self, path: &Path) -> bool {
        Self::extension_of(path).is_some_and(|ext| self.extensions.contains(&ext))
    }

    async fn save_to_library(&self, path: &Path) -> Result<PathBuf> {
        let ext = Self::extension_of(path)
            .filter(|ext| self.extensions.contains(ext))
            .ok_or_else(|| {
                Error::save_failed(format!("{} is not a supported video", path.display()))
            })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::save_failed(format!("cannot read {}: {e}", path.display())))?;
        let hash = blake3::hash(&bytes);
        let target = self.dir.join(format!("{}.{ext}", hash.to_hex()));

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!("Clip already in library at {}", target.display());
            return Ok(target);
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })?;

        let partial = target.with_extension(format!("{ext}.partial"));
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| Error::save_failed(format!("cannot write {}: {e}", partial.display())))?;
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|e| Error::save_failed(format!("cannot write {}: {e}", target.display())))?;

        info!(
            "Saved {} bytes to library as {}",
            bytes.len(),
            target.display()
        );
        Ok(target)
    }
}
