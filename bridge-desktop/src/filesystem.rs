//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Relative playlist locators are resolved against a media root, which
/// defaults to the user's music directory.
pub struct TokioFileSystem {
    media_root: PathBuf,
}

impl TokioFileSystem {
    /// Create a new file system accessor rooted at the platform music directory
    pub fn new() -> Self {
        let media_root = dirs::audio_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self { media_root }
    }

    /// Create a file system accessor with a custom media root
    pub fn with_media_root(media_root: PathBuf) -> Self {
        Self { media_root }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.media_root.join(path)
        }
    }

    fn map_io_error(path: &Path, e: std::io::Error) -> BridgeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound(path.display().to_string())
        } else {
            BridgeError::Io(e)
        }
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = self.resolve(path);
        fs::try_exists(&path)
            .await
            .map_err(|e| Self::map_io_error(&path, e))
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let path = self.resolve(path);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::map_io_error(&path, e))?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let path = self.resolve(path);
        let data = fs::read(&path)
            .await
            .map_err(|e| Self::map_io_error(&path, e))?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("bridge-desktop-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_relative_paths_use_media_root() {
        let root = scratch_dir("relative");
        std::fs::write(root.join("a.url"), "https://cdn.example.com/a.mp3").unwrap();

        let fs = TokioFileSystem::with_media_root(root.clone());
        assert!(fs.exists(Path::new("a.url")).await.unwrap());

        let meta = fs.metadata(Path::new("a.url")).await.unwrap();
        assert_eq!(meta.size, 29);
        assert!(!meta.is_directory);

        let text = fs.read_to_string(Path::new("a.url")).await.unwrap();
        assert_eq!(text, "https://cdn.example.com/a.mp3");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_maps_to_not_found() {
        let root = scratch_dir("missing");
        let fs = TokioFileSystem::with_media_root(root.clone());

        assert!(!fs.exists(Path::new("nope.mp3")).await.unwrap());
        let err = fs.read_file(Path::new("nope.mp3")).await.unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));

        std::fs::remove_dir_all(root).unwrap();
    }
}
