//! Storage and File System Abstractions
//!
//! Read-side file access used to open local media and URL placeholder files.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file reads to support different platforms:
/// - Desktop: Direct filesystem access
/// - Android: App-private storage, content resolvers
/// - iOS: Sandboxed container directories
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn is_placeholder(fs: &dyn FileSystemAccess, path: &Path) -> Result<bool> {
///     let metadata = fs.metadata(path).await?;
///     Ok(!metadata.is_directory && metadata.size < 1000)
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let data = self.read_file(path).await?;
        String::from_utf8(data.to_vec()).map_err(|e| {
            crate::error::BridgeError::OperationFailed(format!(
                "File is not valid UTF-8: {}",
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct StaticFs(&'static [u8]);

    #[async_trait]
    impl FileSystemAccess for StaticFs {
        async fn exists(&self, _path: &Path) -> Result<bool> {
            Ok(true)
        }

        async fn metadata(&self, _path: &Path) -> Result<FileMetadata> {
            Ok(FileMetadata {
                size: self.0.len() as u64,
                modified_at: None,
                is_directory: false,
            })
        }

        async fn read_file(&self, _path: &Path) -> Result<Bytes> {
            Ok(Bytes::from_static(self.0))
        }
    }

    #[tokio::test]
    async fn read_to_string_decodes_utf8() {
        let fs = StaticFs(b"https://cdn.example.com/a.mp3");
        let text = fs.read_to_string(Path::new("a.url")).await.unwrap();
        assert_eq!(text, "https://cdn.example.com/a.mp3");
    }

    #[tokio::test]
    async fn read_to_string_rejects_binary() {
        let fs = StaticFs(&[0xff, 0xfe, 0x00]);
        let err = fs.read_to_string(Path::new("a.bin")).await.unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }
}
