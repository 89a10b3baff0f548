//! # Media Source Resolver
//!
//! Turns a playlist entry into something a native player can open.
//!
//! - A direct `http(s)` reference streams as-is.
//! - A file smaller than the placeholder threshold holds a stream URL as text.
//! - Any other existing file plays locally.
//!
//! Every failure is a skip signal: the coordinator advances past the entry.
//! Resolution is redone for each start; nothing is cached across tracks.

use bridge_traits::{BridgeError, FileSystemAccess, PlayerSource};
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{PlaybackError, Result};
use crate::types::PlaylistEntry;

/// Resolves playlist entries through the host file system.
#[derive(Clone)]
pub struct SourceResolver {
    file_system: Arc<dyn FileSystemAccess>,
    placeholder_max_bytes: u64,
}

impl SourceResolver {
    pub fn new(file_system: Arc<dyn FileSystemAccess>, placeholder_max_bytes: u64) -> Self {
        Self {
            file_system,
            placeholder_max_bytes,
        }
    }

    /// Resolve `entry` to a player source.
    ///
    /// Errors are always skippable resolution errors.
    pub async fn resolve(&self, entry: &PlaylistEntry) -> Result<PlayerSource> {
        if let Some(url) = parse_stream_url(&entry.source_ref) {
            return Ok(PlayerSource::RemoteStream { url });
        }

        let path = PathBuf::from(&entry.source_ref);
        let metadata = match self.file_system.metadata(&path).await {
            Ok(metadata) => metadata,
            Err(BridgeError::NotFound(_)) => {
                return Err(PlaybackError::SourceMissing(entry.source_ref.clone()))
            }
            Err(e) => {
                return Err(PlaybackError::UnreadablePlaceholder {
                    path: entry.source_ref.clone(),
                    reason: e.to_string(),
                })
            }
        };

        if metadata.is_directory {
            return Err(PlaybackError::SourceMissing(entry.source_ref.clone()));
        }

        if metadata.size < self.placeholder_max_bytes {
            return self.read_placeholder(&path, &entry.source_ref).await;
        }

        debug!(
            file = %strip_path(&entry.source_ref),
            size = metadata.size,
            "Resolved local media file"
        );
        Ok(PlayerSource::LocalFile { path })
    }

    async fn read_placeholder(&self, path: &Path, source_ref: &str) -> Result<PlayerSource> {
        let text = self
            .file_system
            .read_to_string(path)
            .await
            .map_err(|e| PlaybackError::UnreadablePlaceholder {
                path: source_ref.to_string(),
                reason: e.to_string(),
            })?;

        match parse_stream_url(text.trim()) {
            Some(url) => {
                debug!(file = %strip_path(source_ref), "Resolved placeholder to stream URL");
                Ok(PlayerSource::RemoteStream { url })
            }
            None => Err(PlaybackError::MalformedPlaceholder {
                path: source_ref.to_string(),
            }),
        }
    }
}

/// `Some(url)` when `raw` is a well-formed `http`/`https` URL with a host.
pub fn parse_stream_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let remote = matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some();
    remote.then(|| parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{error::Result as BridgeResult, FileMetadata};
    use bytes::Bytes;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryFs {
        files: HashMap<PathBuf, Bytes>,
    }

    impl MemoryFs {
        fn with(mut self, path: &str, contents: &[u8]) -> Self {
            self.files
                .insert(PathBuf::from(path), Bytes::copy_from_slice(contents));
            self
        }
    }

    #[async_trait]
    impl FileSystemAccess for MemoryFs {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.files.contains_key(path))
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            self.files
                .get(path)
                .map(|data| FileMetadata {
                    size: data.len() as u64,
                    modified_at: None,
                    is_directory: false,
                })
                .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
        }

        async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
        }
    }

    fn resolver(fs: MemoryFs) -> SourceResolver {
        SourceResolver::new(Arc::new(fs), 1000)
    }

    #[tokio::test]
    async fn test_large_file_resolves_locally() {
        let fs = MemoryFs::default().with("/m/song.mp3", &[0u8; 4096]);
        let source = resolver(fs)
            .resolve(&PlaylistEntry::audio("/m/song.mp3"))
            .await
            .unwrap();
        assert_eq!(
            source,
            PlayerSource::LocalFile {
                path: PathBuf::from("/m/song.mp3")
            }
        );
    }

    #[tokio::test]
    async fn test_placeholder_resolves_to_stream() {
        let fs = MemoryFs::default().with("/m/remote.mp3", b"  https://cdn.example.com/a.mp3\n");
        let source = resolver(fs)
            .resolve(&PlaylistEntry::audio("/m/remote.mp3"))
            .await
            .unwrap();
        assert!(source.is_remote());
    }

    #[tokio::test]
    async fn test_malformed_placeholder_is_skipped() {
        let fs = MemoryFs::default().with("/m/bad.mp3", b"not-a-url");
        let err = resolver(fs)
            .resolve(&PlaylistEntry::audio("/m/bad.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::MalformedPlaceholder { .. }));
        assert!(err.is_skippable());
    }

    #[tokio::test]
    async fn test_non_utf8_placeholder_is_unreadable() {
        let fs = MemoryFs::default().with("/m/bin.mp3", &[0xff, 0xfe, 0x00]);
        let err = resolver(fs)
            .resolve(&PlaylistEntry::audio("/m/bin.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::UnreadablePlaceholder { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let err = resolver(MemoryFs::default())
            .resolve(&PlaylistEntry::audio("/m/gone.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_direct_url_streams_without_file_access() {
        let source = resolver(MemoryFs::default())
            .resolve(&PlaylistEntry::video("https://cdn.example.com/clip.mp4"))
            .await
            .unwrap();
        assert_eq!(
            source,
            PlayerSource::RemoteStream {
                url: "https://cdn.example.com/clip.mp4".into()
            }
        );
    }

    #[test]
    fn test_parse_stream_url_rejects_other_schemes() {
        assert!(parse_stream_url("ftp://example.com/a.mp3").is_none());
        assert!(parse_stream_url("file:///tmp/a.mp3").is_none());
        assert!(parse_stream_url("not-a-url").is_none());
        assert!(parse_stream_url("http://example.com").is_some());
    }
}
