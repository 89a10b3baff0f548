//! # Metadata Catalog
//!
//! Describes playlist entries for list displays (title, artist, album, genre,
//! duration) by feeding their bytes to the host's tag extractor. Remote
//! entries are probed with a ranged GET when remote metadata is enabled.
//!
//! Extraction is best-effort: any failure falls back to the entry's own
//! display strings.

use bridge_traits::{
    FileSystemAccess, HttpClient, HttpRequest, MediaKind, MediaMetadataExtractor, MediaTags,
    PlayerSource,
};
use bytes::Bytes;
use core_runtime::logging::{redact_url, strip_path};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::resolver::SourceResolver;
use crate::types::PlaylistEntry;

/// Bytes requested from remote sources; enough for leading tag blocks.
pub const REMOTE_PROBE_BYTES: u64 = 256 * 1024;

/// Display details for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDetails {
    pub index: usize,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<Duration>,
    pub media_kind: MediaKind,
}

impl EntryDetails {
    fn fallback(index: usize, entry: &PlaylistEntry) -> Self {
        Self {
            index,
            title: entry.title.clone(),
            artist: entry.artist.clone(),
            album: None,
            genre: None,
            duration: None,
            media_kind: entry.media_kind,
        }
    }

    fn merge(mut self, tags: MediaTags) -> Self {
        if let Some(title) = tags.title {
            self.title = title;
        }
        self.artist = tags.artist.or(self.artist);
        self.album = tags.album;
        self.genre = tags.genre;
        self.duration = tags.duration;
        self
    }
}

/// Tag lookups for playlist entries.
pub struct MetadataCatalog {
    resolver: SourceResolver,
    file_system: Arc<dyn FileSystemAccess>,
    extractor: Arc<dyn MediaMetadataExtractor>,
    http_client: Option<Arc<dyn HttpClient>>,
    remote_enabled: bool,
}

impl MetadataCatalog {
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        extractor: Arc<dyn MediaMetadataExtractor>,
        placeholder_max_bytes: u64,
    ) -> Self {
        Self {
            resolver: SourceResolver::new(Arc::clone(&file_system), placeholder_max_bytes),
            file_system,
            extractor,
            http_client: None,
            remote_enabled: false,
        }
    }

    /// Enable ranged GET probes for remote entries.
    pub fn with_remote(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self.remote_enabled = true;
        self
    }

    /// Describe every entry, in order. Never fails.
    pub async fn describe(&self, entries: &[PlaylistEntry]) -> Vec<EntryDetails> {
        let mut details = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            details.push(self.describe_entry(index, entry).await);
        }
        details
    }

    pub async fn describe_entry(&self, index: usize, entry: &PlaylistEntry) -> EntryDetails {
        let fallback = EntryDetails::fallback(index, entry);
        match self.extract(entry).await {
            Ok(Some(tags)) => fallback.merge(tags),
            Ok(None) => fallback,
            Err(e) => {
                warn!(index, error = %e, "Metadata extraction failed");
                fallback
            }
        }
    }

    async fn extract(&self, entry: &PlaylistEntry) -> Result<Option<MediaTags>> {
        let source = self.resolver.resolve(entry).await?;
        let (data, hint) = match &source {
            PlayerSource::LocalFile { path } => {
                debug!(file = %strip_path(&entry.source_ref), "Reading tags from local file");
                (self.file_system.read_file(path).await?, extension(path))
            }
            PlayerSource::RemoteStream { url } => match self.fetch_remote(url).await? {
                Some(data) => (data, url_extension(url)),
                None => return Ok(None),
            },
        };

        let tags = self.extractor.extract(data, hint.as_deref()).await?;
        Ok((!tags.is_empty()).then_some(tags))
    }

    async fn fetch_remote(&self, url: &str) -> Result<Option<Bytes>> {
        let Some(client) = self.http_client.as_ref().filter(|_| self.remote_enabled) else {
            return Ok(None);
        };

        debug!(url = %redact_url(url), "Probing remote tags");
        let response = client
            .execute(HttpRequest::get(url).leading_bytes(REMOTE_PROBE_BYTES))
            .await?
            .error_for_status()?;
        Ok(Some(response.body))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn url_extension(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| extension(Path::new(parsed.path())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::{FileMetadata, HttpResponse};
    use mockall::mock;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Returns fixed tags and records `(len, hint)` per call.
    struct StubExtractor {
        tags: MediaTags,
        calls: Mutex<Vec<(usize, Option<String>)>>,
    }

    impl StubExtractor {
        fn new(tags: MediaTags) -> Arc<Self> {
            Arc::new(Self {
                tags,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MediaMetadataExtractor for StubExtractor {
        async fn extract(&self, data: Bytes, hint: Option<&str>) -> BridgeResult<MediaTags> {
            self.calls
                .lock()
                .push((data.len(), hint.map(str::to_string)));
            Ok(self.tags.clone())
        }
    }

    mock! {
        pub Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct Files(HashMap<PathBuf, Bytes>);

    #[async_trait]
    impl FileSystemAccess for Files {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.0.contains_key(path))
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            self.0
                .get(path)
                .map(|d| FileMetadata {
                    size: d.len() as u64,
                    modified_at: None,
                    is_directory: false,
                })
                .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
        }

        async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
        }
    }

    fn files() -> Arc<Files> {
        let mut map = HashMap::new();
        map.insert(PathBuf::from("/m/song.flac"), Bytes::from(vec![1u8; 2048]));
        map.insert(
            PathBuf::from("/m/remote.mp3"),
            Bytes::from_static(b"https://cdn.example.com/remote.mp3"),
        );
        Arc::new(Files(map))
    }

    fn tags(title: &str) -> MediaTags {
        MediaTags {
            title: Some(title.to_string()),
            artist: Some("Band".to_string()),
            album: Some("Record".to_string()),
            genre: None,
            duration: Some(Duration::from_secs(200)),
        }
    }

    #[tokio::test]
    async fn test_local_entry_uses_extracted_tags() {
        let extractor = StubExtractor::new(tags("Tagged"));

        let catalog = MetadataCatalog::new(files(), extractor.clone(), 1000);
        let details = catalog
            .describe(&[PlaylistEntry::audio("/m/song.flac")])
            .await;

        assert_eq!(
            extractor.calls.lock().as_slice(),
            &[(2048, Some("flac".to_string()))]
        );
        assert_eq!(details[0].title, "Tagged");
        assert_eq!(details[0].album.as_deref(), Some("Record"));
        assert_eq!(details[0].duration, Some(Duration::from_secs(200)));
    }

    #[tokio::test]
    async fn test_remote_entry_skipped_when_disabled() {
        let extractor = StubExtractor::new(tags("Unused"));

        let catalog = MetadataCatalog::new(files(), extractor.clone(), 1000);
        let entry = PlaylistEntry::audio("/m/remote.mp3").with_artist("Someone");
        let details = catalog.describe_entry(0, &entry).await;

        assert!(extractor.calls.lock().is_empty());
        assert_eq!(details.title, "remote");
        assert_eq!(details.artist.as_deref(), Some("Someone"));
        assert_eq!(details.album, None);
    }

    #[tokio::test]
    async fn test_remote_entry_probes_leading_bytes() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|request| {
                request.url == "https://cdn.example.com/remote.mp3"
                    && request.headers.get("Range").map(String::as_str) == Some("bytes=0-262143")
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 206,
                    headers: HashMap::new(),
                    body: Bytes::from_static(b"ID3"),
                })
            });

        let extractor = StubExtractor::new(tags("Streamed"));

        let catalog =
            MetadataCatalog::new(files(), extractor.clone(), 1000).with_remote(Arc::new(http));
        let details = catalog
            .describe_entry(3, &PlaylistEntry::audio("/m/remote.mp3"))
            .await;

        assert_eq!(details.index, 3);
        assert_eq!(details.title, "Streamed");
        assert_eq!(
            extractor.calls.lock().as_slice(),
            &[(3, Some("mp3".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_missing_entry_falls_back() {
        let extractor = StubExtractor::new(tags("Unused"));

        let catalog = MetadataCatalog::new(files(), extractor.clone(), 1000);
        let details = catalog
            .describe_entry(1, &PlaylistEntry::video("/m/gone.mp4").with_title("Gone"))
            .await;

        assert!(extractor.calls.lock().is_empty());
        assert_eq!(details.title, "Gone");
        assert_eq!(details.media_kind, MediaKind::Video);
    }
}
