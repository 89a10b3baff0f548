//! Media tag extraction using `lofty`
//!
//! Supports ID3v2, Vorbis Comments, MP4 atoms and FLAC. Works on partial
//! buffers (the leading bytes of a remote stream), in which case duration may
//! be missing.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    metadata::{MediaMetadataExtractor, MediaTags},
};
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Tag extractor backed by `lofty`
pub struct LoftyMetadataExtractor {
    parse_options: ParseOptions,
}

impl LoftyMetadataExtractor {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    fn extract_blocking(
        parse_options: ParseOptions,
        data: Bytes,
        hint: Option<String>,
    ) -> Result<MediaTags> {
        let mut probe = Probe::new(Cursor::new(data.as_ref()))
            .options(parse_options)
            .guess_file_type()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to probe media: {}", e)))?;

        if probe.file_type().is_none() {
            if let Some(file_type) = hint.as_deref().and_then(Self::file_type_from_hint) {
                debug!(?file_type, "Using file type from hint");
                probe = probe.set_file_type(file_type);
            }
        }

        let tagged_file = probe
            .read()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to parse media: {}", e)))?;

        let duration = tagged_file.properties().duration();
        let duration = (!duration.is_zero()).then_some(duration);

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let Some(tag) = tag else {
            warn!(hint = ?hint, "No tags found in media");
            return Ok(MediaTags {
                duration,
                ..Default::default()
            });
        };

        Ok(MediaTags {
            title: tag.title().map(|s| normalize_text(s.as_ref())),
            artist: tag.artist().map(|s| normalize_text(s.as_ref())),
            album: tag.album().map(|s| normalize_text(s.as_ref())),
            genre: tag.genre().map(|s| normalize_text(s.as_ref())),
            duration,
        })
    }

    fn file_type_from_hint(hint: &str) -> Option<FileType> {
        let path = hint.split(['?', '#']).next().unwrap_or(hint);
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileType::from_ext)
    }
}

impl Default for LoftyMetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaMetadataExtractor for LoftyMetadataExtractor {
    async fn extract(&self, data: Bytes, hint: Option<&str>) -> Result<MediaTags> {
        let parse_options = self.parse_options;
        let hint = hint.map(str::to_owned);

        tokio::task::spawn_blocking(move || Self::extract_blocking(parse_options, data, hint))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Extraction task failed: {}", e)))?
    }
}

/// Collapse whitespace runs and drop control characters.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Blue \t in  Green "), "Blue in Green");
        assert_eq!(normalize_text("a\u{0}b"), "ab");
    }

    #[test]
    fn test_file_type_from_hint() {
        assert_eq!(
            LoftyMetadataExtractor::file_type_from_hint("https://cdn.example.com/a.flac?sig=1"),
            Some(FileType::Flac)
        );
        assert_eq!(
            LoftyMetadataExtractor::file_type_from_hint("/music/b.mp3"),
            Some(FileType::Mpeg)
        );
        assert_eq!(LoftyMetadataExtractor::file_type_from_hint("no-extension"), None);
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail() {
        let extractor = LoftyMetadataExtractor::new();
        let result = extractor
            .extract(Bytes::from_static(b"definitely not media"), None)
            .await;
        assert!(result.is_err());
    }
}
