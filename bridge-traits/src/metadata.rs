//! Media Metadata Extraction
//!
//! Tag and duration extraction from raw media bytes. The core consumes this
//! capability to describe playlist entries; it never parses containers itself.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Tags read from a media stream. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<Duration>,
}

impl MediaTags {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.genre.is_none()
            && self.duration.is_none()
    }
}

/// Extracts [`MediaTags`] from a byte buffer.
///
/// `hint` is a file name or URL path used to guess the container when the
/// bytes alone are ambiguous.
#[async_trait]
pub trait MediaMetadataExtractor: Send + Sync {
    async fn extract(&self, data: Bytes, hint: Option<&str>) -> Result<MediaTags>;
}
