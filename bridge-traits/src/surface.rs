//! Hosting Surface Abstractions
//!
//! A hosting surface is whatever UI currently presents playback: the audio
//! screen or the video screen. When the engine reaches an entry whose media
//! kind differs from the attached surface, the host opens the other surface
//! through [`SurfaceLauncher`], handing over the whole playlist as a
//! [`PlaylistHandoff`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::playback::MediaKind;

/// Playlist snapshot passed surface → engine and surface → surface.
///
/// `titles`, `artists` and `media_kinds` run parallel to `sources`. A
/// parallel array whose length differs from `sources` is ignored by the
/// consumer rather than rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaylistHandoff {
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kinds: Option<Vec<MediaKind>>,
    #[serde(default)]
    pub start_index: usize,
    /// Surface the payload is addressed to, if the sender knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<MediaKind>,
}

impl PlaylistHandoff {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            sources,
            ..Default::default()
        }
    }

    pub fn with_titles(mut self, titles: Vec<String>) -> Self {
        self.titles = Some(titles);
        self
    }

    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        self.artists = Some(artists);
        self
    }

    pub fn with_media_kinds(mut self, kinds: Vec<MediaKind>) -> Self {
        self.media_kinds = Some(kinds);
        self
    }

    pub fn starting_at(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    pub fn for_context(mut self, context: MediaKind) -> Self {
        self.context = Some(context);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BridgeError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::Serialization(e.to_string()))
    }
}

/// Opens hosting surfaces and shows transient user messages.
#[async_trait]
pub trait SurfaceLauncher: Send + Sync {
    /// Bring up the surface presenting `kind`, seeded with `handoff`.
    async fn launch(&self, kind: MediaKind, handoff: PlaylistHandoff) -> Result<()>;

    /// Short-lived message (toast, snackbar, OSD).
    async fn show_transient_message(&self, message: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_json_omits_absent_arrays() {
        let handoff = PlaylistHandoff::new(vec!["/music/a.mp3".into()])
            .with_media_kinds(vec![MediaKind::Audio])
            .starting_at(0);

        let json = handoff.to_json().unwrap();
        assert!(!json.contains("titles"));
        assert_eq!(PlaylistHandoff::from_json(&json).unwrap(), handoff);
    }

    #[test]
    fn handoff_from_minimal_json() {
        let handoff = PlaylistHandoff::from_json(r#"{"sources":["a","b"]}"#).unwrap();
        assert_eq!(handoff.sources.len(), 2);
        assert_eq!(handoff.start_index, 0);
        assert!(handoff.media_kinds.is_none());
    }

    #[test]
    fn handoff_rejects_garbage() {
        let err = PlaylistHandoff::from_json("not json").unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
