//! Playlist entries, hosting context and status snapshots.

use bridge_traits::{MediaKind, PlaylistHandoff};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::surface::SwitchRequest;

/// Which hosting surface the engine believes it is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceContext {
    Audio,
    Video,
    /// No surface has declared itself; any entry kind is played.
    #[default]
    Unknown,
}

impl SurfaceContext {
    /// Whether an entry of `kind` can start without a surface switch.
    pub fn hosts(&self, kind: MediaKind) -> bool {
        match self {
            SurfaceContext::Audio => kind == MediaKind::Audio,
            SurfaceContext::Video => kind == MediaKind::Video,
            SurfaceContext::Unknown => true,
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            SurfaceContext::Audio => Some(MediaKind::Audio),
            SurfaceContext::Video => Some(MediaKind::Video),
            SurfaceContext::Unknown => None,
        }
    }
}

impl From<MediaKind> for SurfaceContext {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => SurfaceContext::Audio,
            MediaKind::Video => SurfaceContext::Video,
        }
    }
}

impl From<Option<MediaKind>> for SurfaceContext {
    fn from(kind: Option<MediaKind>) -> Self {
        kind.map(SurfaceContext::from).unwrap_or_default()
    }
}

impl fmt::Display for SurfaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceContext::Audio => write!(f, "audio"),
            SurfaceContext::Video => write!(f, "video"),
            SurfaceContext::Unknown => write!(f, "unknown"),
        }
    }
}

/// One item of the active playlist. Immutable once seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Local path, placeholder path or direct `http(s)` URL.
    pub source_ref: String,
    pub title: String,
    pub artist: Option<String>,
    #[serde(default)]
    pub media_kind: MediaKind,
}

impl PlaylistEntry {
    /// Entry with a title derived from the source's file stem.
    pub fn new(source_ref: impl Into<String>, media_kind: MediaKind) -> Self {
        let source_ref = source_ref.into();
        Self {
            title: derive_title(&source_ref),
            source_ref,
            artist: None,
            media_kind,
        }
    }

    pub fn audio(source_ref: impl Into<String>) -> Self {
        Self::new(source_ref, MediaKind::Audio)
    }

    pub fn video(source_ref: impl Into<String>) -> Self {
        Self::new(source_ref, MediaKind::Video)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }
}

/// File stem of a path or URL, or the whole reference when it has none.
pub fn derive_title(source_ref: &str) -> String {
    let trimmed = source_ref.split(['?', '#']).next().unwrap_or(source_ref);
    Path::new(trimmed)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(source_ref)
        .to_string()
}

/// Entries and start index decoded from a [`PlaylistHandoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededPlaylist {
    pub entries: Vec<PlaylistEntry>,
    pub start_index: usize,
}

/// Build playlist entries from a handoff payload.
///
/// Parallel arrays are read per index. Positions a short array does not
/// cover fall back to the file stem for titles, `None` for artists and audio
/// for kinds; extra values are ignored. An out-of-range start index
/// becomes 0.
pub fn entries_from_handoff(handoff: &PlaylistHandoff) -> SeededPlaylist {
    let len = handoff.sources.len();
    let titles = parallel(handoff.titles.as_deref(), len, "titles");
    let artists = parallel(handoff.artists.as_deref(), len, "artists");
    let kinds = parallel(handoff.media_kinds.as_deref(), len, "media_kinds");

    let entries = handoff
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let kind = kinds.and_then(|k| k.get(i)).copied().unwrap_or_default();
            let mut entry = PlaylistEntry::new(source.clone(), kind);
            if let Some(title) = titles
                .and_then(|t| t.get(i))
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
            {
                entry.title = title.to_string();
            }
            entry.artist = artists
                .and_then(|a| a.get(i))
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .map(str::to_string);
            entry
        })
        .collect();

    let start_index = if handoff.start_index < len {
        handoff.start_index
    } else {
        if len > 0 {
            warn!(
                start_index = handoff.start_index,
                len, "Handoff start index out of range, starting at 0"
            );
        }
        0
    };

    SeededPlaylist {
        entries,
        start_index,
    }
}

fn parallel<'a, T>(values: Option<&'a [T]>, len: usize, field: &str) -> Option<&'a [T]> {
    if let Some(values) = values.filter(|values| values.len() != len) {
        warn!(
            field,
            expected = len,
            actual = values.len(),
            "Handoff array length differs from sources"
        );
    }
    values
}

/// Advance direction through the playlist; both wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Snapshot a (re)attaching surface reads instead of trusting saved flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlaybackStatus {
    pub index: Option<usize>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub is_playing: bool,
    pub is_repeat: bool,
    pub context: SurfaceContext,
    pub pending_switch: Option<SwitchRequest>,
    pub entry_count: usize,
    /// Every entry failed in a row; cleared by navigation or a new playlist.
    pub nothing_playable: bool,
}

/// Position sample for progress displays and the video mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackProgress {
    pub index: Option<usize>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub is_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_from_paths_and_urls() {
        assert_eq!(derive_title("/sdcard/Music/Blue Song.mp3"), "Blue Song");
        assert_eq!(
            derive_title("https://cdn.example.com/v/clip.mp4?sig=abc"),
            "clip"
        );
        assert_eq!(derive_title("noext"), "noext");
    }

    #[test]
    fn test_context_hosts() {
        assert!(SurfaceContext::Audio.hosts(MediaKind::Audio));
        assert!(!SurfaceContext::Audio.hosts(MediaKind::Video));
        assert!(SurfaceContext::Video.hosts(MediaKind::Video));
        assert!(SurfaceContext::Unknown.hosts(MediaKind::Video));
        assert_eq!(SurfaceContext::from(None), SurfaceContext::Unknown);
    }

    #[test]
    fn test_handoff_with_parallel_arrays() {
        let handoff = PlaylistHandoff::new(vec!["a.mp3".into(), "b.mp4".into()])
            .with_titles(vec!["Song A".into(), "Clip B".into()])
            .with_artists(vec!["Artist".into(), "".into()])
            .with_media_kinds(vec![MediaKind::Audio, MediaKind::Video])
            .starting_at(1);

        let seeded = entries_from_handoff(&handoff);
        assert_eq!(seeded.start_index, 1);
        assert_eq!(seeded.entries[0].title, "Song A");
        assert_eq!(seeded.entries[0].artist.as_deref(), Some("Artist"));
        assert_eq!(seeded.entries[1].artist, None);
        assert_eq!(seeded.entries[1].media_kind, MediaKind::Video);
    }

    #[test]
    fn test_handoff_tolerates_mismatched_arrays() {
        let handoff = PlaylistHandoff::new(vec![
            "/m/one.mp3".into(),
            "/m/two.mp4".into(),
            "/m/three.mp3".into(),
        ])
        .with_titles(vec!["Only one".into()])
        .with_artists(vec!["A".into(), "B".into(), "C".into(), "extra".into()])
        .with_media_kinds(vec![MediaKind::Audio, MediaKind::Video])
        .starting_at(9);

        let seeded = entries_from_handoff(&handoff);
        assert_eq!(seeded.start_index, 0);
        assert_eq!(seeded.entries.len(), 3);
        assert_eq!(seeded.entries[0].title, "Only one");
        assert_eq!(seeded.entries[1].title, "two");
        assert_eq!(seeded.entries[2].artist.as_deref(), Some("C"));

        let kinds: Vec<MediaKind> = seeded.entries.iter().map(|e| e.media_kind).collect();
        assert_eq!(
            kinds,
            vec![MediaKind::Audio, MediaKind::Video, MediaKind::Audio]
        );
    }
}
