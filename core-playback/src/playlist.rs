//! # Playlist / Position State Machine
//!
//! Owns the entries, the current index, the repeat flag and the hosting
//! surface context. Pure state: the coordinator performs the side effects
//! each [`Dispatch`] calls for.

use bridge_traits::MediaKind;

use crate::types::{Direction, PlaylistEntry, SurfaceContext};

/// What the coordinator must do for the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The hosting surface matches; start a player.
    Play { index: usize },
    /// The entry needs the other surface kind; do not start a player.
    Switch { index: usize, media_kind: MediaKind },
}

/// Engine-owned playlist state.
///
/// Invariant: `index < entries.len()` whenever `entries` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    index: usize,
    repeat: bool,
    context: SurfaceContext,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entries and context. The repeat flag carries over.
    pub fn seed(&mut self, entries: Vec<PlaylistEntry>, start_index: usize, context: SurfaceContext) {
        self.index = if start_index < entries.len() {
            start_index
        } else {
            0
        };
        self.entries = entries;
        self.context = context;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    /// Current index, `None` for an empty playlist.
    pub fn index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.index)
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.index)
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    /// Move one step, wrapping at both ends. No-op on an empty playlist.
    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        self.index = match direction {
            Direction::Next => (self.index + 1) % len,
            Direction::Previous => (self.index + len - 1) % len,
        };
        Some(self.index)
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Flip the repeat flag and return the new value.
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    pub fn context(&self) -> SurfaceContext {
        self.context
    }

    pub fn set_context(&mut self, context: SurfaceContext) {
        self.context = context;
    }

    /// Compare the current entry's kind with the hosting context.
    pub fn dispatch(&self) -> Option<Dispatch> {
        let entry = self.current()?;
        let index = self.index;
        if self.context.hosts(entry.media_kind) {
            Some(Dispatch::Play { index })
        } else {
            Some(Dispatch::Switch {
                index,
                media_kind: entry.media_kind,
            })
        }
    }
}
