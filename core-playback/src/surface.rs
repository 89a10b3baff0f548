//! # Surface-Switch Protocol
//!
//! Hosting surfaces register a [`SurfaceListener`] and receive every position,
//! play state and repeat change. When the entry at a new position needs the
//! other surface kind, listeners get `on_switch_requested` instead of a
//! player starting; [`perform_switch`] is the usual way to answer it.

use bridge_traits::{MediaKind, PlaylistHandoff, SurfaceLauncher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PlaybackError, Result};

/// Callbacks a hosting surface implements.
///
/// Called from the playback service task; implementations must not block.
/// A listener may add or remove listeners from inside a callback.
pub trait SurfaceListener: Send + Sync {
    /// Fired on every index change, switch or not.
    fn on_position_changed(&self, index: usize, title: &str);

    fn on_playback_state_changed(&self, is_playing: bool);

    fn on_repeat_changed(&self, is_repeat: bool);

    /// The entry at `index` needs a `media_kind` surface.
    fn on_switch_requested(&self, index: usize, media_kind: MediaKind);

    /// Every entry failed in a row and playback stopped.
    fn on_nothing_playable(&self) {}
}

/// Pending request for the other surface kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub index: usize,
    pub media_kind: MediaKind,
}

/// Set of registered listeners, shared between the service and its handles.
///
/// Dispatch iterates a snapshot, so listeners may mutate the set mid-callback.
#[derive(Clone, Default)]
pub struct ListenerSet {
    inner: Arc<RwLock<Vec<Arc<dyn SurfaceListener>>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. Returns `false` if it was already registered.
    pub fn add(&self, listener: Arc<dyn SurfaceListener>) -> bool {
        let mut listeners = self.inner.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister `listener`. Returns `false` if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn SurfaceListener>) -> bool {
        let mut listeners = self.inner.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn SurfaceListener>> {
        self.inner.read().clone()
    }

    pub fn position_changed(&self, index: usize, title: &str) {
        for listener in self.snapshot() {
            listener.on_position_changed(index, title);
        }
    }

    pub fn playback_state_changed(&self, is_playing: bool) {
        for listener in self.snapshot() {
            listener.on_playback_state_changed(is_playing);
        }
    }

    pub fn repeat_changed(&self, is_repeat: bool) {
        for listener in self.snapshot() {
            listener.on_repeat_changed(is_repeat);
        }
    }

    pub fn switch_requested(&self, request: SwitchRequest) {
        for listener in self.snapshot() {
            listener.on_switch_requested(request.index, request.media_kind);
        }
    }

    pub fn nothing_playable(&self) {
        for listener in self.snapshot() {
            listener.on_nothing_playable();
        }
    }
}

// Compare data pointers only; vtable addresses are not unique.
fn same_listener(a: &Arc<dyn SurfaceListener>, b: &Arc<dyn SurfaceListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Open the surface `request` asks for, handing it the playlist.
///
/// On failure the user sees a transient message and the engine stays idle
/// at the requested index until a surface claims it.
pub async fn perform_switch(
    launcher: &dyn SurfaceLauncher,
    request: SwitchRequest,
    handoff: PlaylistHandoff,
) -> Result<()> {
    let handoff = handoff
        .starting_at(request.index)
        .for_context(request.media_kind);

    info!(
        index = request.index,
        surface = %request.media_kind,
        "Launching surface for switch"
    );

    if let Err(e) = launcher.launch(request.media_kind, handoff).await {
        let message = format!("Unable to open the {} player", request.media_kind);
        if let Err(toast_err) = launcher.show_transient_message(&message).await {
            warn!(error = %toast_err, "Failed to show transient message");
        }
        return Err(PlaybackError::SurfaceLaunchFailed {
            media_kind: request.media_kind,
            message: e.to_string(),
        });
    }
    Ok(())
}
