//! # Event Bus System
//!
//! Broadcasts playback state changes to non-surface observers (analytics,
//! FFI hosts, debug overlays) using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Hosting surfaces receive engine notifications through their listener
//! interface. Every such notification is also mirrored here as a typed
//! [`CoreEvent`] so other components can observe playback without
//! registering as a surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐   subscribe   ┌────────────┐
//! │ PlaybackService  ├──────────>│ EventBus  ├──────────────>│ Subscriber │
//! └──────────────────┘           │ (broadcast│               └────────────┘
//! ┌──────────────────┐   emit    │  channel) │   subscribe   ┌────────────┐
//! │ Surface switcher ├──────────>│           ├──────────────>│ Subscriber │
//! └──────────────────┘           └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::RepeatChanged { is_repeat: true }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Repeat toggled");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! `emit` fails when nobody is subscribed; publishers ignore that error.

use bridge_traits::MediaKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Engine and playlist events
    Playback(PlaybackEvent),
    /// Hosting surface handoff events
    Surface(SurfaceEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Surface(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::NothingPlayable { .. }) => EventSeverity::Error,
            CoreEvent::Surface(SurfaceEvent::LaunchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::TrackSkipped { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::TrackStarted { .. }) => EventSeverity::Info,
            CoreEvent::Surface(SurfaceEvent::SwitchRequested { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the playback coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The current playlist index (and displayed title) changed.
    PositionChanged {
        index: usize,
        title: String,
    },
    /// A native player started rendering the entry.
    TrackStarted {
        index: usize,
        title: String,
        media_kind: MediaKind,
        /// Whether the entry streams from a remote URL.
        remote: bool,
    },
    /// Play/pause state as reported to surfaces.
    StateChanged {
        is_playing: bool,
    },
    RepeatChanged {
        is_repeat: bool,
    },
    /// The entry could not be resolved or played and was skipped.
    TrackSkipped {
        index: usize,
        /// Classified cause, for logging only.
        reason: String,
    },
    /// Every entry failed in a row; playback stopped.
    NothingPlayable {
        attempts: usize,
    },
    /// Playback was stopped and the player released.
    Stopped,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::PositionChanged { .. } => "Playlist position changed",
            PlaybackEvent::TrackStarted { .. } => "Track started",
            PlaybackEvent::StateChanged { is_playing: true } => "Playback playing",
            PlaybackEvent::StateChanged { is_playing: false } => "Playback paused",
            PlaybackEvent::RepeatChanged { .. } => "Repeat toggled",
            PlaybackEvent::TrackSkipped { .. } => "Track skipped",
            PlaybackEvent::NothingPlayable { .. } => "Nothing playable in playlist",
            PlaybackEvent::Stopped => "Playback stopped",
        }
    }
}

// ============================================================================
// Surface Events
// ============================================================================

/// Events related to handing playback between hosting surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SurfaceEvent {
    /// The entry at `index` needs the other surface kind.
    SwitchRequested {
        index: usize,
        media_kind: MediaKind,
    },
    /// A surface declared which media kind it hosts.
    ContextChanged {
        /// `None` when the hosting surface is unknown.
        context: Option<MediaKind>,
    },
    /// Opening the requested surface failed.
    LaunchFailed {
        media_kind: MediaKind,
        message: String,
    },
}

impl SurfaceEvent {
    fn description(&self) -> &str {
        match self {
            SurfaceEvent::SwitchRequested { .. } => "Surface switch requested",
            SurfaceEvent::ContextChanged { .. } => "Surface context changed",
            SurfaceEvent::LaunchFailed { .. } => "Surface launch failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every [`subscribe`](Self::subscribe)
/// creates an independent receiver that only sees events emitted afterwards.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let surface_events = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Surface(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`/`try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
