//! Notification and Media Session Abstractions
//!
//! The persistent transport notification and the OS media session (lock
//! screen, Bluetooth, hardware keys) are both rendered by the host from
//! snapshots the core computes. Neither is observed automatically: the core
//! pushes a fresh snapshot after every state mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::playback::MediaKind;

// ============================================================================
// Commands
// ============================================================================

/// Transport command delivered from a notification action, a media session
/// callback or any other external trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "position_ms", rename_all = "snake_case")]
pub enum MediaCommand {
    PlayPause,
    Play,
    Pause,
    Next,
    Previous,
    FastForward,
    FastRewind,
    ToggleRepeat,
    Stop,
    /// Absolute seek requested by a session scrubber.
    #[serde(with = "duration_ms")]
    SeekTo(Duration),
}

impl MediaCommand {
    /// Actions wired into the persistent notification, in display order.
    pub const NOTIFICATION_ACTIONS: [MediaCommand; 7] = [
        MediaCommand::ToggleRepeat,
        MediaCommand::FastRewind,
        MediaCommand::Previous,
        MediaCommand::PlayPause,
        MediaCommand::Next,
        MediaCommand::FastForward,
        MediaCommand::Stop,
    ];

    /// Stable intent action string. `None` for commands that carry a payload.
    pub fn as_action(&self) -> Option<&'static str> {
        match self {
            MediaCommand::PlayPause => Some("media.play_pause"),
            MediaCommand::Play => Some("media.play"),
            MediaCommand::Pause => Some("media.pause"),
            MediaCommand::Next => Some("media.next"),
            MediaCommand::Previous => Some("media.previous"),
            MediaCommand::FastForward => Some("media.fast_forward"),
            MediaCommand::FastRewind => Some("media.fast_rewind"),
            MediaCommand::ToggleRepeat => Some("media.toggle_repeat"),
            MediaCommand::Stop => Some("media.stop"),
            MediaCommand::SeekTo(_) => None,
        }
    }

    /// Parse an intent action string produced by [`as_action`](Self::as_action).
    pub fn from_action(action: &str) -> Option<Self> {
        let command = match action {
            "media.play_pause" => MediaCommand::PlayPause,
            "media.play" => MediaCommand::Play,
            "media.pause" => MediaCommand::Pause,
            "media.next" => MediaCommand::Next,
            "media.previous" => MediaCommand::Previous,
            "media.fast_forward" => MediaCommand::FastForward,
            "media.fast_rewind" => MediaCommand::FastRewind,
            "media.toggle_repeat" => MediaCommand::ToggleRepeat,
            "media.stop" => MediaCommand::Stop,
            _ => return None,
        };
        Some(command)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

// ============================================================================
// Notification
// ============================================================================

/// Everything the host needs to render the transport notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingNotification {
    pub title: String,
    pub artist: Option<String>,
    /// Selects the play or pause icon.
    pub is_playing: bool,
    pub is_repeat: bool,
    /// Enabled actions, each dispatched back as a [`MediaCommand`].
    pub actions: Vec<MediaCommand>,
    /// Surface kind the content-tap intent must reopen.
    pub reopen_surface: MediaKind,
}

/// Host presenter for the persistent transport notification.
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// Create or replace the notification content.
    async fn show(&self, notification: NowPlayingNotification) -> Result<()>;

    /// Promote the hosting service to foreground with this notification.
    async fn start_foreground(&self, notification: NowPlayingNotification) -> Result<()>;

    /// Leave foreground state; `remove_notification` also dismisses it.
    async fn stop_foreground(&self, remove_notification: bool) -> Result<()>;

    /// Dismiss the notification entirely.
    async fn cancel(&self) -> Result<()>;
}

// ============================================================================
// Media Session
// ============================================================================

/// Playback status reported to the OS media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Snapshot pushed to the OS media session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionPlaybackStatus,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub can_play: bool,
    pub can_pause: bool,
    pub can_seek: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

/// Host media session (MediaSessionCompat, MPNowPlayingInfoCenter, MPRIS).
///
/// Commands from the session are routed back into the core as
/// [`MediaCommand`]s by the host.
#[async_trait]
pub trait MediaSessionBridge: Send + Sync {
    async fn set_state(&self, state: SessionState) -> Result<()>;

    async fn set_active(&self, active: bool) -> Result<()>;

    /// Tear the session down; called once on engine shutdown.
    async fn release(&self) -> Result<()>;
}
