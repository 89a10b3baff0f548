//! Media player bridge traits and supporting types.
//!
//! The core never decodes media itself. It drives one native player handle at a
//! time (Android `MediaPlayer`, AVPlayer, a desktop backend) through
//! [`MediaPlayer`], created on demand by the host's [`MediaPlayerFactory`].
//! Asynchronous host callbacks come back as [`PlayerEvent`]s tagged with the
//! [`PlayerToken`] of the handle that produced them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;

/// Media type of a playlist entry.
///
/// Entries without an explicit tag are treated as audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Audio,
    Video,
}

impl MediaKind {
    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Resolved location handed to the native player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlayerSource {
    /// Local file readable by the host.
    LocalFile { path: PathBuf },
    /// Remote `http(s)` stream fetched by the host player.
    RemoteStream { url: String },
}

impl PlayerSource {
    /// Remote sources must be prepared asynchronously.
    pub fn is_remote(&self) -> bool {
        matches!(self, PlayerSource::RemoteStream { .. })
    }
}

/// Audio attributes the native player is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioProfile {
    /// Music content routed through the media stream.
    #[default]
    Music,
    /// Movie content; used by the visual-only mirror player.
    Movie,
}

/// Identity of one native player instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerToken(Uuid);

impl PlayerToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the factory needs to construct a native player.
#[derive(Debug, Clone)]
pub struct PlayerRequest {
    /// Token the host must attach to every [`PlayerEvent`] of this player.
    pub token: PlayerToken,
    pub source: PlayerSource,
    pub profile: AudioProfile,
    pub looping: bool,
    /// Normalized `0.0..=1.0`.
    pub volume: f32,
}

impl PlayerRequest {
    pub fn new(source: PlayerSource) -> Self {
        Self {
            token: PlayerToken::new(),
            source,
            profile: AudioProfile::Music,
            looping: false,
            volume: 1.0,
        }
    }

    pub fn with_profile(mut self, profile: AudioProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

/// Classified native player failure.
///
/// Mirrors the error/extra codes platform players report; classification only
/// affects logging, every failure is handled by skipping the entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerFailure {
    #[error("media server died")]
    Server,
    #[error("malformed media stream")]
    MalformedStream,
    #[error("unsupported media format")]
    Unsupported,
    #[error("operation timed out")]
    TimedOut,
    #[error("network or file I/O failure")]
    Io,
    #[error("unknown player error (what={what}, extra={extra})")]
    Unknown { what: i32, extra: i32 },
}

impl PlayerFailure {
    pub fn is_network(&self) -> bool {
        matches!(self, PlayerFailure::Io | PlayerFailure::TimedOut)
    }
}

/// Asynchronous callback from a native player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// `prepare_async` finished; the player can be started.
    Prepared,
    /// Playback reached the end of the stream (never fired while looping).
    Completed,
    /// Preparation or playback failed.
    Error(PlayerFailure),
}

/// One native player handle.
///
/// Owned by exactly one engine. After [`release`](MediaPlayer::release) the
/// handle must not emit further events; late events are filtered by token
/// anyway.
#[async_trait]
pub trait MediaPlayer: Send {
    fn token(&self) -> PlayerToken;

    /// Prepare synchronously (local sources).
    async fn prepare(&mut self) -> Result<()>;

    /// Begin preparing in the background; completion arrives as
    /// [`PlayerEvent::Prepared`] or [`PlayerEvent::Error`].
    async fn prepare_async(&mut self) -> Result<()>;

    async fn start(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn seek_to(&mut self, position: Duration) -> Result<()>;

    async fn set_looping(&mut self, looping: bool) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn position(&self) -> Duration;

    /// `None` until prepared or for live streams.
    fn duration(&self) -> Option<Duration>;

    /// Free native resources. Must be safe to call in any state.
    async fn release(&mut self);
}

/// Host factory for native players.
///
/// # Example
///
/// ```ignore
/// let request = PlayerRequest::new(PlayerSource::LocalFile { path })
///     .with_looping(repeat);
/// let mut player = factory.create(request).await?;
/// player.prepare().await?;
/// player.start().await?;
/// ```
#[async_trait]
pub trait MediaPlayerFactory: Send + Sync {
    async fn create(&self, request: PlayerRequest) -> Result<Box<dyn MediaPlayer>>;
}
