//! # Visual Playback Mirror
//!
//! For video entries the engine stays the only audible player. The video
//! surface renders a second, muted player for the same source and keeps it
//! aligned with the engine through periodic position corrections.
//!
//! A remote visual player is not touched until its own
//! [`PlayerEvent::Prepared`] arrives. The host routes that player's callbacks
//! through the [`MirrorLink`] returned by [`spawn_mirror_sync`]; every other
//! token still goes to [`PlaybackHandle::player_event`].
//!
//! ```ignore
//! let link = spawn_mirror_sync(mirror, handle.clone())?;
//! // native callback
//! if link.owns(token) {
//!     link.player_event(token, event).await?;
//! } else {
//!     handle.player_event(token, event).await?;
//! }
//! ```

use bridge_traits::{
    AudioProfile, MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerRequest, PlayerSource,
    PlayerToken,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MirrorConfig;
use crate::error::{PlaybackError, Result};
use crate::service::PlaybackHandle;
use crate::types::PlaybackProgress;

const EVENT_QUEUE_DEPTH: usize = 16;

/// What a correction pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorCorrection {
    /// The engine moved to another entry; the visual player was released.
    Detached,
    /// The visual player has not reported `Prepared` yet.
    Preparing,
    InSync,
    Resumed,
    Paused,
    /// The visual player was re-seeked to the engine position.
    Seeked { drift: Duration },
}

struct VisualPlayer {
    player: Box<dyn MediaPlayer>,
    index: usize,
    prepared: bool,
    playing: bool,
}

/// Muted visual-only player following the engine.
pub struct VideoMirror {
    factory: Arc<dyn MediaPlayerFactory>,
    config: MirrorConfig,
    visual: Option<VisualPlayer>,
}

impl VideoMirror {
    pub fn new(factory: Arc<dyn MediaPlayerFactory>, config: MirrorConfig) -> Self {
        Self {
            factory,
            config,
            visual: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.visual.is_some()
    }

    pub fn is_prepared(&self) -> bool {
        self.visual.as_ref().is_some_and(|v| v.prepared)
    }

    pub fn index(&self) -> Option<usize> {
        self.visual.as_ref().map(|v| v.index)
    }

    /// Token of the visual player, for routing its callbacks.
    pub fn token(&self) -> Option<PlayerToken> {
        self.visual.as_ref().map(|v| v.player.token())
    }

    /// Create the visual player for the entry at `index`.
    ///
    /// Local sources are ready on return. Remote sources wait for
    /// [`PlayerEvent::Prepared`] via [`VideoMirror::on_player_event`].
    pub async fn attach(&mut self, index: usize, source: PlayerSource) -> Result<()> {
        self.detach().await;

        let remote = source.is_remote();
        let request = PlayerRequest::new(source)
            .with_profile(AudioProfile::Movie)
            .with_volume(self.config.volume);
        let mut player = self.factory.create(request).await?;

        let prepared = if remote {
            player.prepare_async().await
        } else {
            player.prepare().await
        };
        if let Err(e) = prepared {
            player.release().await;
            return Err(e.into());
        }

        debug!(index, remote, "Video mirror attached");
        self.visual = Some(VisualPlayer {
            player,
            index,
            prepared: !remote,
            playing: false,
        });
        Ok(())
    }

    /// Apply a callback from the visual player.
    ///
    /// Tokens of other players are ignored. A player error releases the
    /// visual player.
    pub async fn on_player_event(&mut self, token: PlayerToken, event: PlayerEvent) {
        let Some(visual) = self.visual.as_mut().filter(|v| v.player.token() == token) else {
            debug!(%token, ?event, "Dropping callback for another player");
            return;
        };

        match event {
            PlayerEvent::Prepared => {
                debug!(index = visual.index, "Video mirror prepared");
                visual.prepared = true;
            }
            PlayerEvent::Completed => visual.playing = false,
            PlayerEvent::Error(failure) => {
                warn!(index = visual.index, %failure, "Video mirror player failed");
                self.detach().await;
            }
        }
    }

    /// Align the visual player with an engine sample.
    pub async fn correct(&mut self, progress: &PlaybackProgress) -> Result<MirrorCorrection> {
        let Some(visual) = self.visual.as_mut() else {
            return Err(PlaybackError::NoActivePlayer);
        };

        if progress.index != Some(visual.index) {
            self.detach().await;
            return Ok(MirrorCorrection::Detached);
        }
        if !visual.prepared {
            return Ok(MirrorCorrection::Preparing);
        }

        let position = visual.player.position();
        let drift = if position > progress.position {
            position - progress.position
        } else {
            progress.position - position
        };
        if drift > self.config.drift_tolerance {
            visual.player.seek_to(progress.position).await?;
        }

        let correction = match (progress.is_playing, visual.playing) {
            (true, false) => {
                visual.player.start().await?;
                visual.playing = true;
                MirrorCorrection::Resumed
            }
            (false, true) => {
                visual.player.pause().await?;
                visual.playing = false;
                MirrorCorrection::Paused
            }
            _ if drift > self.config.drift_tolerance => MirrorCorrection::Seeked { drift },
            _ => MirrorCorrection::InSync,
        };
        Ok(correction)
    }

    /// Release the visual player, if any.
    pub async fn detach(&mut self) {
        if let Some(mut visual) = self.visual.take() {
            debug!(index = visual.index, "Video mirror detached");
            visual.player.release().await;
        }
    }
}

/// Host side of a running mirror: callback routing and cancellation.
#[derive(Clone)]
pub struct MirrorLink {
    token: PlayerToken,
    events: mpsc::Sender<(PlayerToken, PlayerEvent)>,
    cancel: CancellationToken,
}

impl MirrorLink {
    pub fn token(&self) -> PlayerToken {
        self.token
    }

    /// Whether `token` belongs to the visual player.
    pub fn owns(&self, token: PlayerToken) -> bool {
        self.token == token
    }

    /// Forward a callback of the visual player.
    ///
    /// Fails with [`PlaybackError::NoActivePlayer`] once the mirror has
    /// stopped.
    pub async fn player_event(&self, token: PlayerToken, event: PlayerEvent) -> Result<()> {
        self.events
            .send((token, event))
            .await
            .map_err(|_| PlaybackError::NoActivePlayer)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.events.is_closed()
    }
}

/// Run an attached mirror on its own task.
pub fn spawn_mirror_sync(mirror: VideoMirror, handle: PlaybackHandle) -> Result<MirrorLink> {
    let token = mirror.token().ok_or(PlaybackError::NoActivePlayer)?;
    let (events, receiver) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let cancel = CancellationToken::new();

    tokio::spawn(run_mirror_sync(mirror, handle, receiver, cancel.clone()));
    Ok(MirrorLink {
        token,
        events,
        cancel,
    })
}

/// Correct `mirror` against the service until cancelled, detached or the
/// service stops. The visual player is released on exit.
pub async fn run_mirror_sync(
    mut mirror: VideoMirror,
    handle: PlaybackHandle,
    mut events: mpsc::Receiver<(PlayerToken, PlayerEvent)>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(mirror.config.correction_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv(), if events_open => match event {
                Some((token, event)) => {
                    mirror.on_player_event(token, event).await;
                    if !mirror.is_attached() {
                        break;
                    }
                }
                None => events_open = false,
            },
            _ = ticker.tick() => {
                let Ok(progress) = handle.progress().await else {
                    break;
                };
                match mirror.correct(&progress).await {
                    Ok(MirrorCorrection::Detached) | Err(PlaybackError::NoActivePlayer) => break,
                    Ok(MirrorCorrection::InSync | MirrorCorrection::Preparing) => {}
                    Ok(correction) => debug!(?correction, "Video mirror corrected"),
                    Err(e) => warn!(error = %e, "Video mirror correction failed"),
                }
            }
        }
    }

    mirror.detach().await;
}
