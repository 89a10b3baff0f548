//! # Playback Engine
//!
//! Holds at most one native player. Every start releases the previous handle
//! (awaited, not fire-and-forget) before the factory is asked for a new one.
//!
//! Local sources prepare synchronously and start at once. Remote sources
//! prepare in the background; the engine only starts them when the matching
//! [`PlayerEvent::Prepared`](bridge_traits::PlayerEvent::Prepared) arrives.

use bridge_traits::{
    AudioProfile, MediaPlayer, MediaPlayerFactory, PlayerRequest, PlayerSource, PlayerToken,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

/// Lifecycle of the active player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Waiting for the async prepared callback.
    Preparing,
    Playing,
    Paused,
}

/// Result of [`PlaybackEngine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The player is rendering.
    Started,
    /// Remote source; started once the prepared callback arrives.
    Preparing,
}

struct ActivePlayer {
    player: Box<dyn MediaPlayer>,
    token: PlayerToken,
    index: usize,
    source: PlayerSource,
    state: PlayerState,
    /// Cleared by a pause that lands while still preparing.
    start_when_prepared: bool,
}

/// Exclusive owner of the single native player handle.
pub struct PlaybackEngine {
    factory: Arc<dyn MediaPlayerFactory>,
    active: Option<ActivePlayer>,
}

impl PlaybackEngine {
    pub fn new(factory: Arc<dyn MediaPlayerFactory>) -> Self {
        Self {
            factory,
            active: None,
        }
    }

    /// Release any current player, then create and prepare one for `source`.
    ///
    /// On error the new player has already been released.
    pub async fn start(
        &mut self,
        index: usize,
        source: PlayerSource,
        looping: bool,
    ) -> Result<StartOutcome> {
        self.release().await;

        let request = PlayerRequest::new(source.clone())
            .with_profile(AudioProfile::Music)
            .with_looping(looping);
        let token = request.token;
        let mut player = self.factory.create(request).await?;

        if source.is_remote() {
            if let Err(e) = player.prepare_async().await {
                player.release().await;
                return Err(e.into());
            }
            debug!(%token, index, "Preparing remote source");
            self.active = Some(ActivePlayer {
                player,
                token,
                index,
                source,
                state: PlayerState::Preparing,
                start_when_prepared: true,
            });
            return Ok(StartOutcome::Preparing);
        }

        let prepared = match player.prepare().await {
            Ok(()) => player.start().await,
            Err(e) => Err(e),
        };
        if let Err(e) = prepared {
            player.release().await;
            return Err(e.into());
        }

        debug!(%token, index, "Started local source");
        self.active = Some(ActivePlayer {
            player,
            token,
            index,
            source,
            state: PlayerState::Playing,
            start_when_prepared: false,
        });
        Ok(StartOutcome::Started)
    }

    /// Handle the async prepared callback for `token`.
    ///
    /// Returns `Ok(true)` when the player started rendering.
    pub async fn on_prepared(&mut self, token: PlayerToken) -> Result<bool> {
        let Some(active) = self.active.as_mut().filter(|a| a.token == token) else {
            return Ok(false);
        };
        if active.state != PlayerState::Preparing {
            return Ok(false);
        }

        if active.start_when_prepared {
            active.player.start().await?;
            active.state = PlayerState::Playing;
            Ok(true)
        } else {
            active.state = PlayerState::Paused;
            Ok(false)
        }
    }

    /// Whether callbacks carrying `token` belong to the live player.
    pub fn accepts(&self, token: PlayerToken) -> bool {
        self.active.as_ref().is_some_and(|a| a.token == token)
    }

    pub fn has_player(&self) -> bool {
        self.active.is_some()
    }

    pub fn token(&self) -> Option<PlayerToken> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.active.as_ref().map(|a| a.state)
    }

    /// Index and source of the live player.
    pub fn active_source(&self) -> Option<(usize, PlayerSource)> {
        self.active.as_ref().map(|a| (a.index, a.source.clone()))
    }

    pub fn is_preparing(&self) -> bool {
        self.state() == Some(PlayerState::Preparing)
    }

    pub fn is_playing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.state == PlayerState::Playing && a.player.is_playing())
    }

    pub fn position(&self) -> Duration {
        self.active
            .as_ref()
            .filter(|a| a.state != PlayerState::Preparing)
            .map(|a| a.player.position())
            .unwrap_or_default()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.active
            .as_ref()
            .filter(|a| a.state != PlayerState::Preparing)
            .and_then(|a| a.player.duration())
    }

    /// Resume playback. Returns `Ok(true)` if the state changed.
    pub async fn play(&mut self) -> Result<bool> {
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };
        match active.state {
            PlayerState::Playing => Ok(false),
            PlayerState::Preparing => {
                let changed = !active.start_when_prepared;
                active.start_when_prepared = true;
                Ok(changed)
            }
            PlayerState::Paused => {
                active.player.start().await?;
                active.state = PlayerState::Playing;
                Ok(true)
            }
        }
    }

    /// Pause playback. Returns `Ok(true)` if the state changed.
    pub async fn pause(&mut self) -> Result<bool> {
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };
        match active.state {
            PlayerState::Paused => Ok(false),
            PlayerState::Preparing => {
                let changed = active.start_when_prepared;
                active.start_when_prepared = false;
                Ok(changed)
            }
            PlayerState::Playing => {
                active.player.pause().await?;
                active.state = PlayerState::Paused;
                Ok(true)
            }
        }
    }

    /// Whether a play/pause toggle should pause.
    pub fn wants_pause(&self) -> bool {
        self.active.as_ref().is_some_and(|a| match a.state {
            PlayerState::Playing => true,
            PlayerState::Preparing => a.start_when_prepared,
            PlayerState::Paused => false,
        })
    }

    /// Seek within `[0, duration]`. No-op without a prepared player.
    pub async fn seek_to(&mut self, position: Duration) -> Result<Option<Duration>> {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|a| a.state != PlayerState::Preparing)
        else {
            return Ok(None);
        };

        let target = match active.player.duration() {
            Some(duration) => position.min(duration),
            None => position,
        };
        active.player.seek_to(target).await?;
        Ok(Some(target))
    }

    /// Seek forward by `step`, clamped to the duration.
    pub async fn fast_forward(&mut self, step: Duration) -> Result<Option<Duration>> {
        let target = self.position().saturating_add(step);
        self.seek_to(target).await
    }

    /// Seek backward by `step`, floored at zero.
    pub async fn fast_rewind(&mut self, step: Duration) -> Result<Option<Duration>> {
        let target = self.position().saturating_sub(step);
        self.seek_to(target).await
    }

    pub async fn set_looping(&mut self, looping: bool) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.player.set_looping(looping).await?;
        }
        Ok(())
    }

    /// Release the active player, if any. Safe in every state.
    pub async fn release(&mut self) {
        if let Some(mut active) = self.active.take() {
            debug!(token = %active.token, index = active.index, "Releasing player");
            active.player.release().await;
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            warn!(
                token = %active.token,
                "Playback engine dropped with a live player; call release() first"
            );
        }
    }
}
