//! # Notification / Session Bridge
//!
//! Both the transport notification and the media session are rendered from
//! one [`NowPlaying`] snapshot that the coordinator recomputes after every
//! mutation. Host failures are logged and never interrupt playback.

use bridge_traits::{
    MediaCommand, MediaKind, MediaSessionBridge, NotificationPresenter, NowPlayingNotification,
    SessionPlaybackStatus, SessionState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Engine state both host surfaces are derived from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NowPlaying {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub media_kind: MediaKind,
    pub is_playing: bool,
    pub is_repeat: bool,
    pub has_player: bool,
    pub has_entries: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl NowPlaying {
    pub fn notification(&self) -> NowPlayingNotification {
        NowPlayingNotification {
            title: self.title.clone().unwrap_or_default(),
            artist: self.artist.clone(),
            is_playing: self.is_playing,
            is_repeat: self.is_repeat,
            actions: MediaCommand::NOTIFICATION_ACTIONS.to_vec(),
            reopen_surface: self.media_kind,
        }
    }

    pub fn session_state(&self) -> SessionState {
        let status = match (self.has_player, self.is_playing) {
            (true, true) => SessionPlaybackStatus::Playing,
            (true, false) => SessionPlaybackStatus::Paused,
            (false, _) => SessionPlaybackStatus::Stopped,
        };
        SessionState {
            status,
            title: self.title.clone(),
            artist: self.artist.clone(),
            position: self.position,
            duration: self.duration,
            can_play: self.has_player && !self.is_playing,
            can_pause: self.is_playing,
            can_seek: self.has_player && self.duration.is_some(),
            can_go_next: self.has_entries,
            can_go_previous: self.has_entries,
        }
    }
}

/// Keeps the host notification and media session in step with the engine.
#[derive(Default)]
pub struct SessionBridge {
    presenter: Option<Arc<dyn NotificationPresenter>>,
    session: Option<Arc<dyn MediaSessionBridge>>,
    foreground: bool,
    session_active: bool,
}

impl SessionBridge {
    pub fn new(
        presenter: Option<Arc<dyn NotificationPresenter>>,
        session: Option<Arc<dyn MediaSessionBridge>>,
    ) -> Self {
        Self {
            presenter,
            session,
            foreground: false,
            session_active: false,
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    /// Re-render both surfaces; promotes to foreground once playback starts.
    pub async fn refresh(&mut self, now: &NowPlaying) {
        if let Some(presenter) = &self.presenter {
            if now.has_entries {
                let notification = now.notification();
                let result = if now.is_playing && !self.foreground {
                    debug!("Promoting playback to foreground");
                    presenter.start_foreground(notification).await.map(|_| {
                        self.foreground = true;
                    })
                } else {
                    presenter.show(notification).await
                };
                if let Err(e) = result {
                    warn!(error = %e, "Failed to update notification");
                }
            }
        }

        if let Some(session) = &self.session {
            if now.has_player && !self.session_active {
                match session.set_active(true).await {
                    Ok(()) => self.session_active = true,
                    Err(e) => warn!(error = %e, "Failed to activate media session"),
                }
            }
            if let Err(e) = session.set_state(now.session_state()).await {
                warn!(error = %e, "Failed to update media session");
            }
        }
    }

    /// Leave the foreground, keeping or removing the notification.
    pub async fn demote(&mut self, remove_notification: bool) {
        if !self.foreground {
            return;
        }
        if let Some(presenter) = &self.presenter {
            if let Err(e) = presenter.stop_foreground(remove_notification).await {
                warn!(error = %e, "Failed to leave foreground");
            }
        }
        self.foreground = false;
    }

    /// Remove the notification and report `now` to the media session.
    pub async fn dismiss(&mut self, now: &NowPlaying) {
        self.demote(true).await;
        if let Some(presenter) = &self.presenter {
            if let Err(e) = presenter.cancel().await {
                warn!(error = %e, "Failed to cancel notification");
            }
        }
        if let Some(session) = &self.session {
            if let Err(e) = session.set_state(now.session_state()).await {
                warn!(error = %e, "Failed to update media session");
            }
        }
    }

    /// Tear down notification and session. Safe to call repeatedly.
    pub async fn release(&mut self) {
        if let Some(presenter) = &self.presenter {
            if self.foreground {
                if let Err(e) = presenter.stop_foreground(true).await {
                    warn!(error = %e, "Failed to leave foreground");
                }
            }
            if let Err(e) = presenter.cancel().await {
                warn!(error = %e, "Failed to cancel notification");
            }
        }
        self.foreground = false;

        if let Some(session) = &self.session {
            if self.session_active {
                if let Err(e) = session.set_active(false).await {
                    warn!(error = %e, "Failed to deactivate media session");
                }
            }
            if let Err(e) = session.release().await {
                warn!(error = %e, "Failed to release media session");
            }
        }
        self.session_active = false;
    }
}
