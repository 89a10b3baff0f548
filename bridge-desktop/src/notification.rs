//! Desktop notification and media session shims
//!
//! Desktop shells have no foreground-service concept. These adapters keep the
//! last rendered state in memory (so a tray or MPRIS frontend can poll it) and
//! trace every update.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::{
        MediaSessionBridge, NotificationPresenter, NowPlayingNotification, SessionState,
    },
};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Default)]
struct PresenterState {
    current: Option<NowPlayingNotification>,
    foreground: bool,
}

/// Notification presenter that records and logs the transport notification.
#[derive(Default)]
pub struct LogNotificationPresenter {
    state: Mutex<PresenterState>,
}

impl LogNotificationPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last notification shown, if not cancelled.
    pub fn current(&self) -> Option<NowPlayingNotification> {
        self.state.lock().current.clone()
    }

    pub fn is_foreground(&self) -> bool {
        self.state.lock().foreground
    }
}

#[async_trait]
impl NotificationPresenter for LogNotificationPresenter {
    async fn show(&self, notification: NowPlayingNotification) -> Result<()> {
        debug!(
            title = %notification.title,
            playing = notification.is_playing,
            repeat = notification.is_repeat,
            reopen = %notification.reopen_surface,
            "Notification updated"
        );
        self.state.lock().current = Some(notification);
        Ok(())
    }

    async fn start_foreground(&self, notification: NowPlayingNotification) -> Result<()> {
        info!(title = %notification.title, "Entering foreground playback");
        let mut state = self.state.lock();
        state.current = Some(notification);
        state.foreground = true;
        Ok(())
    }

    async fn stop_foreground(&self, remove_notification: bool) -> Result<()> {
        info!(remove_notification, "Leaving foreground playback");
        let mut state = self.state.lock();
        state.foreground = false;
        if remove_notification {
            state.current = None;
        }
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        debug!("Notification cancelled");
        let mut state = self.state.lock();
        state.current = None;
        state.foreground = false;
        Ok(())
    }
}

/// Media session that records the last pushed state.
#[derive(Default)]
pub struct LogMediaSession {
    state: Mutex<Option<SessionState>>,
    active: Mutex<bool>,
}

impl LogMediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionState> {
        self.state.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock()
    }
}

#[async_trait]
impl MediaSessionBridge for LogMediaSession {
    async fn set_state(&self, state: SessionState) -> Result<()> {
        debug!(
            status = ?state.status,
            position_ms = state.position.as_millis() as u64,
            duration_ms = state.duration.map(|d| d.as_millis() as u64),
            "Media session state"
        );
        *self.state.lock() = Some(state);
        Ok(())
    }

    async fn set_active(&self, active: bool) -> Result<()> {
        debug!(active, "Media session activity changed");
        *self.active.lock() = active;
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        info!("Media session released");
        *self.state.lock() = None;
        *self.active.lock() = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{MediaCommand, MediaKind, SessionPlaybackStatus};

    fn notification(playing: bool) -> NowPlayingNotification {
        NowPlayingNotification {
            title: "Song".into(),
            artist: None,
            is_playing: playing,
            is_repeat: false,
            actions: MediaCommand::NOTIFICATION_ACTIONS.to_vec(),
            reopen_surface: MediaKind::Audio,
        }
    }

    #[tokio::test]
    async fn test_presenter_tracks_foreground() {
        let presenter = LogNotificationPresenter::new();
        presenter.start_foreground(notification(true)).await.unwrap();
        assert!(presenter.is_foreground());

        presenter.show(notification(false)).await.unwrap();
        assert!(!presenter.current().unwrap().is_playing);

        presenter.stop_foreground(false).await.unwrap();
        assert!(!presenter.is_foreground());
        assert!(presenter.current().is_some());

        presenter.cancel().await.unwrap();
        assert!(presenter.current().is_none());
    }

    #[tokio::test]
    async fn test_session_release_clears_state() {
        let session = LogMediaSession::new();
        session.set_active(true).await.unwrap();
        session
            .set_state(SessionState {
                status: SessionPlaybackStatus::Playing,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(session.is_active());

        session.release().await.unwrap();
        assert!(!session.is_active());
        assert!(session.current().is_none());
    }
}
