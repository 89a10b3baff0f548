//! Desktop surface launcher shim
//!
//! Desktop shells present audio and video in one window; a "launch" only
//! records the requested surface so the shell can swap its view on the next
//! poll.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    playback::MediaKind,
    surface::{PlaylistHandoff, SurfaceLauncher},
};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Surface launcher that records launches and logs transient messages.
#[derive(Default)]
pub struct LogSurfaceLauncher {
    last_launch: Mutex<Option<(MediaKind, PlaylistHandoff)>>,
}

impl LogSurfaceLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the most recent launch request, if any.
    pub fn take_launch(&self) -> Option<(MediaKind, PlaylistHandoff)> {
        self.last_launch.lock().take()
    }
}

#[async_trait]
impl SurfaceLauncher for LogSurfaceLauncher {
    async fn launch(&self, kind: MediaKind, handoff: PlaylistHandoff) -> Result<()> {
        info!(
            surface = %kind,
            start_index = handoff.start_index,
            entries = handoff.sources.len(),
            "Launching hosting surface"
        );
        *self.last_launch.lock() = Some((kind, handoff));
        Ok(())
    }

    async fn show_transient_message(&self, message: &str) -> Result<()> {
        warn!(message, "Transient message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_is_recorded_once() {
        let launcher = LogSurfaceLauncher::new();
        let handoff = PlaylistHandoff::new(vec!["a.mp3".into(), "b.mp4".into()]).starting_at(1);

        launcher.launch(MediaKind::Video, handoff.clone()).await.unwrap();

        let (kind, recorded) = launcher.take_launch().unwrap();
        assert_eq!(kind, MediaKind::Video);
        assert_eq!(recorded, handoff);
        assert!(launcher.take_launch().is_none());
    }
}
