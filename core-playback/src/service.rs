//! # Playback Service
//!
//! Runs a [`PlaybackCoordinator`] on one tokio task fed by a bounded command
//! queue. Surface calls, notification intents and native player callbacks
//! all go through the same queue, so they are applied strictly in order.
//!
//! [`PlaybackHandle`] is the cloneable client. Dropping every handle, or
//! calling [`PlaybackHandle::shutdown`], releases the player, notification
//! and media session before the task exits.
//!
//! ```ignore
//! let (handle, task) = PlaybackService::spawn(coordinator, config.command_queue_depth);
//! handle.add_listener(surface.clone());
//! handle.init_playlist(handoff, SurfaceContext::Audio).await?;
//! handle.next().await?;
//! ```

use bridge_traits::{MediaCommand, PlayerEvent, PlayerSource, PlayerToken, PlaylistHandoff};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::PlaybackCoordinator;
use crate::error::{PlaybackError, Result};
use crate::surface::{ListenerSet, SurfaceListener};
use crate::types::{PlaybackProgress, PlaybackStatus, SurfaceContext};

enum Command {
    Init {
        handoff: PlaylistHandoff,
        context: SurfaceContext,
        autoplay: bool,
        reply: oneshot::Sender<()>,
    },
    SetContext {
        context: SurfaceContext,
        reply: oneshot::Sender<()>,
    },
    Media {
        command: MediaCommand,
        reply: Option<oneshot::Sender<()>>,
    },
    Player {
        token: PlayerToken,
        event: PlayerEvent,
    },
    Status {
        reply: oneshot::Sender<PlaybackStatus>,
    },
    Progress {
        reply: oneshot::Sender<PlaybackProgress>,
    },
    ActiveSource {
        reply: oneshot::Sender<Option<(usize, PlayerSource)>>,
    },
    Handoff {
        index: Option<usize>,
        reply: oneshot::Sender<Result<PlaylistHandoff>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The single task owning the coordinator.
pub struct PlaybackService {
    coordinator: PlaybackCoordinator,
    receiver: mpsc::Receiver<Command>,
}

impl PlaybackService {
    /// Spawn the service loop on the current tokio runtime.
    pub fn spawn(
        coordinator: PlaybackCoordinator,
        queue_depth: usize,
    ) -> (PlaybackHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let listeners = coordinator.listeners().clone();
        let service = Self {
            coordinator,
            receiver,
        };
        let task = tokio::spawn(service.run());
        (PlaybackHandle { sender, listeners }, task)
    }

    async fn run(mut self) {
        info!("Playback service started");
        while let Some(command) = self.receiver.recv().await {
            if !self.apply(command).await {
                info!("Playback service stopped");
                return;
            }
        }

        debug!("All playback handles dropped");
        self.coordinator.shutdown().await;
    }

    /// Apply one command. Returns `false` once the service must exit.
    async fn apply(&mut self, command: Command) -> bool {
        let coordinator = &mut self.coordinator;
        match command {
            Command::Init {
                handoff,
                context,
                autoplay,
                reply,
            } => {
                if autoplay {
                    coordinator.init_playlist(&handoff, context).await;
                } else {
                    coordinator
                        .init_playlist_without_autoplay(&handoff, context)
                        .await;
                }
                let _ = reply.send(());
            }
            Command::SetContext { context, reply } => {
                coordinator.set_surface_context(context).await;
                let _ = reply.send(());
            }
            Command::Media { command, reply } => {
                coordinator.handle_command(command).await;
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            Command::Player { token, event } => {
                coordinator.on_player_event(token, event).await;
            }
            Command::Status { reply } => {
                let _ = reply.send(coordinator.status());
            }
            Command::Progress { reply } => {
                let _ = reply.send(coordinator.progress());
            }
            Command::ActiveSource { reply } => {
                let _ = reply.send(coordinator.active_source());
            }
            Command::Handoff { index, reply } => {
                let _ = reply.send(coordinator.handoff_for(index));
            }
            Command::Shutdown { reply } => {
                coordinator.shutdown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Cloneable client of the playback service.
#[derive(Clone)]
pub struct PlaybackHandle {
    sender: mpsc::Sender<Command>,
    listeners: ListenerSet,
}

impl PlaybackHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| PlaybackError::ServiceStopped)?;
        response.await.map_err(|_| PlaybackError::ServiceStopped)
    }

    // ========================================================================
    // Surfaces
    // ========================================================================

    /// Register a hosting surface. Takes effect immediately.
    pub fn add_listener(&self, listener: Arc<dyn SurfaceListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Unregister a hosting surface; playback continues in the background.
    pub fn remove_listener(&self, listener: &Arc<dyn SurfaceListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub async fn init_playlist(
        &self,
        handoff: PlaylistHandoff,
        context: SurfaceContext,
    ) -> Result<()> {
        self.request(|reply| Command::Init {
            handoff,
            context,
            autoplay: true,
            reply,
        })
        .await
    }

    pub async fn init_playlist_without_autoplay(
        &self,
        handoff: PlaylistHandoff,
        context: SurfaceContext,
    ) -> Result<()> {
        self.request(|reply| Command::Init {
            handoff,
            context,
            autoplay: false,
            reply,
        })
        .await
    }

    pub async fn set_surface_context(&self, context: SurfaceContext) -> Result<()> {
        self.request(|reply| Command::SetContext { context, reply })
            .await
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Apply `command` and wait until it has been handled.
    pub async fn command(&self, command: MediaCommand) -> Result<()> {
        self.request(|reply| Command::Media {
            command,
            reply: Some(reply),
        })
        .await
    }

    /// Queue `command` without waiting, for synchronous host callbacks.
    pub fn try_command(&self, command: MediaCommand) -> Result<()> {
        self.try_send(Command::Media {
            command,
            reply: None,
        })
    }

    /// Apply a notification intent action string such as `media.next`.
    pub fn dispatch_action(&self, action: &str) -> Result<()> {
        match MediaCommand::from_action(action) {
            Some(command) => self.try_command(command),
            None => {
                warn!(action, "Ignoring unknown media action");
                Ok(())
            }
        }
    }

    pub async fn play(&self) -> Result<()> {
        self.command(MediaCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.command(MediaCommand::Pause).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.command(MediaCommand::PlayPause).await
    }

    pub async fn next(&self) -> Result<()> {
        self.command(MediaCommand::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.command(MediaCommand::Previous).await
    }

    pub async fn fast_forward(&self) -> Result<()> {
        self.command(MediaCommand::FastForward).await
    }

    pub async fn fast_rewind(&self) -> Result<()> {
        self.command(MediaCommand::FastRewind).await
    }

    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        self.command(MediaCommand::SeekTo(position)).await
    }

    pub async fn toggle_repeat(&self) -> Result<()> {
        self.command(MediaCommand::ToggleRepeat).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.command(MediaCommand::Stop).await
    }

    // ========================================================================
    // Player callbacks
    // ========================================================================

    /// Deliver a native player callback.
    pub async fn player_event(&self, token: PlayerToken, event: PlayerEvent) -> Result<()> {
        self.sender
            .send(Command::Player { token, event })
            .await
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    /// Deliver a native player callback without waiting for queue space.
    pub fn try_player_event(&self, token: PlayerToken, event: PlayerEvent) -> Result<()> {
        self.try_send(Command::Player { token, event })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fresh state for a (re)attaching surface.
    pub async fn status(&self) -> Result<PlaybackStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub async fn progress(&self) -> Result<PlaybackProgress> {
        self.request(|reply| Command::Progress { reply }).await
    }

    /// Index and resolved source of the live player.
    pub async fn active_source(&self) -> Result<Option<(usize, PlayerSource)>> {
        self.request(|reply| Command::ActiveSource { reply }).await
    }

    /// Playlist payload for switching at `index` (default: current index).
    pub async fn handoff_for(&self, index: Option<usize>) -> Result<PlaylistHandoff> {
        self.request(|reply| Command::Handoff { index, reply })
            .await?
    }

    /// Stop the service, releasing every host resource.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn try_send(&self, command: Command) -> Result<()> {
        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => PlaybackError::ServiceStopped,
            mpsc::error::TrySendError::Full(_) => {
                PlaybackError::Internal("playback command queue is full".to_string())
            }
        })
    }
}
