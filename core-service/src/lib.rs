//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (native player,
//! filesystem, notification, media session, surface launcher) into the
//! playback core and owns the lifetime of the playback service task. Desktop
//! hosts typically enable the `desktop-shims` feature, which fills every
//! optional bridge from `bridge-desktop`.
//!
//! ```ignore
//! use core_service::{CoreService, PlaybackConfig};
//! use core_runtime::config::CoreConfig;
//!
//! let core = CoreConfig::builder()
//!     .player_factory(Arc::new(ExoPlayerFactory::new(ctx)))
//!     .build()?;
//! let service = CoreService::start(core, PlaybackConfig::default())?;
//! service.handle().init_playlist(handoff, SurfaceContext::Audio).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_playback::{
    EntryDetails, MirrorLink, PlaybackConfig, PlaybackHandle, PlaybackProgress, PlaybackStatus,
    ProgressTicker, SurfaceContext, SurfaceListener, SwitchRequest,
};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop;

use bridge_traits::SurfaceLauncher;
use core_playback::{
    entries_from_handoff, perform_switch, spawn_mirror_sync, MetadataCatalog,
    PlaybackCoordinator, PlaybackError, PlaybackService, VideoMirror,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, SurfaceEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: CoreConfig,
    playback_config: PlaybackConfig,
    event_bus: EventBus,
    handle: PlaybackHandle,
    task: JoinHandle<()>,
}

impl CoreService {
    /// Validate both configurations and spawn the playback service.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: CoreConfig, playback_config: PlaybackConfig) -> Result<Self> {
        config.validate()?;
        playback_config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let coordinator = PlaybackCoordinator::from_core_config(
            &config,
            playback_config.clone(),
            event_bus.clone(),
        );
        let (handle, task) =
            PlaybackService::spawn(coordinator, playback_config.command_queue_depth);

        info!(
            remote_metadata = config.features.enable_remote_metadata,
            video_mirror = config.features.enable_video_mirror,
            "Core service started"
        );

        Ok(Self {
            config,
            playback_config,
            event_bus,
            handle,
            task,
        })
    }

    /// Client of the playback service. Cheap to clone.
    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn playback_config(&self) -> &PlaybackConfig {
        &self.playback_config
    }

    /// Seek-bar updates at the configured progress interval.
    ///
    /// The returned ticker is idle until [`ProgressTicker::spawn`] is called.
    pub fn progress_ticker(&self) -> ProgressTicker {
        ProgressTicker::new(self.handle(), self.playback_config.progress_interval)
    }

    // ========================================================================
    // Surfaces
    // ========================================================================

    /// Open the surface a [`SwitchRequest`] asks for, handing it the playlist.
    ///
    /// A launch failure is shown to the user as a transient message and
    /// mirrored as [`SurfaceEvent::LaunchFailed`]; the engine stays idle at
    /// the requested index.
    pub async fn switch_surface(&self, request: SwitchRequest) -> Result<()> {
        let launcher = self.surface_launcher()?;
        let handoff = self.handle.handoff_for(Some(request.index)).await?;

        if let Err(e) = perform_switch(launcher.as_ref(), request, handoff).await {
            let _ = self
                .event_bus
                .emit(CoreEvent::Surface(SurfaceEvent::LaunchFailed {
                    media_kind: request.media_kind,
                    message: e.to_string(),
                }));
            return Err(e.into());
        }
        Ok(())
    }

    fn surface_launcher(&self) -> Result<Arc<dyn SurfaceLauncher>> {
        self.config
            .surface_launcher
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "SurfaceLauncher".to_string(),
                message: "Switching surfaces needs a SurfaceLauncher. \
                          Android: start the audio/video activity. \
                          Desktop: enable desktop-shims or inject a window launcher."
                    .to_string(),
            })
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Tag catalog over the host extractor. Remote probing follows the
    /// `enable_remote_metadata` flag.
    pub fn catalog(&self) -> Result<MetadataCatalog> {
        let extractor =
            self.config
                .metadata_extractor
                .clone()
                .ok_or_else(|| CoreError::CapabilityMissing {
                    capability: "MediaMetadataExtractor".to_string(),
                    message: "Describing entries needs a MediaMetadataExtractor. \
                              Desktop: enable desktop-shims for the lofty extractor."
                        .to_string(),
                })?;

        let catalog = MetadataCatalog::new(
            Arc::clone(&self.config.file_system),
            extractor,
            self.playback_config.placeholder_max_bytes,
        );
        match (&self.config.http_client, self.config.features.enable_remote_metadata) {
            (Some(http), true) => Ok(catalog.with_remote(Arc::clone(http))),
            _ => Ok(catalog),
        }
    }

    /// Describe every entry of the current playlist for a list display.
    pub async fn describe_playlist(&self) -> Result<Vec<EntryDetails>> {
        let catalog = self.catalog()?;
        let handoff = match self.handle.handoff_for(None).await {
            Ok(handoff) => handoff,
            Err(PlaybackError::EmptyPlaylist) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let seeded = entries_from_handoff(&handoff);
        Ok(catalog.describe(&seeded.entries).await)
    }

    // ========================================================================
    // Video mirror
    // ========================================================================

    /// Attach a muted visual player to the engine's active entry and keep it
    /// in sync until the link is cancelled or the entry changes.
    ///
    /// Callbacks whose token the returned link [owns](MirrorLink::owns) must
    /// be forwarded to it instead of the playback handle.
    pub async fn start_video_mirror(&self) -> Result<MirrorLink> {
        if !self.config.features.enable_video_mirror {
            return Err(CoreError::FeatureDisabled("video mirror"));
        }

        let (index, source) = self
            .handle
            .active_source()
            .await?
            .ok_or(PlaybackError::NoActivePlayer)?;

        let mut mirror = VideoMirror::new(
            Arc::clone(&self.config.player_factory),
            self.playback_config.mirror.clone(),
        );
        mirror.attach(index, source).await?;

        Ok(spawn_mirror_sync(mirror, self.handle())?)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Release the player, notification and session, then wait for the
    /// service task to exit.
    pub async fn shutdown(self) -> Result<()> {
        if let Err(e) = self.handle.shutdown().await {
            warn!(error = %e, "Playback service already stopped");
        }
        self.task.await.map_err(|e| {
            core_runtime::Error::Internal(format!("playback service task failed: {e}"))
        })?;
        info!("Core service stopped");
        Ok(())
    }
}
