//! # Playback Coordination Module
//!
//! Drives a host media player through a mixed audio/video playlist.
//!
//! ## Overview
//!
//! This module handles:
//! - Source resolution for local files, URL placeholders and direct streams
//! - A single-player engine with sync (local) and async (remote) preparation
//! - The playlist state machine and its audio/video surface-switch protocol
//! - Notification and media session synchronisation
//! - A muted visual mirror that follows the engine for video entries
//! - The service task, progress ticker and metadata catalog around them
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackConfig, PlaybackCoordinator, PlaybackService, SurfaceContext};
//!
//! let coordinator = PlaybackCoordinator::from_core_config(&core, PlaybackConfig::default(), bus);
//! let (handle, _task) = PlaybackService::spawn(coordinator, 64);
//! handle.add_listener(audio_surface.clone());
//! handle.init_playlist(handoff, SurfaceContext::Audio).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod mirror;
pub mod playlist;
pub mod progress;
pub mod resolver;
pub mod service;
pub mod session;
pub mod surface;
pub mod types;

pub use catalog::{EntryDetails, MetadataCatalog};
pub use config::{MirrorConfig, PlaybackConfig};
pub use coordinator::PlaybackCoordinator;
pub use engine::{PlaybackEngine, PlayerState, StartOutcome};
pub use error::{PlaybackError, Result};
pub use mirror::{
    run_mirror_sync, spawn_mirror_sync, MirrorCorrection, MirrorLink, VideoMirror,
};
pub use playlist::{Dispatch, Playlist};
pub use progress::ProgressTicker;
pub use resolver::SourceResolver;
pub use service::{PlaybackHandle, PlaybackService};
pub use session::{NowPlaying, SessionBridge};
pub use surface::{perform_switch, ListenerSet, SurfaceListener, SwitchRequest};
pub use types::{
    entries_from_handoff, Direction, PlaybackProgress, PlaybackStatus, PlaylistEntry,
    SurfaceContext,
};
