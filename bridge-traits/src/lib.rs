//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host
//! application (Android service, iOS app, desktop shell). Each trait represents a
//! capability the core requires but that is implemented differently per
//! platform: the native media player, the system notification, the media
//! session exposed to hardware controls, and the ability to open a hosting
//! surface.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaPlayerFactory`](playback::MediaPlayerFactory) - Creates low-level player handles
//! - [`MediaPlayer`](playback::MediaPlayer) - One native player instance (prepare/start/pause/seek/release)
//! - [`MediaMetadataExtractor`](metadata::MediaMetadataExtractor) - Tag/duration extraction from raw bytes
//!
//! ### System Integration
//! - [`NotificationPresenter`](notification::NotificationPresenter) - Persistent transport notification + foreground state
//! - [`MediaSessionBridge`](notification::MediaSessionBridge) - Lock screen / Bluetooth / hardware key session
//! - [`SurfaceLauncher`](surface::SurfaceLauncher) - Opens the audio or video hosting surface
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File reads for local media and URL placeholders
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | Android  | TBD                 | 📋 Planned |
//! | iOS      | TBD                 | 📋 Planned |
//!
//! `bridge-desktop` ships every capability except the media player itself;
//! hosts always inject a [`MediaPlayerFactory`](playback::MediaPlayerFactory).
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert native errors to `BridgeError` and keep the
//! message actionable (file path, URL host, native error code).
//!
//! ## Thread Safety
//!
//! Factories, presenters and launchers are shared across tasks and require
//! `Send + Sync`. A [`MediaPlayer`](playback::MediaPlayer) handle is owned by
//! exactly one engine and only requires `Send`.

pub mod error;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod notification;
pub mod playback;
pub mod storage;
pub mod surface;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use metadata::{MediaMetadataExtractor, MediaTags};
pub use notification::{
    MediaCommand, MediaSessionBridge, NotificationPresenter, NowPlayingNotification,
    SessionPlaybackStatus, SessionState,
};
pub use playback::{
    AudioProfile, MediaKind, MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerFailure,
    PlayerRequest, PlayerSource, PlayerToken,
};
pub use storage::{FileMetadata, FileSystemAccess};
pub use surface::{PlaylistHandoff, SurfaceLauncher};
