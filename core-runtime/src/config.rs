//! # Core Configuration Module
//!
//! Provides configuration management for the Media Playback Core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host bridges and settings the playback service
//! needs. It enforces fail-fast validation so a missing capability is reported
//! at startup instead of when the first track is dispatched.
//!
//! ## Required Dependencies
//!
//! - `MediaPlayerFactory` - Native player construction (never defaulted)
//! - `FileSystemAccess` - Local media and placeholder reads (desktop default: tokio fs)
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `NotificationPresenter` - Transport notification (desktop default: traced shim)
//! - `MediaSessionBridge` - Hardware/lock-screen controls (desktop default: traced shim)
//! - `SurfaceLauncher` - Opens audio/video surfaces (desktop default: single-window shim)
//! - `HttpClient` - Remote metadata heads (desktop default: reqwest)
//! - `MediaMetadataExtractor` - Tag extraction (desktop default: lofty)
//!
//! When the `desktop-shims` feature is enabled, the desktop adapters are
//! injected for any of the above that were not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .player_factory(Arc::new(ExoPlayerFactory::new(ctx)))
//!     .file_system(Arc::new(AndroidFileSystem::new(ctx)))
//!     .notification_presenter(Arc::new(ForegroundNotifier::new(ctx)))
//!     .media_session(Arc::new(MediaSessionCompatBridge::new(ctx)))
//!     .surface_launcher(Arc::new(ActivityLauncher::new(ctx)))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Missing bridges surface as [`Error::CapabilityMissing`] with a message
//! naming the platform implementation to inject.

use crate::error::{Error, Result};
use bridge_traits::{
    FileSystemAccess, HttpClient, MediaMetadataExtractor, MediaPlayerFactory, MediaSessionBridge,
    NotificationPresenter, SurfaceLauncher,
};
use std::sync::Arc;

/// Default capacity of the runtime event bus.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Core configuration for the Media Playback Core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Native player factory (required)
    pub player_factory: Arc<dyn MediaPlayerFactory>,

    /// File system access for local media and URL placeholders (required)
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Transport notification presenter
    pub notification_presenter: Option<Arc<dyn NotificationPresenter>>,

    /// OS media session
    pub media_session: Option<Arc<dyn MediaSessionBridge>>,

    /// Hosting surface launcher
    pub surface_launcher: Option<Arc<dyn SurfaceLauncher>>,

    /// HTTP client used for remote metadata
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Media tag extractor
    pub metadata_extractor: Option<Arc<dyn MediaMetadataExtractor>>,

    /// Capacity of the broadcast event bus
    pub event_buffer_size: usize,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("player_factory", &"MediaPlayerFactory { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field(
                "notification_presenter",
                &self
                    .notification_presenter
                    .as_ref()
                    .map(|_| "NotificationPresenter { ... }"),
            )
            .field(
                "media_session",
                &self
                    .media_session
                    .as_ref()
                    .map(|_| "MediaSessionBridge { ... }"),
            )
            .field(
                "surface_launcher",
                &self
                    .surface_launcher
                    .as_ref()
                    .map(|_| "SurfaceLauncher { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "metadata_extractor",
                &self
                    .metadata_extractor
                    .as_ref()
                    .map(|_| "MediaMetadataExtractor { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Fetch leading bytes of remote streams to read their tags
    /// (requires HttpClient and MediaMetadataExtractor)
    pub enable_remote_metadata: bool,

    /// Drive a muted visual player alongside engine audio for video entries
    pub enable_video_mirror: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Event buffer size is reasonable (> 0 and <= 65,536)
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > 65_536 {
            return Err(Error::Config(
                "Event buffer size exceeds maximum of 65,536".to_string(),
            ));
        }

        if self.features.enable_remote_metadata {
            if self.http_client.is_none() {
                return Err(Error::Config(
                    "Remote metadata enabled but no HttpClient provided. \
                     Disable the feature or inject an HttpClient implementation."
                        .to_string(),
                ));
            }
            if self.metadata_extractor.is_none() {
                return Err(Error::Config(
                    "Remote metadata enabled but no MediaMetadataExtractor provided. \
                     Disable the feature or inject a MediaMetadataExtractor implementation."
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn player_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaPlayerFactory".to_string(),
        message: "A MediaPlayerFactory is required to construct native players. \
                 Android: wrap MediaPlayer/ExoPlayer. iOS: wrap AVPlayer. \
                 Desktop: wrap the shell's audio/video backend."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        LoftyMetadataExtractor, LogMediaSession, LogNotificationPresenter, LogSurfaceLauncher,
        ReqwestHttpClient, TokioFileSystem,
    };

    pub fn file_system() -> Result<Arc<dyn FileSystemAccess>> {
        Ok(Arc::new(TokioFileSystem::new()))
    }

    pub fn notification_presenter() -> Option<Arc<dyn NotificationPresenter>> {
        Some(Arc::new(LogNotificationPresenter::new()))
    }

    pub fn media_session() -> Option<Arc<dyn MediaSessionBridge>> {
        Some(Arc::new(LogMediaSession::new()))
    }

    pub fn surface_launcher() -> Option<Arc<dyn SurfaceLauncher>> {
        Some(Arc::new(LogSurfaceLauncher::new()))
    }

    pub fn http_client() -> Option<Arc<dyn HttpClient>> {
        Some(Arc::new(ReqwestHttpClient::new()))
    }

    pub fn metadata_extractor() -> Option<Arc<dyn MediaMetadataExtractor>> {
        Some(Arc::new(LoftyMetadataExtractor::new()))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub fn file_system() -> Result<Arc<dyn FileSystemAccess>> {
        Err(Error::CapabilityMissing {
            capability: "FileSystemAccess".to_string(),
            message: "FileSystemAccess implementation is required to read media and URL \
                     placeholder files. Desktop: enable the 'desktop-shims' feature to use \
                     TokioFileSystem. Mobile: inject app-storage/content-resolver access."
                .to_string(),
        })
    }

    pub fn notification_presenter() -> Option<Arc<dyn NotificationPresenter>> {
        None
    }

    pub fn media_session() -> Option<Arc<dyn MediaSessionBridge>> {
        None
    }

    pub fn surface_launcher() -> Option<Arc<dyn SurfaceLauncher>> {
        None
    }

    pub fn http_client() -> Option<Arc<dyn HttpClient>> {
        None
    }

    pub fn metadata_extractor() -> Option<Arc<dyn MediaMetadataExtractor>> {
        None
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    player_factory: Option<Arc<dyn MediaPlayerFactory>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    notification_presenter: Option<Arc<dyn NotificationPresenter>>,
    media_session: Option<Arc<dyn MediaSessionBridge>>,
    surface_launcher: Option<Arc<dyn SurfaceLauncher>>,
    http_client: Option<Arc<dyn HttpClient>>,
    metadata_extractor: Option<Arc<dyn MediaMetadataExtractor>>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the native player factory (required).
    pub fn player_factory(mut self, factory: Arc<dyn MediaPlayerFactory>) -> Self {
        self.player_factory = Some(factory);
        self
    }

    /// Sets the file system access implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn notification_presenter(mut self, presenter: Arc<dyn NotificationPresenter>) -> Self {
        self.notification_presenter = Some(presenter);
        self
    }

    pub fn media_session(mut self, session: Arc<dyn MediaSessionBridge>) -> Self {
        self.media_session = Some(session);
        self
    }

    pub fn surface_launcher(mut self, launcher: Arc<dyn SurfaceLauncher>) -> Self {
        self.surface_launcher = Some(launcher);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn metadata_extractor(mut self, extractor: Arc<dyn MediaMetadataExtractor>) -> Self {
        self.metadata_extractor = Some(extractor);
        self
    }

    /// Sets the event bus capacity (default: 256).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn enable_remote_metadata(mut self, enabled: bool) -> Self {
        self.features.enable_remote_metadata = enabled;
        self
    }

    pub fn enable_video_mirror(mut self, enabled: bool) -> Self {
        self.features.enable_video_mirror = enabled;
        self
    }

    /// Replaces all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (MediaPlayerFactory, FileSystemAccess)
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let player_factory = self
            .player_factory
            .ok_or_else(player_factory_missing_error)?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => defaults::file_system()?,
        };

        let config = CoreConfig {
            player_factory,
            file_system,
            notification_presenter: self
                .notification_presenter
                .or_else(defaults::notification_presenter),
            media_session: self.media_session.or_else(defaults::media_session),
            surface_launcher: self.surface_launcher.or_else(defaults::surface_launcher),
            http_client: self.http_client.or_else(defaults::http_client),
            metadata_extractor: self
                .metadata_extractor
                .or_else(defaults::metadata_extractor),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        storage::FileMetadata, BridgeError, MediaPlayer, PlayerRequest,
    };
    use bytes::Bytes;
    use std::path::Path;

    struct NoPlayers;

    #[async_trait]
    impl MediaPlayerFactory for NoPlayers {
        async fn create(
            &self,
            _request: PlayerRequest,
        ) -> std::result::Result<Box<dyn MediaPlayer>, BridgeError> {
            Err(BridgeError::NotAvailable("no players in tests".to_string()))
        }
    }

    struct EmptyFs;

    #[async_trait]
    impl FileSystemAccess for EmptyFs {
        async fn exists(&self, _path: &Path) -> std::result::Result<bool, BridgeError> {
            Ok(false)
        }

        async fn metadata(&self, path: &Path) -> std::result::Result<FileMetadata, BridgeError> {
            Err(BridgeError::NotFound(path.display().to_string()))
        }

        async fn read_file(&self, path: &Path) -> std::result::Result<Bytes, BridgeError> {
            Err(BridgeError::NotFound(path.display().to_string()))
        }
    }

    fn base() -> CoreConfigBuilder {
        CoreConfig::builder()
            .player_factory(Arc::new(NoPlayers))
            .file_system(Arc::new(EmptyFs))
    }

    #[test]
    fn test_builder_requires_player_factory() {
        let result = CoreConfig::builder().file_system(Arc::new(EmptyFs)).build();

        match result {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "MediaPlayerFactory");
                assert!(message.contains("AVPlayer"));
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_file_system_without_shims() {
        let result = CoreConfig::builder()
            .player_factory(Arc::new(NoPlayers))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "FileSystemAccess"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_shims_fill_optional_bridges() {
        let config = CoreConfig::builder()
            .player_factory(Arc::new(NoPlayers))
            .build()
            .unwrap();

        assert!(config.notification_presenter.is_some());
        assert!(config.media_session.is_some());
        assert!(config.surface_launcher.is_some());
        assert!(config.metadata_extractor.is_some());
    }

    #[test]
    fn test_default_event_buffer_size() {
        let config = base().build().unwrap();
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_validate_rejects_zero_event_buffer() {
        let result = base().event_buffer_size(0).build();
        assert!(result.unwrap_err().to_string().contains("greater than 0"));
    }

    #[test]
    fn test_feature_flags_default() {
        let flags = FeatureFlags::default();
        assert!(!flags.enable_remote_metadata);
        assert!(!flags.enable_video_mirror);
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_remote_metadata_requires_http_client() {
        let result = base().enable_remote_metadata(true).build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Remote metadata enabled"));
        assert!(err_msg.contains("HttpClient"));
    }

    #[test]
    fn test_builder_with_feature_flags() {
        let config = base().enable_video_mirror(true).build().unwrap();
        assert!(config.features.enable_video_mirror);
        assert!(!config.features.enable_remote_metadata);
    }

    #[test]
    fn test_config_is_cloneable_and_debuggable() {
        let config = base().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.event_buffer_size, config.event_buffer_size);
        assert!(format!("{:?}", config).contains("MediaPlayerFactory { ... }"));
    }
}
