//! # Playback Error Types
//!
//! Error types for source resolution, player control and surface handoff.

use bridge_traits::{error::BridgeError, MediaKind, PlayerFailure};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The entry's file does not exist.
    #[error("Source not found: {0}")]
    SourceMissing(String),

    /// A placeholder file whose text is not an `http(s)` URL.
    #[error("Placeholder {path} does not contain a stream URL")]
    MalformedPlaceholder { path: String },

    /// A placeholder file that could not be read.
    #[error("Placeholder {path} could not be read: {reason}")]
    UnreadablePlaceholder { path: String, reason: String },

    // ========================================================================
    // Player Errors
    // ========================================================================
    /// The native player reported a failure while preparing or playing.
    #[error("Player failed: {failure}")]
    PlayerFailed { failure: PlayerFailure },

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// Operation needs a live player and none exists.
    #[error("No active player")]
    NoActivePlayer,

    /// The playlist has no entries.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Index {index} out of range for playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Surface Errors
    // ========================================================================
    /// The host could not open the surface a switch asked for.
    #[error("Failed to launch {media_kind} surface: {message}")]
    SurfaceLaunchFailed {
        media_kind: MediaKind,
        message: String,
    },

    // ========================================================================
    // Service Errors
    // ========================================================================
    /// The playback service task is gone.
    #[error("Playback service stopped")]
    ServiceStopped,

    #[error("Invalid playback configuration: {0}")]
    Config(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the coordinator answers this error by skipping the
    /// entry instead of reporting it.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PlaybackError::SourceMissing(_)
                | PlaybackError::MalformedPlaceholder { .. }
                | PlaybackError::UnreadablePlaceholder { .. }
                | PlaybackError::PlayerFailed { .. }
                | PlaybackError::Bridge(_)
        )
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::PlayerFailed { failure } if failure.is_network())
    }

    /// Short classification used in logs and skip events.
    pub fn reason(&self) -> &'static str {
        match self {
            PlaybackError::SourceMissing(_) => "missing",
            PlaybackError::MalformedPlaceholder { .. } => "malformed_placeholder",
            PlaybackError::UnreadablePlaceholder { .. } => "unreadable_placeholder",
            PlaybackError::PlayerFailed { failure } => match failure {
                PlayerFailure::Server => "server",
                PlayerFailure::MalformedStream => "malformed_stream",
                PlayerFailure::Unsupported => "unsupported",
                PlayerFailure::TimedOut => "timed_out",
                PlayerFailure::Io => "io",
                PlayerFailure::Unknown { .. } => "unknown",
            },
            PlaybackError::Bridge(_) => "bridge",
            _ => "internal",
        }
    }
}

impl From<PlayerFailure> for PlaybackError {
    fn from(failure: PlayerFailure) -> Self {
        PlaybackError::PlayerFailed { failure }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_are_skippable() {
        assert!(PlaybackError::SourceMissing("a.mp3".into()).is_skippable());
        assert!(PlaybackError::MalformedPlaceholder { path: "a".into() }.is_skippable());
        assert!(PlaybackError::from(PlayerFailure::Unsupported).is_skippable());
        assert!(!PlaybackError::ServiceStopped.is_skippable());
        assert!(!PlaybackError::EmptyPlaylist.is_skippable());
    }

    #[test]
    fn test_network_classification() {
        assert!(PlaybackError::from(PlayerFailure::TimedOut).is_network_error());
        assert!(!PlaybackError::from(PlayerFailure::MalformedStream).is_network_error());
        assert_eq!(
            PlaybackError::from(PlayerFailure::MalformedStream).reason(),
            "malformed_stream"
        );
    }
}
