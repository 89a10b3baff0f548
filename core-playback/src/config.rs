//! # Playback Configuration
//!
//! Tunables for the playback coordinator, progress ticker and video mirror.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Playback service configuration.
///
/// Every field has a serde default so hosts can ship partial JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Files smaller than this are read as URL placeholders.
    ///
    /// Default: 1000 bytes.
    #[serde(default = "default_placeholder_max_bytes")]
    pub placeholder_max_bytes: u64,

    /// Step used by fast-forward and fast-rewind.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_seek_step")]
    pub seek_step: Duration,

    /// Interval of the advisory position ticker.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Consecutive failed starts tolerated before playback gives up.
    ///
    /// `None` means one full pass over the playlist.
    #[serde(default)]
    pub max_consecutive_skips: Option<usize>,

    /// Capacity of the service command queue.
    ///
    /// Default: 64.
    #[serde(default = "default_command_queue_depth")]
    pub command_queue_depth: usize,

    #[serde(default)]
    pub mirror: MirrorConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            placeholder_max_bytes: default_placeholder_max_bytes(),
            seek_step: default_seek_step(),
            progress_interval: default_progress_interval(),
            max_consecutive_skips: None,
            command_queue_depth: default_command_queue_depth(),
            mirror: MirrorConfig::default(),
        }
    }
}

impl PlaybackConfig {
    /// Configuration for surfaces that redraw often.
    ///
    /// - Faster position ticks (200 ms)
    /// - Tighter mirror drift tolerance
    pub fn low_latency_ui() -> Self {
        Self {
            progress_interval: Duration::from_millis(200),
            mirror: MirrorConfig {
                drift_tolerance: Duration::from_millis(120),
                correction_interval: Duration::from_millis(500),
                ..MirrorConfig::default()
            },
            ..Default::default()
        }
    }

    /// Skip budget for a playlist of `len` entries.
    pub fn skip_limit(&self, len: usize) -> usize {
        self.max_consecutive_skips.unwrap_or(len).max(1)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.placeholder_max_bytes == 0 {
            return Err(PlaybackError::Config(
                "placeholder_max_bytes must be > 0".to_string(),
            ));
        }

        if self.seek_step.is_zero() {
            return Err(PlaybackError::Config("seek_step must be > 0".to_string()));
        }

        if self.progress_interval.is_zero() {
            return Err(PlaybackError::Config(
                "progress_interval must be > 0".to_string(),
            ));
        }

        if self.max_consecutive_skips == Some(0) {
            return Err(PlaybackError::Config(
                "max_consecutive_skips must be > 0".to_string(),
            ));
        }

        if self.command_queue_depth == 0 {
            return Err(PlaybackError::Config(
                "command_queue_depth must be > 0".to_string(),
            ));
        }

        self.mirror.validate()
    }
}

/// Visual mirror tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Position difference tolerated before the visual player is re-seeked.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_drift_tolerance")]
    pub drift_tolerance: Duration,

    /// How often the mirror compares itself with the engine.
    ///
    /// Default: 1 second.
    #[serde(default = "default_correction_interval")]
    pub correction_interval: Duration,

    /// Volume of the visual player; the engine owns the audible output.
    ///
    /// Default: 0.0 (muted).
    #[serde(default)]
    pub volume: f32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            drift_tolerance: default_drift_tolerance(),
            correction_interval: default_correction_interval(),
            volume: 0.0,
        }
    }
}

impl MirrorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.correction_interval.is_zero() {
            return Err(PlaybackError::Config(
                "mirror.correction_interval must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::Config(
                "mirror.volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_placeholder_max_bytes() -> u64 {
    1000
}

fn default_seek_step() -> Duration {
    Duration::from_secs(10)
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_command_queue_depth() -> usize {
    64
}

fn default_drift_tolerance() -> Duration {
    Duration::from_millis(250)
}

fn default_correction_interval() -> Duration {
    Duration::from_secs(1)
}
