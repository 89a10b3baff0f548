//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the media playback core:
//! - Logging and tracing infrastructure
//! - Configuration management (host bridges, feature flags)
//! - Event bus mirroring playback and surface events
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback and service
//! crates depend on. It establishes the logging conventions, the fail-fast
//! capability checks and the event broadcasting used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
