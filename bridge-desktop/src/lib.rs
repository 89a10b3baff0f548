//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides implementations of every bridge capability except the
//! native media player, which the host always supplies:
//! - `FileSystemAccess` using `tokio::fs`, rooted at the user's music directory
//! - `HttpClient` using `reqwest`
//! - `MediaMetadataExtractor` using `lofty`
//! - `NotificationPresenter` / `MediaSessionBridge` as in-memory, traced shims
//! - `SurfaceLauncher` recording the requested surface for a single-window shell
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoftyMetadataExtractor, TokioFileSystem};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .player_factory(Arc::new(MyPlayerFactory::new()))
//!     .file_system(Arc::new(TokioFileSystem::new()))
//!     .metadata_extractor(Arc::new(LoftyMetadataExtractor::new()))
//!     .build()?;
//! ```

mod filesystem;
mod http;
mod metadata;
mod notification;
mod surface;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use metadata::LoftyMetadataExtractor;
pub use notification::{LogMediaSession, LogNotificationPresenter};
pub use surface::LogSurfaceLauncher;
