//! Workspace umbrella crate.
//!
//! Re-exports the playback core so host applications can depend on
//! `media-core-workspace` and enable the documented features without wiring
//! each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service::*;
