//! # Progress Ticker
//!
//! Advisory, read-only position updates for seek bars. The ticker polls the
//! service on a fixed interval and publishes on a `watch` channel. Polling is
//! suspended while the user drags a seek control so the displayed position
//! never fights the pending seek.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::service::PlaybackHandle;
use crate::types::PlaybackProgress;

/// Periodic position publisher bound to one surface.
pub struct ProgressTicker {
    handle: PlaybackHandle,
    interval: Duration,
    cancel: CancellationToken,
    scrubbing: Arc<AtomicBool>,
    sender: Arc<watch::Sender<PlaybackProgress>>,
}

impl ProgressTicker {
    pub fn new(handle: PlaybackHandle, interval: Duration) -> Self {
        let (sender, _) = watch::channel(PlaybackProgress::default());
        Self {
            handle,
            interval,
            cancel: CancellationToken::new(),
            scrubbing: Arc::new(AtomicBool::new(false)),
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackProgress> {
        self.sender.subscribe()
    }

    /// Token that stops the ticker when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start polling. The task ends when cancelled or the service stops.
    pub fn spawn(&self) -> JoinHandle<()> {
        let handle = self.handle.clone();
        let cancel = self.cancel.clone();
        let scrubbing = Arc::clone(&self.scrubbing);
        let sender = Arc::clone(&self.sender);
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if scrubbing.load(Ordering::Acquire) {
                            continue;
                        }
                        match handle.progress().await {
                            Ok(progress) => {
                                sender.send_replace(progress);
                            }
                            Err(_) => {
                                debug!("Playback service gone, stopping progress ticker");
                                break;
                            }
                        }
                    }
                }
            }
        })
    }

    /// Suspend updates while the user drags the seek control.
    pub fn begin_scrub(&self) {
        self.scrubbing.store(true, Ordering::Release);
    }

    /// Seek to where the drag ended, then resume updates.
    pub async fn end_scrub(&self, position: Duration) -> Result<()> {
        let result = self.handle.seek_to(position).await;
        self.scrubbing.store(false, Ordering::Release);
        result
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
