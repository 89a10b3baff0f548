//! # Playback Coordinator
//!
//! Owns the playlist state, the engine, the listener set and the host
//! notification/session bridge, and keeps them consistent.
//!
//! ## Dispatch
//!
//! Every index change (initialisation, next/previous, completion, skip)
//! reduces to the same step: release the current player, announce the new
//! position, then compare the entry's media kind with the hosting surface
//! context. A match starts a player; a mismatch emits one switch request and
//! leaves the engine idle until a surface of the right kind claims the index.
//!
//! ## Failure policy
//!
//! Resolution and player failures are never reported to the host. The entry
//! is skipped in the direction of the last navigation (forward once an entry
//! has started) and the neighbour dispatched, until the number of consecutive
//! failures reaches the skip limit and the coordinator gives up with a
//! terminal "nothing playable" state.
//!
//! All methods take `&mut self`; the coordinator lives on the single
//! [`PlaybackService`](crate::service::PlaybackService) task.

use bridge_traits::{
    FileSystemAccess, MediaCommand, MediaPlayerFactory, PlayerEvent, PlayerSource, PlayerToken,
    PlaylistHandoff,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, SurfaceEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PlaybackConfig;
use crate::engine::{PlaybackEngine, StartOutcome};
use crate::error::{PlaybackError, Result};
use crate::playlist::{Dispatch, Playlist};
use crate::resolver::SourceResolver;
use crate::session::{NowPlaying, SessionBridge};
use crate::surface::{ListenerSet, SwitchRequest};
use crate::types::{
    entries_from_handoff, Direction, PlaybackProgress, PlaybackStatus, PlaylistEntry,
    SurfaceContext,
};

/// Single owner of all playback state.
pub struct PlaybackCoordinator {
    config: PlaybackConfig,
    resolver: SourceResolver,
    engine: PlaybackEngine,
    playlist: Playlist,
    listeners: ListenerSet,
    session: SessionBridge,
    event_bus: EventBus,
    pending_switch: Option<SwitchRequest>,
    consecutive_failures: usize,
    nothing_playable: bool,
    /// Which way failed entries are skipped.
    skip_direction: Direction,
    /// Last play state reported to listeners.
    reported_playing: bool,
}

impl PlaybackCoordinator {
    pub fn new(
        config: PlaybackConfig,
        player_factory: Arc<dyn MediaPlayerFactory>,
        file_system: Arc<dyn FileSystemAccess>,
    ) -> Self {
        Self {
            resolver: SourceResolver::new(file_system, config.placeholder_max_bytes),
            engine: PlaybackEngine::new(player_factory),
            config,
            playlist: Playlist::new(),
            listeners: ListenerSet::new(),
            session: SessionBridge::default(),
            event_bus: EventBus::default(),
            pending_switch: None,
            consecutive_failures: 0,
            nothing_playable: false,
            skip_direction: Direction::Next,
            reported_playing: false,
        }
    }

    /// Build from the runtime configuration's bridges.
    pub fn from_core_config(core: &CoreConfig, config: PlaybackConfig, event_bus: EventBus) -> Self {
        Self::new(
            config,
            Arc::clone(&core.player_factory),
            Arc::clone(&core.file_system),
        )
        .with_session(SessionBridge::new(
            core.notification_presenter.clone(),
            core.media_session.clone(),
        ))
        .with_event_bus(event_bus)
    }

    pub fn with_session(mut self, session: SessionBridge) -> Self {
        self.session = session;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_listeners(mut self, listeners: ListenerSet) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ========================================================================
    // Initialisation
    // ========================================================================

    /// Seed the playlist and dispatch the start index.
    ///
    /// A start entry of the other media kind requests a switch instead of
    /// playing.
    #[instrument(skip(self, handoff), fields(entries = handoff.sources.len()))]
    pub async fn init_playlist(&mut self, handoff: &PlaylistHandoff, context: SurfaceContext) {
        self.seed(handoff, context).await;
        self.dispatch_current(true).await;
        self.sync_host().await;
    }

    /// Seed the playlist without starting playback.
    ///
    /// Used by a surface that renders on its own and only needs the engine
    /// for navigation. An unknown context is taken to be the video surface.
    #[instrument(skip(self, handoff), fields(entries = handoff.sources.len()))]
    pub async fn init_playlist_without_autoplay(
        &mut self,
        handoff: &PlaylistHandoff,
        context: SurfaceContext,
    ) {
        let context = match context {
            SurfaceContext::Unknown => SurfaceContext::Video,
            declared => declared,
        };
        self.seed(handoff, context).await;
        self.sync_host().await;
    }

    /// A (re)binding surface declares which kind it hosts.
    ///
    /// Resolves a pending switch for the current index by dispatching it.
    pub async fn set_surface_context(&mut self, context: SurfaceContext) {
        self.playlist.set_context(context);
        self.emit_surface(SurfaceEvent::ContextChanged {
            context: context.media_kind(),
        });
        debug!(%context, "Surface context changed");

        let resolves_pending = self.pending_switch.is_some_and(|pending| {
            context.hosts(pending.media_kind) && self.playlist.index() == Some(pending.index)
        });
        if resolves_pending && !self.engine.has_player() {
            self.pending_switch = None;
            self.dispatch_current(false).await;
            self.sync_host().await;
        }
    }

    async fn seed(&mut self, handoff: &PlaylistHandoff, context: SurfaceContext) {
        self.engine.release().await;
        if self.reported_playing {
            self.publish_play_state(false);
        }
        let seeded = entries_from_handoff(handoff);
        info!(
            entries = seeded.entries.len(),
            start_index = seeded.start_index,
            %context,
            "Seeding playlist"
        );
        self.playlist
            .seed(seeded.entries, seeded.start_index, context);
        self.pending_switch = None;
        self.reset_failures();
        self.skip_direction = Direction::Next;
        self.emit_surface(SurfaceEvent::ContextChanged {
            context: context.media_kind(),
        });
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn next(&mut self) {
        self.navigate(Direction::Next, true).await;
        self.sync_host().await;
    }

    pub async fn previous(&mut self) {
        self.navigate(Direction::Previous, true).await;
        self.sync_host().await;
    }

    async fn navigate(&mut self, direction: Direction, user_initiated: bool) {
        if self.playlist.is_empty() {
            debug!(?direction, "Ignoring navigation on empty playlist");
            return;
        }

        self.engine.release().await;
        if user_initiated {
            self.reset_failures();
        }
        self.skip_direction = direction;
        self.playlist.step(direction);
        self.dispatch_current(true).await;
    }

    /// Run the match/mismatch decision for the current index, skipping over
    /// entries that fail to start.
    async fn dispatch_current(&mut self, mut announce: bool) {
        while let Some(dispatch) = self.playlist.dispatch() {
            let Some(entry) = self.playlist.current().cloned() else {
                return;
            };

            if announce {
                self.announce_position(&entry);
            }
            announce = true;

            match dispatch {
                Dispatch::Switch { index, media_kind } => {
                    self.request_switch(SwitchRequest { index, media_kind });
                    return;
                }
                Dispatch::Play { index } => match self.start_entry(index, &entry).await {
                    Ok(()) => return,
                    Err(e) => {
                        if !self.record_failure(index, &e).await {
                            return;
                        }
                        self.playlist.step(self.skip_direction);
                    }
                },
            }
        }
    }

    fn announce_position(&mut self, entry: &PlaylistEntry) {
        let Some(index) = self.playlist.index() else {
            return;
        };
        self.pending_switch = None;
        self.listeners.position_changed(index, &entry.title);
        self.emit(PlaybackEvent::PositionChanged {
            index,
            title: entry.title.clone(),
        });
    }

    fn request_switch(&mut self, request: SwitchRequest) {
        if self.pending_switch == Some(request) {
            debug!(index = request.index, "Switch already requested");
            return;
        }
        if self.reported_playing {
            self.publish_play_state(false);
        }

        info!(
            index = request.index,
            media_kind = %request.media_kind,
            context = %self.playlist.context(),
            "Requesting surface switch"
        );
        self.pending_switch = Some(request);
        self.listeners.switch_requested(request);
        self.emit_surface(SurfaceEvent::SwitchRequested {
            index: request.index,
            media_kind: request.media_kind,
        });
    }

    async fn start_entry(&mut self, index: usize, entry: &PlaylistEntry) -> Result<()> {
        let source = self.resolver.resolve(entry).await?;
        let remote = source.is_remote();

        match self
            .engine
            .start(index, source, self.playlist.is_repeat())
            .await?
        {
            StartOutcome::Started => self.on_started(index, entry, remote),
            StartOutcome::Preparing => {
                debug!(index, "Waiting for remote source to prepare");
            }
        }
        Ok(())
    }

    fn on_started(&mut self, index: usize, entry: &PlaylistEntry, remote: bool) {
        self.reset_failures();
        self.skip_direction = Direction::Next;
        info!(index, title = %entry.title, media_kind = %entry.media_kind, remote, "Track started");
        self.emit(PlaybackEvent::TrackStarted {
            index,
            title: entry.title.clone(),
            media_kind: entry.media_kind,
            remote,
        });
        self.publish_play_state(true);
    }

    // ========================================================================
    // Failure handling
    // ========================================================================

    fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
        self.nothing_playable = false;
    }

    /// Count a failed start. Returns `false` once the skip limit is reached.
    async fn record_failure(&mut self, index: usize, err: &PlaybackError) -> bool {
        self.engine.release().await;
        self.consecutive_failures += 1;

        warn!(
            index,
            reason = err.reason(),
            network = err.is_network_error(),
            attempts = self.consecutive_failures,
            error = %err,
            "Skipping entry"
        );
        self.emit(PlaybackEvent::TrackSkipped {
            index,
            reason: err.reason().to_string(),
        });

        if self.consecutive_failures >= self.config.skip_limit(self.playlist.len()) {
            self.enter_nothing_playable().await;
            return false;
        }
        true
    }

    async fn enter_nothing_playable(&mut self) {
        let attempts = self.consecutive_failures;
        error!(attempts, "No playable entry in playlist");

        self.engine.release().await;
        self.nothing_playable = true;
        self.publish_play_state(false);
        self.listeners.nothing_playable();
        self.emit(PlaybackEvent::NothingPlayable { attempts });
        self.session.demote(false).await;
    }

    async fn skip_after_failure(&mut self, err: PlaybackError) {
        let Some(index) = self.playlist.index() else {
            return;
        };
        if self.record_failure(index, &err).await {
            self.playlist.step(self.skip_direction);
            self.dispatch_current(true).await;
        }
    }

    // ========================================================================
    // Player callbacks
    // ========================================================================

    /// Handle an asynchronous callback from a native player.
    ///
    /// Callbacks from released players are dropped.
    pub async fn on_player_event(&mut self, token: PlayerToken, event: PlayerEvent) {
        if !self.engine.accepts(token) {
            debug!(%token, ?event, "Dropping callback from released player");
            return;
        }

        match event {
            PlayerEvent::Prepared => match self.engine.on_prepared(token).await {
                Ok(true) => {
                    if let (Some(index), Some(entry)) =
                        (self.playlist.index(), self.playlist.current().cloned())
                    {
                        self.on_started(index, &entry, true);
                    }
                }
                Ok(false) => debug!(%token, "Prepared while paused"),
                Err(e) => self.skip_after_failure(e).await,
            },
            PlayerEvent::Completed => self.on_completion().await,
            PlayerEvent::Error(failure) => self.skip_after_failure(failure.into()).await,
        }
        self.sync_host().await;
    }

    async fn on_completion(&mut self) {
        if self.playlist.is_repeat() {
            debug!(index = ?self.playlist.index(), "Repeating entry");
            self.engine.release().await;
            self.dispatch_current(false).await;
        } else {
            self.navigate(Direction::Next, false).await;
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn play(&mut self) {
        match self.engine.play().await {
            Ok(true) => self.publish_play_state(true),
            Ok(false) => {}
            Err(e) => self.skip_after_failure(e).await,
        }
        self.sync_host().await;
    }

    pub async fn pause(&mut self) {
        match self.engine.pause().await {
            Ok(true) => self.publish_play_state(false),
            Ok(false) => {}
            Err(e) => self.skip_after_failure(e).await,
        }
        self.sync_host().await;
    }

    pub async fn toggle_play_pause(&mut self) {
        if self.engine.wants_pause() {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Seek the active player, clamped to its duration.
    pub async fn seek_to(&mut self, position: Duration) {
        self.seek(SeekKind::Absolute(position)).await;
    }

    /// Seek forward by the configured step.
    pub async fn fast_forward(&mut self) {
        self.seek(SeekKind::Forward).await;
    }

    /// Seek backward by the configured step, floored at zero.
    pub async fn fast_rewind(&mut self) {
        self.seek(SeekKind::Rewind).await;
    }

    async fn seek(&mut self, kind: SeekKind) {
        let step = self.config.seek_step;
        let result = match kind {
            SeekKind::Absolute(position) => self.engine.seek_to(position).await,
            SeekKind::Forward => self.engine.fast_forward(step).await,
            SeekKind::Rewind => self.engine.fast_rewind(step).await,
        };

        match result {
            Ok(Some(target)) => debug!(position_ms = target.as_millis() as u64, "Seeked"),
            Ok(None) => debug!("Seek ignored without a prepared player"),
            Err(e) => self.skip_after_failure(e).await,
        }
        self.sync_host().await;
    }

    /// Flip repeat and apply it to the live player's looping flag.
    pub async fn toggle_repeat(&mut self) {
        let is_repeat = self.playlist.toggle_repeat();
        if let Err(e) = self.engine.set_looping(is_repeat).await {
            warn!(error = %e, "Failed to update player looping");
        }
        debug!(is_repeat, "Repeat toggled");
        self.listeners.repeat_changed(is_repeat);
        self.emit(PlaybackEvent::RepeatChanged { is_repeat });
        self.sync_host().await;
    }

    /// Release the player and dismiss the notification. The playlist is kept.
    pub async fn stop(&mut self) {
        if self.engine.has_player() {
            self.engine.release().await;
            self.emit(PlaybackEvent::Stopped);
        }
        if self.reported_playing {
            self.publish_play_state(false);
        }
        let now = self.now_playing();
        self.session.dismiss(&now).await;
    }

    /// Apply a command intent. Safe without an active player.
    pub async fn handle_command(&mut self, command: MediaCommand) {
        debug!(?command, "Handling media command");
        match command {
            MediaCommand::PlayPause => self.toggle_play_pause().await,
            MediaCommand::Play => self.play().await,
            MediaCommand::Pause => self.pause().await,
            MediaCommand::Next => self.next().await,
            MediaCommand::Previous => self.previous().await,
            MediaCommand::FastForward => self.fast_forward().await,
            MediaCommand::FastRewind => self.fast_rewind().await,
            MediaCommand::ToggleRepeat => self.toggle_repeat().await,
            MediaCommand::Stop => self.stop().await,
            MediaCommand::SeekTo(position) => self.seek_to(position).await,
        }
    }

    /// Release the player, notification and session deterministically.
    pub async fn shutdown(&mut self) {
        info!("Shutting down playback coordinator");
        if self.engine.has_player() {
            self.engine.release().await;
            self.emit(PlaybackEvent::Stopped);
        }
        if self.reported_playing {
            self.publish_play_state(false);
        }
        self.session.release().await;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn status(&self) -> PlaybackStatus {
        let entry = self.playlist.current();
        PlaybackStatus {
            index: self.playlist.index(),
            title: entry.map(|e| e.title.clone()),
            artist: entry.and_then(|e| e.artist.clone()),
            media_kind: entry.map(|e| e.media_kind),
            is_playing: self.engine.is_playing(),
            is_repeat: self.playlist.is_repeat(),
            context: self.playlist.context(),
            pending_switch: self.pending_switch,
            entry_count: self.playlist.len(),
            nothing_playable: self.nothing_playable,
        }
    }

    pub fn progress(&self) -> PlaybackProgress {
        PlaybackProgress {
            index: self
                .engine
                .active_source()
                .map(|(index, _)| index)
                .or(self.playlist.index()),
            position: self.engine.position(),
            duration: self.engine.duration(),
            is_playing: self.engine.is_playing(),
        }
    }

    pub fn active_source(&self) -> Option<(usize, PlayerSource)> {
        self.engine.active_source()
    }

    pub fn has_player(&self) -> bool {
        self.engine.has_player()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        self.playlist.entries()
    }

    /// Payload a surface passes along when switching at `index`
    /// (default: the current index).
    pub fn handoff_for(&self, index: Option<usize>) -> Result<PlaylistHandoff> {
        let entries = self.playlist.entries();
        if entries.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        let index = index.or(self.playlist.index()).unwrap_or_default();
        let target = entries.get(index).ok_or(PlaybackError::IndexOutOfRange {
            index,
            len: entries.len(),
        })?;

        Ok(PlaylistHandoff::new(entries.iter().map(|e| e.source_ref.clone()).collect())
            .with_titles(entries.iter().map(|e| e.title.clone()).collect())
            .with_artists(
                entries
                    .iter()
                    .map(|e| e.artist.clone().unwrap_or_default())
                    .collect(),
            )
            .with_media_kinds(entries.iter().map(|e| e.media_kind).collect())
            .starting_at(index)
            .for_context(target.media_kind))
    }

    // ========================================================================
    // Host synchronisation
    // ========================================================================

    fn publish_play_state(&mut self, is_playing: bool) {
        self.reported_playing = is_playing;
        self.listeners.playback_state_changed(is_playing);
        self.emit(PlaybackEvent::StateChanged { is_playing });
    }

    fn now_playing(&self) -> NowPlaying {
        let entry = self.playlist.current();
        NowPlaying {
            title: entry.map(|e| e.title.clone()),
            artist: entry.and_then(|e| e.artist.clone()),
            media_kind: entry.map(|e| e.media_kind).unwrap_or_default(),
            is_playing: self.engine.is_playing(),
            is_repeat: self.playlist.is_repeat(),
            has_player: self.engine.has_player(),
            has_entries: !self.playlist.is_empty(),
            position: self.engine.position(),
            duration: self.engine.duration(),
        }
    }

    /// Re-render notification and session from current state.
    async fn sync_host(&mut self) {
        let now = self.now_playing();
        self.session.refresh(&now).await;
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.event_bus.emit(CoreEvent::Playback(event));
    }

    fn emit_surface(&self, event: SurfaceEvent) {
        let _ = self.event_bus.emit(CoreEvent::Surface(event));
    }
}

enum SeekKind {
    Absolute(Duration),
    Forward,
    Rewind,
}
