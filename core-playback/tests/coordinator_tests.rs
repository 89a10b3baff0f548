//! Coordinator and service tests against a recording player factory.
//!
//! This test suite verifies:
//! - At most one live player after every public call
//! - Surface-switch requests instead of playback for mismatched entries
//! - Skip-and-advance on resolution and player failures, bounded by the skip limit
//! - Repeat, completion and stale-callback handling
//! - The service handle and its shutdown path

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    FileMetadata, FileSystemAccess, MediaKind, MediaPlayer, MediaPlayerFactory, PlayerEvent,
    PlayerFailure, PlayerRequest, PlayerSource, PlayerToken, PlaylistHandoff,
};
use bytes::Bytes;
use core_playback::{
    PlaybackConfig, PlaybackCoordinator, PlaybackError, PlaybackService, SurfaceContext,
    SurfaceListener,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FactoryState {
    requests: Vec<PlayerRequest>,
    live: usize,
    max_live: usize,
    failing: HashSet<PlayerSource>,
}

/// Records every request and counts players that have not been released.
#[derive(Clone, Default)]
struct RecordingFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl RecordingFactory {
    fn fail_on(&self, source: PlayerSource) {
        self.state.lock().failing.insert(source);
    }

    fn created(&self) -> usize {
        self.state.lock().requests.len()
    }

    fn live(&self) -> usize {
        self.state.lock().live
    }

    fn max_live(&self) -> usize {
        self.state.lock().max_live
    }

    fn last_request(&self) -> PlayerRequest {
        self.state
            .lock()
            .requests
            .last()
            .cloned()
            .expect("no player was created")
    }

    fn last_token(&self) -> PlayerToken {
        self.last_request().token
    }
}

#[async_trait]
impl MediaPlayerFactory for RecordingFactory {
    async fn create(&self, request: PlayerRequest) -> BridgeResult<Box<dyn MediaPlayer>> {
        let mut state = self.state.lock();
        state.live += 1;
        state.max_live = state.max_live.max(state.live);
        let fails = state.failing.contains(&request.source);
        state.requests.push(request.clone());

        Ok(Box::new(FakePlayer {
            token: request.token,
            state: Arc::clone(&self.state),
            fails,
            playing: false,
            position: Duration::ZERO,
            released: false,
        }))
    }
}

struct FakePlayer {
    token: PlayerToken,
    state: Arc<Mutex<FactoryState>>,
    fails: bool,
    playing: bool,
    position: Duration,
    released: bool,
}

impl FakePlayer {
    fn check(&self) -> BridgeResult<()> {
        if self.fails {
            return Err(BridgeError::OperationFailed("unsupported codec".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaPlayer for FakePlayer {
    fn token(&self) -> PlayerToken {
        self.token
    }

    async fn prepare(&mut self) -> BridgeResult<()> {
        self.check()
    }

    async fn prepare_async(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    async fn start(&mut self) -> BridgeResult<()> {
        self.check()?;
        self.playing = true;
        Ok(())
    }

    async fn pause(&mut self) -> BridgeResult<()> {
        self.playing = false;
        Ok(())
    }

    async fn seek_to(&mut self, position: Duration) -> BridgeResult<()> {
        self.position = position;
        Ok(())
    }

    async fn set_looping(&mut self, _looping: bool) -> BridgeResult<()> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs(180))
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.playing = false;
            self.state.lock().live -= 1;
        }
    }
}

#[derive(Default)]
struct MemoryFs {
    files: HashMap<PathBuf, Bytes>,
}

impl MemoryFs {
    fn with_media(mut self, path: &str) -> Self {
        self.files
            .insert(PathBuf::from(path), Bytes::from(vec![0u8; 4096]));
        self
    }

    fn with_placeholder(mut self, path: &str, contents: &str) -> Self {
        self.files
            .insert(PathBuf::from(path), Bytes::from(contents.to_string()));
        self
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFs {
    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.files.contains_key(path))
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        self.files
            .get(path)
            .map(|data| FileMetadata {
                size: data.len() as u64,
                modified_at: None,
                is_directory: false,
            })
            .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Position(usize, String),
    PlayState(bool),
    Repeat(bool),
    Switch(usize, MediaKind),
    NothingPlayable,
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn clear(&self) {
        self.calls.lock().clear();
    }

    fn positions(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Position(index, _) => Some(index),
                _ => None,
            })
            .collect()
    }
}

impl SurfaceListener for Recorder {
    fn on_position_changed(&self, index: usize, title: &str) {
        self.calls.lock().push(Call::Position(index, title.to_string()));
    }

    fn on_playback_state_changed(&self, is_playing: bool) {
        self.calls.lock().push(Call::PlayState(is_playing));
    }

    fn on_repeat_changed(&self, is_repeat: bool) {
        self.calls.lock().push(Call::Repeat(is_repeat));
    }

    fn on_switch_requested(&self, index: usize, media_kind: MediaKind) {
        self.calls.lock().push(Call::Switch(index, media_kind));
    }

    fn on_nothing_playable(&self) {
        self.calls.lock().push(Call::NothingPlayable);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    coordinator: PlaybackCoordinator,
    factory: RecordingFactory,
    recorder: Arc<Recorder>,
    events: tokio::sync::broadcast::Receiver<CoreEvent>,
}

fn library() -> MemoryFs {
    MemoryFs::default()
        .with_media("/music/a.mp3")
        .with_media("/video/b.mp4")
        .with_media("/music/c.mp3")
        .with_media("/music/d.mp3")
        .with_placeholder("/remote/live.url", "https://cdn.example.com/live.mp3\n")
        .with_placeholder("/remote/broken.url", "not-a-url")
}

fn fixture_with(fs: MemoryFs, config: PlaybackConfig) -> Fixture {
    let factory = RecordingFactory::default();
    let bus = EventBus::new(256);
    let events = bus.subscribe();
    let coordinator = PlaybackCoordinator::new(config, Arc::new(factory.clone()), Arc::new(fs))
        .with_event_bus(bus);
    let recorder = Arc::new(Recorder::default());
    coordinator.listeners().add(recorder.clone());

    Fixture {
        coordinator,
        factory,
        recorder,
        events,
    }
}

fn fixture() -> Fixture {
    fixture_with(library(), PlaybackConfig::default())
}

fn handoff(entries: &[(&str, MediaKind)], start: usize) -> PlaylistHandoff {
    PlaylistHandoff::new(entries.iter().map(|(s, _)| s.to_string()).collect())
        .with_media_kinds(entries.iter().map(|(_, k)| *k).collect())
        .starting_at(start)
}

fn mixed() -> PlaylistHandoff {
    handoff(
        &[
            ("/music/a.mp3", MediaKind::Audio),
            ("/video/b.mp4", MediaKind::Video),
            ("/music/c.mp3", MediaKind::Audio),
        ],
        0,
    )
}

fn local(path: &str) -> PlayerSource {
    PlayerSource::LocalFile {
        path: PathBuf::from(path),
    }
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<CoreEvent>) -> Vec<PlaybackEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Playback(event) = event {
            out.push(event);
        }
    }
    out
}

// ============================================================================
// Initialisation and navigation
// ============================================================================

#[tokio::test]
async fn test_init_plays_matching_start_entry() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;

    assert_eq!(f.factory.created(), 1);
    assert_eq!(f.factory.last_request().source, local("/music/a.mp3"));
    assert_eq!(
        f.recorder.calls(),
        vec![Call::Position(0, "a".to_string()), Call::PlayState(true)]
    );

    let status = f.coordinator.status();
    assert_eq!(status.index, Some(0));
    assert!(status.is_playing);
    assert_eq!(status.entry_count, 3);
}

#[tokio::test]
async fn test_short_kind_array_keeps_tagged_video() {
    let mut f = fixture();
    let handoff = PlaylistHandoff::new(vec![
        "/music/a.mp3".into(),
        "/video/b.mp4".into(),
        "/music/c.mp3".into(),
    ])
    .with_media_kinds(vec![MediaKind::Audio, MediaKind::Video])
    .starting_at(1);

    f.coordinator
        .init_playlist(&handoff, SurfaceContext::Audio)
        .await;

    assert_eq!(f.factory.created(), 0);
    assert_eq!(
        f.recorder.calls(),
        vec![
            Call::Position(1, "b".to_string()),
            Call::Switch(1, MediaKind::Video)
        ]
    );

    // The untagged tail defaults to audio and plays on this surface.
    f.coordinator.next().await;
    assert_eq!(f.coordinator.status().media_kind, Some(MediaKind::Audio));
    assert_eq!(f.factory.last_request().source, local("/music/c.mp3"));
}

#[tokio::test]
async fn test_init_on_wrong_kind_requests_switch() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed().starting_at(1), SurfaceContext::Audio)
        .await;

    assert_eq!(f.factory.created(), 0);
    assert_eq!(
        f.recorder.calls(),
        vec![
            Call::Position(1, "b".to_string()),
            Call::Switch(1, MediaKind::Video)
        ]
    );
    assert!(f.coordinator.status().pending_switch.is_some());
}

#[tokio::test]
async fn test_single_entry_loops_on_completion() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(
            &handoff(&[("/music/a.mp3", MediaKind::Audio)], 0),
            SurfaceContext::Audio,
        )
        .await;
    let first = f.factory.last_token();

    f.coordinator
        .on_player_event(first, PlayerEvent::Completed)
        .await;

    assert_eq!(f.factory.created(), 2);
    assert_ne!(f.factory.last_token(), first);
    assert_eq!(f.coordinator.status().index, Some(0));
    assert!(f.coordinator.status().is_playing);
    assert_eq!(f.recorder.positions(), vec![0, 0]);
    assert_eq!(f.factory.live(), 1);
}

#[tokio::test]
async fn test_next_into_video_requests_switch_without_playback() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    f.recorder.clear();

    f.coordinator.next().await;

    assert_eq!(f.factory.created(), 1);
    assert_eq!(f.factory.live(), 0);
    assert!(!f.coordinator.has_player());
    assert_eq!(
        f.recorder.calls(),
        vec![
            Call::Position(1, "b".to_string()),
            Call::PlayState(false),
            Call::Switch(1, MediaKind::Video),
        ]
    );
}

#[tokio::test]
async fn test_navigation_wraps_both_ways() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Unknown)
        .await;

    f.coordinator.previous().await;
    assert_eq!(f.coordinator.status().index, Some(2));

    f.coordinator.next().await;
    assert_eq!(f.coordinator.status().index, Some(0));
    assert_eq!(f.factory.max_live(), 1);
}

#[tokio::test]
async fn test_two_steps_match_direct_start() {
    let mut walked = fixture();
    walked
        .coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    walked.coordinator.next().await;
    walked.coordinator.next().await;

    let mut direct = fixture();
    direct
        .coordinator
        .init_playlist(&mixed().starting_at(2), SurfaceContext::Audio)
        .await;

    assert_eq!(walked.coordinator.status().index, Some(2));
    assert_eq!(
        walked.coordinator.status().title,
        direct.coordinator.status().title
    );
    assert_eq!(
        walked.coordinator.active_source(),
        direct.coordinator.active_source()
    );
}

#[tokio::test]
async fn test_empty_playlist_commands_are_noops() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&PlaylistHandoff::default(), SurfaceContext::Audio)
        .await;

    f.coordinator.next().await;
    f.coordinator.previous().await;
    f.coordinator.play().await;
    f.coordinator.fast_forward().await;

    assert_eq!(f.factory.created(), 0);
    assert_eq!(f.coordinator.status().index, None);
    assert!(f.recorder.calls().is_empty());
    assert!(matches!(
        f.coordinator.handoff_for(None),
        Err(PlaybackError::EmptyPlaylist)
    ));
}

#[tokio::test]
async fn test_without_autoplay_only_seeds() {
    let mut f = fixture();
    f.coordinator
        .init_playlist_without_autoplay(&mixed().starting_at(1), SurfaceContext::Unknown)
        .await;

    let status = f.coordinator.status();
    assert_eq!(f.factory.created(), 0);
    assert_eq!(status.index, Some(1));
    assert_eq!(status.context, SurfaceContext::Video);
    assert!(f.recorder.calls().is_empty());
}

#[tokio::test]
async fn test_surface_context_resolves_pending_switch() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    f.coordinator.next().await;
    f.recorder.clear();

    f.coordinator
        .set_surface_context(SurfaceContext::Video)
        .await;

    assert_eq!(f.factory.last_request().source, local("/video/b.mp4"));
    assert_eq!(f.coordinator.status().pending_switch, None);
    assert_eq!(f.recorder.calls(), vec![Call::PlayState(true)]);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_pause_and_play_are_idempotent() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    f.recorder.clear();

    f.coordinator.pause().await;
    let once = f.coordinator.status();
    f.coordinator.pause().await;
    assert_eq!(f.coordinator.status().is_playing, once.is_playing);

    f.coordinator.play().await;
    f.coordinator.play().await;

    assert_eq!(
        f.recorder.calls(),
        vec![Call::PlayState(false), Call::PlayState(true)]
    );
    assert_eq!(f.factory.created(), 1);
}

#[tokio::test]
async fn test_seek_is_clamped_to_duration() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;

    f.coordinator.seek_to(Duration::from_secs(600)).await;
    assert_eq!(f.coordinator.progress().position, Duration::from_secs(180));

    f.coordinator.seek_to(Duration::from_secs(5)).await;
    f.coordinator.fast_rewind().await;
    assert_eq!(f.coordinator.progress().position, Duration::ZERO);

    f.coordinator.fast_forward().await;
    assert_eq!(f.coordinator.progress().position, Duration::from_secs(10));
}

#[tokio::test]
async fn test_stop_releases_player_but_keeps_playlist() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;

    f.coordinator.stop().await;

    assert_eq!(f.factory.live(), 0);
    assert_eq!(f.coordinator.status().index, Some(0));
    assert_eq!(f.coordinator.entries().len(), 3);
    assert!(drain(&mut f.events).contains(&PlaybackEvent::Stopped));

    // A command after stop must not panic or start anything.
    f.coordinator.pause().await;
    assert_eq!(f.factory.created(), 1);
}

// ============================================================================
// Repeat and player callbacks
// ============================================================================

#[tokio::test]
async fn test_repeat_replays_same_index_without_announcing() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    f.coordinator.toggle_repeat().await;
    f.coordinator.seek_to(Duration::from_secs(90)).await;
    f.recorder.clear();

    let first = f.factory.last_token();
    f.coordinator
        .on_player_event(first, PlayerEvent::Completed)
        .await;

    assert_eq!(f.factory.created(), 2);
    assert!(f.factory.last_request().looping);
    assert_eq!(f.coordinator.status().index, Some(0));
    assert_eq!(f.coordinator.progress().position, Duration::ZERO);
    assert!(f.recorder.positions().is_empty());
    assert_eq!(f.factory.live(), 1);
}

#[tokio::test]
async fn test_repeat_survives_reseeding() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Audio)
        .await;
    f.coordinator.toggle_repeat().await;

    f.coordinator
        .init_playlist(&mixed().starting_at(2), SurfaceContext::Audio)
        .await;

    assert!(f.coordinator.status().is_repeat);
    assert!(f.factory.last_request().looping);
    assert!(f.recorder.calls().contains(&Call::Repeat(true)));
}

#[tokio::test]
async fn test_stale_callbacks_are_ignored() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Unknown)
        .await;
    let stale = f.factory.last_token();
    f.coordinator.next().await;

    f.coordinator
        .on_player_event(stale, PlayerEvent::Completed)
        .await;
    f.coordinator
        .on_player_event(stale, PlayerEvent::Error(PlayerFailure::Server))
        .await;

    assert_eq!(f.coordinator.status().index, Some(1));
    assert_eq!(f.factory.created(), 2);
    assert!(f.coordinator.status().is_playing);
}

#[tokio::test]
async fn test_remote_source_starts_on_prepared() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(
            &handoff(&[("/remote/live.url", MediaKind::Audio)], 0),
            SurfaceContext::Audio,
        )
        .await;

    assert_eq!(
        f.factory.last_request().source,
        PlayerSource::RemoteStream {
            url: "https://cdn.example.com/live.mp3".to_string()
        }
    );
    assert!(!f.coordinator.status().is_playing);
    assert!(!f.recorder.calls().contains(&Call::PlayState(true)));

    let token = f.factory.last_token();
    f.coordinator
        .on_player_event(token, PlayerEvent::Prepared)
        .await;

    assert!(f.coordinator.status().is_playing);
    assert_eq!(f.recorder.calls().last(), Some(&Call::PlayState(true)));
}

#[tokio::test]
async fn test_pause_while_preparing_cancels_autostart() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(
            &handoff(&[("https://cdn.example.com/set.mp3", MediaKind::Audio)], 0),
            SurfaceContext::Audio,
        )
        .await;

    f.coordinator.pause().await;
    let token = f.factory.last_token();
    f.coordinator
        .on_player_event(token, PlayerEvent::Prepared)
        .await;

    assert!(!f.coordinator.status().is_playing);
    assert!(f.coordinator.has_player());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_malformed_placeholder_skips_to_next() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(
            &handoff(
                &[
                    ("/remote/broken.url", MediaKind::Audio),
                    ("/music/c.mp3", MediaKind::Audio),
                ],
                0,
            ),
            SurfaceContext::Audio,
        )
        .await;

    assert_eq!(f.coordinator.status().index, Some(1));
    assert_eq!(f.factory.last_request().source, local("/music/c.mp3"));
    assert_eq!(f.recorder.positions(), vec![0, 1]);
    assert!(drain(&mut f.events).contains(&PlaybackEvent::TrackSkipped {
        index: 0,
        reason: "malformed_placeholder".to_string(),
    }));
}

#[tokio::test]
async fn test_player_error_advances() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Unknown)
        .await;

    let token = f.factory.last_token();
    f.coordinator
        .on_player_event(token, PlayerEvent::Error(PlayerFailure::MalformedStream))
        .await;

    assert_eq!(f.coordinator.status().index, Some(1));
    assert!(f.coordinator.status().is_playing);
    assert_eq!(f.factory.live(), 1);
}

#[tokio::test]
async fn test_failing_prepare_is_released_and_skipped() {
    let mut f = fixture();
    f.factory.fail_on(local("/music/a.mp3"));
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Unknown)
        .await;

    assert_eq!(f.factory.created(), 2);
    assert_eq!(f.factory.max_live(), 1);
    assert_eq!(f.coordinator.status().index, Some(1));
}

#[tokio::test]
async fn test_previous_skips_backward_over_broken_entry() {
    let mut f = fixture();
    f.coordinator
        .init_playlist(
            &handoff(
                &[
                    ("/music/a.mp3", MediaKind::Audio),
                    ("/remote/broken.url", MediaKind::Audio),
                    ("/music/c.mp3", MediaKind::Audio),
                ],
                2,
            ),
            SurfaceContext::Audio,
        )
        .await;

    f.coordinator.previous().await;
    assert_eq!(f.coordinator.status().index, Some(0));
    assert_eq!(f.factory.last_request().source, local("/music/a.mp3"));
    assert_eq!(f.recorder.positions(), vec![2, 1, 0]);

    // Once an entry has started, failures skip forward again.
    let token = f.factory.last_token();
    f.coordinator
        .on_player_event(token, PlayerEvent::Error(PlayerFailure::Io))
        .await;
    assert_eq!(f.coordinator.status().index, Some(2));
    assert_eq!(f.recorder.positions(), vec![2, 1, 0, 1, 2]);
    assert_eq!(f.factory.live(), 1);
}

#[tokio::test]
async fn test_all_broken_playlist_stops_at_skip_limit() {
    let mut f = fixture_with(MemoryFs::default(), PlaybackConfig::default());
    f.coordinator
        .init_playlist(&mixed(), SurfaceContext::Unknown)
        .await;

    let status = f.coordinator.status();
    assert!(status.nothing_playable);
    assert!(!status.is_playing);
    assert_eq!(f.factory.created(), 0);
    assert_eq!(f.recorder.positions(), vec![0, 1, 2]);
    assert_eq!(f.recorder.calls().last(), Some(&Call::NothingPlayable));
    assert!(drain(&mut f.events).contains(&PlaybackEvent::NothingPlayable { attempts: 3 }));

    // User navigation resets the safeguard and walks the whole list again.
    f.coordinator.next().await;
    assert_eq!(f.recorder.positions(), vec![0, 1, 2, 0, 1, 2]);
    assert!(f.coordinator.status().nothing_playable);
}

#[tokio::test]
async fn test_configured_skip_limit_stops_early() {
    let config = PlaybackConfig {
        max_consecutive_skips: Some(2),
        ..PlaybackConfig::default()
    };
    let mut f = fixture_with(MemoryFs::default().with_media("/music/d.mp3"), config);
    f.coordinator
        .init_playlist(
            &handoff(
                &[
                    ("/music/a.mp3", MediaKind::Audio),
                    ("/music/b.mp3", MediaKind::Audio),
                    ("/music/d.mp3", MediaKind::Audio),
                ],
                0,
            ),
            SurfaceContext::Audio,
        )
        .await;

    assert!(f.coordinator.status().nothing_playable);
    assert_eq!(f.factory.created(), 0);
}

// ============================================================================
// Handoff
// ============================================================================

#[tokio::test]
async fn test_handoff_for_targets_requested_index() {
    let mut f = fixture();
    let titled = mixed().with_titles(vec!["A".into(), "B".into(), "C".into()]);
    f.coordinator
        .init_playlist(&titled, SurfaceContext::Audio)
        .await;

    let payload = f.coordinator.handoff_for(Some(1)).expect("handoff");
    assert_eq!(payload.sources, titled.sources);
    assert_eq!(payload.titles, titled.titles);
    assert_eq!(payload.start_index, 1);
    assert_eq!(payload.context, Some(MediaKind::Video));

    assert!(matches!(
        f.coordinator.handoff_for(Some(7)),
        Err(PlaybackError::IndexOutOfRange { index: 7, len: 3 })
    ));
}

// ============================================================================
// Service
// ============================================================================

#[tokio::test]
async fn test_rapid_next_keeps_one_player() {
    let f = fixture_with(library(), PlaybackConfig::default());
    let factory = f.factory.clone();
    let (handle, _task) = PlaybackService::spawn(f.coordinator, 16);

    let four = handoff(
        &[
            ("/music/a.mp3", MediaKind::Audio),
            ("/music/c.mp3", MediaKind::Audio),
            ("/music/d.mp3", MediaKind::Audio),
            ("/video/b.mp4", MediaKind::Video),
        ],
        0,
    );
    handle
        .init_playlist(four, SurfaceContext::Unknown)
        .await
        .expect("init");

    let taps: Vec<_> = (0..7)
        .map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.next().await })
        })
        .collect();
    for tap in taps {
        tap.await.expect("join").expect("next");
    }

    let status = handle.status().await.expect("status");
    assert_eq!(status.index, Some(7 % 4));
    assert_eq!(factory.max_live(), 1);
    assert_eq!(factory.live(), 1);
}

#[tokio::test]
async fn test_handle_routes_actions_and_callbacks() {
    let f = fixture();
    let factory = f.factory.clone();
    let recorder = f.recorder.clone();
    let (handle, _task) = PlaybackService::spawn(f.coordinator, 8);

    handle
        .init_playlist(mixed(), SurfaceContext::Unknown)
        .await
        .expect("init");
    handle.dispatch_action("media.next").expect("action");
    handle.dispatch_action("media.unknown").expect("ignored");
    handle.status().await.expect("flush");
    handle
        .player_event(factory.last_token(), PlayerEvent::Completed)
        .await
        .expect("callback");

    let status = handle.status().await.expect("status");
    assert_eq!(status.index, Some(2));
    assert_eq!(recorder.positions(), vec![0, 1, 2]);

    let listener: Arc<dyn SurfaceListener> = recorder;
    assert!(handle.remove_listener(&listener));
    assert_eq!(handle.listener_count(), 0);
}

#[tokio::test]
async fn test_shutdown_releases_and_closes() {
    let f = fixture();
    let factory = f.factory.clone();
    let (handle, task) = PlaybackService::spawn(f.coordinator, 8);

    handle
        .init_playlist(mixed(), SurfaceContext::Audio)
        .await
        .expect("init");
    assert_eq!(factory.live(), 1);

    handle.shutdown().await.expect("shutdown");
    task.await.expect("service task");

    assert_eq!(factory.live(), 0);
    assert!(matches!(
        handle.next().await,
        Err(PlaybackError::ServiceStopped)
    ));
}

#[tokio::test]
async fn test_dropping_handles_shuts_down() {
    let f = fixture();
    let factory = f.factory.clone();
    let (handle, task) = PlaybackService::spawn(f.coordinator, 8);

    handle
        .init_playlist(mixed(), SurfaceContext::Audio)
        .await
        .expect("init");
    drop(handle);
    task.await.expect("service task");

    assert_eq!(factory.live(), 0);
}
