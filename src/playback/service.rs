use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::engine::{AudioEngine, EngineFactory, EngineSignal};
use super::notifier::Notifier;
use super::progress::{ProgressHandle, ProgressReporter, TrackProgress};
use super::queue::TrackQueue;
use crate::models::Track;

/// Playback commands sent to the service
#[derive(Debug)]
pub enum PlaybackCommand {
    SetQueue(Vec<Track>),
    PlayTrackAt(usize),
    Pause,
    Resume,
    Next,
    Previous,
    SeekTo(Duration),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
}

/// Current playback state
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Preparing { track: Track },
    Playing { track: Track },
    Paused { track: Track },
}

/// Point-in-time view of the controller, answered over [`PlaybackCommand::Snapshot`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub queue_len: usize,
    pub cursor: Option<usize>,
}

/// Playback service configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Cadence of progress events while playing
    pub progress_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("ENCORE_PROGRESS_INTERVAL_MS") {
            match value.parse::<u64>() {
                Ok(ms) if ms > 0 => config.progress_interval = Duration::from_millis(ms),
                _ => warn!(value = %value, "ignoring invalid ENCORE_PROGRESS_INTERVAL_MS"),
            }
        }
        config
    }
}

/// Handle to the playback service for sending commands
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: mpsc::UnboundedSender<PlaybackCommand>,
    progress_handle: ProgressHandle,
}

impl PlaybackHandle {
    pub fn set_queue(&self, tracks: Vec<Track>) {
        let _ = self.command_tx.send(PlaybackCommand::SetQueue(tracks));
    }

    pub fn play_track_at(&self, index: usize) {
        let _ = self.command_tx.send(PlaybackCommand::PlayTrackAt(index));
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Resume);
    }

    pub fn next(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Next);
    }

    pub fn previous(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Previous);
    }

    pub fn seek(&self, position: Duration) {
        let _ = self.command_tx.send(PlaybackCommand::SeekTo(position));
    }

    /// Ask the service for its current state. Replies only after every
    /// command sent before this one has been handled; `None` once the
    /// service is gone.
    pub async fn snapshot(&self) -> Option<PlaybackSnapshot> {
        let (tx, rx) = oneshot::channel();
        if self
            .command_tx
            .send(PlaybackCommand::Snapshot(tx))
            .is_err()
        {
            return None;
        }
        rx.await.ok()
    }

    pub fn subscribe_progress(&self) -> mpsc::UnboundedReceiver<TrackProgress> {
        self.progress_handle.subscribe()
    }
}

/// Lifecycle phase of the active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Preparing,
    Playing,
    Paused,
}

/// One loaded track, from selection to teardown.
///
/// Owns the engine and the signal channel it reports on. Dropping the
/// session releases the engine and closes the channel, so a late signal
/// from a replaced engine can never reach a newer session.
struct Session {
    id: u64,
    track: Track,
    engine: Box<dyn AudioEngine>,
    phase: Phase,
    reporter: Option<ProgressReporter>,
    signal_rx: mpsc::UnboundedReceiver<EngineSignal>,
    // Keeps the channel open for the session's whole lifetime, even after
    // the engine's preparation task drops its sender.
    _signal_tx: mpsc::UnboundedSender<EngineSignal>,
}

/// Playback service that owns the queue and drives the audio engine.
///
/// Runs as a single task: transport commands and engine signals are
/// consumed by one `select!` loop, so state transitions are linearized and
/// never race. Redundant or out-of-order commands degrade to logged no-ops.
pub struct PlaybackService {
    command_rx: mpsc::UnboundedReceiver<PlaybackCommand>,
    progress_tx: mpsc::UnboundedSender<TrackProgress>,
    engine_factory: Arc<dyn EngineFactory>,
    notifier: Arc<dyn Notifier>,
    config: PlaybackConfig,
    queue: TrackQueue,
    session: Option<Session>,
    next_session_id: u64,
}

impl PlaybackService {
    pub fn start(
        engine_factory: Arc<dyn EngineFactory>,
        notifier: Arc<dyn Notifier>,
        config: PlaybackConfig,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();

        let progress_handle = ProgressHandle::new(progress_rx, runtime_handle.clone());

        let service = PlaybackService {
            command_rx,
            progress_tx,
            engine_factory,
            notifier,
            config,
            queue: TrackQueue::new(),
            session: None,
            next_session_id: 1,
        };

        runtime_handle.spawn(service.run());

        PlaybackHandle {
            command_tx,
            progress_handle,
        }
    }

    async fn run(mut self) {
        info!("playback service started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                signal = Self::next_signal(&mut self.session) => {
                    self.handle_signal(signal);
                }
            }
        }

        self.teardown_session();
        info!("playback service stopped");
    }

    /// Resolves with the active session's next engine signal; pends forever
    /// while no session exists.
    async fn next_signal(session: &mut Option<Session>) -> EngineSignal {
        match session {
            Some(session) => match session.signal_rx.recv().await {
                Some(signal) => signal,
                // Unreachable while the session holds its keep-alive sender.
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::SetQueue(tracks) => self.set_queue(tracks),
            PlaybackCommand::PlayTrackAt(index) => self.play_track_at(index).await,
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Resume => self.resume(),
            PlaybackCommand::Next => self.play_next().await,
            PlaybackCommand::Previous => self.play_previous().await,
            PlaybackCommand::SeekTo(position) => self.seek_to(position),
            PlaybackCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn set_queue(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            warn!("ignoring empty track list");
            return;
        }
        info!(len = tracks.len(), "queue replaced");
        self.queue.replace(tracks);
    }

    async fn play_track_at(&mut self, index: usize) {
        let Some(track) = self.queue.get(index).cloned() else {
            warn!(
                index,
                queue_len = self.queue.len(),
                "ignoring play request: index out of range"
            );
            return;
        };

        self.teardown_session();
        self.queue.set_cursor(index);

        let id = self.next_session_id;
        self.next_session_id += 1;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let mut engine = self.engine_factory.create();

        info!(session = id, track = %track.name, "preparing stream");
        if let Err(e) = engine.load(&track.stream_url, signal_tx.clone()).await {
            // The session stays around without a playable engine; a new
            // play command is the retry path.
            error!(session = id, error = %e, "failed to submit stream for preparation");
        }

        self.session = Some(Session {
            id,
            track,
            engine,
            phase: Phase::Preparing,
            reporter: None,
            signal_rx,
            _signal_tx: signal_tx,
        });
    }

    async fn play_next(&mut self) {
        match self.queue.next_index() {
            Some(index) => self.play_track_at(index).await,
            None => debug!("ignoring next: already at the end of the queue"),
        }
    }

    async fn play_previous(&mut self) {
        match self.queue.previous_index() {
            Some(index) => self.play_track_at(index).await,
            None => debug!("ignoring previous: already at the start of the queue"),
        }
    }

    fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("ignoring pause: no active session");
            return;
        };
        if !session.engine.status().is_playing() {
            debug!(session = session.id, "ignoring pause: engine is not playing");
            return;
        }

        session.engine.pause();
        if let Some(reporter) = session.reporter.take() {
            reporter.cancel();
        }
        session.phase = Phase::Paused;
        debug!(session = session.id, "paused");

        self.refresh_notifier();
    }

    fn resume(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("ignoring resume: no active session");
            return;
        };

        session.engine.play();
        // One live reporter at a time: replace, never stack.
        if let Some(reporter) = session.reporter.take() {
            reporter.cancel();
        }
        session.reporter = Some(ProgressReporter::spawn(
            session.track.clone(),
            session.engine.status(),
            self.progress_tx.clone(),
            self.config.progress_interval,
        ));
        session.phase = Phase::Playing;
        debug!(session = session.id, "playing");

        self.refresh_notifier();
    }

    fn seek_to(&mut self, position: Duration) {
        let Some(session) = self.session.as_mut() else {
            debug!("ignoring seek: no active session");
            return;
        };
        if !session.engine.status().is_playing() {
            debug!(session = session.id, "ignoring seek: engine is not playing");
            return;
        }

        debug!(
            session = session.id,
            position_ms = position.as_millis() as u64,
            "seeking"
        );
        session.engine.seek(position);
    }

    fn handle_signal(&mut self, signal: EngineSignal) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        match signal {
            EngineSignal::Ready => {
                info!(session = session.id, track = %session.track.name, "stream ready");
                self.publish_progress(Duration::ZERO);
                // Auto-play on load.
                self.resume();
            }
            EngineSignal::Error(error) => {
                // Playback cannot proceed for this track; the caller decides
                // whether to retry or surface the failure.
                error!(session = session.id, error = %error, "engine reported unrecoverable error");
            }
            EngineSignal::Completed => {
                debug!(
                    session = session.id,
                    "track completed; waiting for an explicit command"
                );
            }
        }
    }

    fn publish_progress(&self, position: Duration) {
        if let Some(session) = &self.session {
            let _ = self.progress_tx.send(TrackProgress {
                track: session.track.clone(),
                position,
            });
        }
    }

    fn refresh_notifier(&self) {
        let snapshot = self.snapshot();
        self.notifier.refresh(&snapshot);
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        let state = match &self.session {
            None => PlaybackState::Idle,
            Some(session) => {
                let track = session.track.clone();
                match session.phase {
                    Phase::Preparing => PlaybackState::Preparing { track },
                    Phase::Playing => PlaybackState::Playing { track },
                    Phase::Paused => PlaybackState::Paused { track },
                }
            }
        };

        PlaybackSnapshot {
            state,
            queue_len: self.queue.len(),
            cursor: self.queue.cursor(),
        }
    }

    /// Tear the active session down: cancel the reporter, stop the engine
    /// if it is active, then release it by dropping the session (which also
    /// detaches its signal channel).
    fn teardown_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        debug!(session = session.id, "tearing down session");

        if let Some(reporter) = session.reporter.take() {
            reporter.cancel();
        }
        if session.engine.status().is_playing() {
            session.engine.stop();
        }
    }
}
