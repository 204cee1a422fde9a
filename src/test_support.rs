// Test support utilities for both unit and integration tests

use crate::playback::{
    AudioEngine, EngineError, EngineFactory, EngineSignal, EngineStatus, Notifier,
    PlaybackSnapshot,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// State shared between a mock engine and the test driving it.
///
/// The engine never signals on its own; tests fire readiness, completion
/// and errors explicitly, which is what makes the asynchronous paths
/// deterministic to exercise.
#[derive(Default)]
pub struct MockEngineState {
    status: Arc<EngineStatus>,
    signals: Mutex<Option<mpsc::UnboundedSender<EngineSignal>>>,
    loaded_url: Mutex<Option<String>>,
    stopped: AtomicBool,
}

impl MockEngineState {
    pub fn fire_ready(&self) {
        self.send(EngineSignal::Ready);
    }

    pub fn fire_completed(&self) {
        self.send(EngineSignal::Completed);
    }

    pub fn fire_error(&self, code: i32) {
        self.send(EngineSignal::Error(EngineError::Playback { code }));
    }

    /// Natural end of the track: output stops, then completion is signalled
    pub fn finish_track(&self) {
        self.status.set_playing(false);
        self.send(EngineSignal::Completed);
    }

    fn send(&self, signal: EngineSignal) {
        if let Some(tx) = self.signals.lock().unwrap().as_ref() {
            // A send into a torn-down session is expected to fail silently.
            let _ = tx.send(signal);
        }
    }

    pub fn loaded_url(&self) -> Option<String> {
        self.loaded_url.lock().unwrap().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn position(&self) -> Duration {
        self.status.position()
    }

    pub fn set_position(&self, position: Duration) {
        self.status.set_position(position);
    }
}

/// Mock audio engine driven entirely by the test through [`MockEngineState`]
struct MockEngine {
    state: Arc<MockEngineState>,
}

#[async_trait]
impl AudioEngine for MockEngine {
    async fn load(
        &mut self,
        stream_url: &str,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Result<(), EngineError> {
        if stream_url.is_empty() {
            return Err(EngineError::StreamOpen("empty stream url".to_string()));
        }
        *self.state.loaded_url.lock().unwrap() = Some(stream_url.to_string());
        *self.state.signals.lock().unwrap() = Some(signals);
        Ok(())
    }

    fn play(&mut self) {
        self.state.status.set_playing(true);
    }

    fn pause(&mut self) {
        self.state.status.set_playing(false);
    }

    fn stop(&mut self) {
        self.state.status.set_playing(false);
        self.state.stopped.store(true, Ordering::Release);
    }

    fn seek(&mut self, position: Duration) {
        self.state.status.set_position(position);
    }

    fn status(&self) -> Arc<EngineStatus> {
        self.state.status.clone()
    }
}

/// Factory that records every engine it creates so tests can drive them
#[derive(Default)]
pub struct MockEngineFactory {
    engines: Mutex<Vec<Arc<MockEngineState>>>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engines_created(&self) -> usize {
        self.engines.lock().unwrap().len()
    }

    /// State of the nth engine handed out, in creation order
    pub fn engine(&self, index: usize) -> Arc<MockEngineState> {
        self.engines.lock().unwrap()[index].clone()
    }

    pub fn last_engine(&self) -> Option<Arc<MockEngineState>> {
        self.engines.lock().unwrap().last().cloned()
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self) -> Box<dyn AudioEngine> {
        let state = Arc::new(MockEngineState::default());
        self.engines.lock().unwrap().push(state.clone());
        Box::new(MockEngine { state })
    }
}

/// Notifier that records every refresh it receives
#[derive(Default)]
pub struct RecordingNotifier {
    refreshes: Mutex<Vec<PlaybackSnapshot>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.lock().unwrap().len()
    }

    pub fn last_refresh(&self) -> Option<PlaybackSnapshot> {
        self.refreshes.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn refresh(&self, snapshot: &PlaybackSnapshot) {
        self.refreshes.lock().unwrap().push(snapshot.clone());
    }
}
