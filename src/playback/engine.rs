use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by an audio engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("failed to open stream source: {0}")]
    StreamOpen(String),
    #[error("playback failed with engine code {code}")]
    Playback { code: i32 },
}

/// Asynchronous callbacks from the engine.
///
/// Delivered over the per-session channel handed to [`AudioEngine::load`];
/// the controller consumes them on its own command loop, so they never race
/// against transport commands.
#[derive(Debug, Clone)]
pub enum EngineSignal {
    /// Buffering finished; transport controls are usable now
    Ready,
    /// The track played to its natural end
    Completed,
    /// Unrecoverable failure; the engine is dead for this track
    Error(EngineError),
}

/// Lock-free transport state shared between the engine, the controller's
/// precondition checks, and the progress reporter.
#[derive(Debug, Default)]
pub struct EngineStatus {
    playing: AtomicBool,
    position_ms: AtomicU64,
}

impl EngineStatus {
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::Acquire))
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub fn set_position(&self, position: Duration) {
        self.position_ms
            .store(position.as_millis() as u64, Ordering::Release);
    }
}

/// Contract for the platform audio engine.
///
/// Preparation is asynchronous: `load` returns once the submission is
/// accepted and readiness arrives later as [`EngineSignal::Ready`]. The
/// transport controls are non-blocking and only meaningful after readiness.
#[async_trait]
pub trait AudioEngine: Send {
    /// Begin asynchronous preparation of a stream.
    ///
    /// Submission failures (malformed URL, source refused) are returned
    /// directly; everything later arrives as a signal.
    async fn load(
        &mut self,
        stream_url: &str,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Result<(), EngineError>;

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek(&mut self, position: Duration);

    /// Shared view of the transport state, cheap to poll
    fn status(&self) -> Arc<EngineStatus>;
}

/// Creates one fresh engine per playback session
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn AudioEngine>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_position_and_playing() {
        let status = EngineStatus::default();
        assert!(!status.is_playing());
        assert_eq!(status.position(), Duration::ZERO);

        status.set_playing(true);
        status.set_position(Duration::from_millis(1500));
        assert!(status.is_playing());
        assert_eq!(status.position(), Duration::from_millis(1500));

        status.set_playing(false);
        assert!(!status.is_playing());
    }
}
