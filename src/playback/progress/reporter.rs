use super::TrackProgress;
use crate::models::Track;
use crate::playback::engine::EngineStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Cancellable periodic task reporting the playing track's position.
///
/// One instance is spawned on every transition into playing and at most one
/// is live per controller. The task only reads engine state and emits
/// events; it never touches the queue or the session. It exits on its own
/// once the engine stops playing, without flipping controller state.
pub struct ProgressReporter {
    cancel_tx: watch::Sender<bool>,
}

impl ProgressReporter {
    pub fn spawn(
        track: Track,
        status: Arc<EngineStatus>,
        progress_tx: mpsc::UnboundedSender<TrackProgress>,
        interval: Duration,
    ) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval yields immediately; the first report is due one full
            // interval after playback starts.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if *cancel_rx.borrow() {
                            break;
                        }
                        if !status.is_playing() {
                            debug!("engine no longer playing, reporter exiting");
                            break;
                        }
                        let _ = progress_tx.send(TrackProgress {
                            track: track.clone(),
                            position: status.position(),
                        });
                    }
                    // Also fires on sender drop, so an abandoned reporter
                    // never outlives its controller.
                    _ = cancel_rx.changed() => break,
                }
            }
        });

        Self { cancel_tx }
    }

    /// Cooperative cancellation; observed immediately while sleeping and at
    /// the next interval boundary at the latest.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_track() -> Track {
        Track {
            name: "Tick".to_string(),
            album_name: "Ticks".to_string(),
            small_artwork_url: String::new(),
            large_artwork_url: String::new(),
            stream_url: "https://streams.test/tick.mp3".to_string(),
        }
    }

    #[tokio::test]
    async fn reports_while_playing_and_stops_on_cancel() {
        let status = Arc::new(EngineStatus::default());
        status.set_playing(true);
        status.set_position(Duration::from_millis(250));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::spawn(
            test_track(),
            status.clone(),
            tx,
            Duration::from_millis(10),
        );

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no progress before timeout")
            .expect("progress channel closed");
        assert_eq!(first.track.name, "Tick");
        assert_eq!(first.position, Duration::from_millis(250));

        reporter.cancel();
        // Drain anything emitted before the cancel landed, then expect silence.
        while let Ok(Some(_)) =
            tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
        {}
    }

    #[tokio::test]
    async fn exits_when_engine_stops_playing() {
        let status = Arc::new(EngineStatus::default());
        status.set_playing(false);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reporter = ProgressReporter::spawn(
            test_track(),
            status,
            tx,
            Duration::from_millis(10),
        );

        // Not playing: the reporter exits without emitting anything.
        let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(matches!(outcome, Ok(None) | Err(_)));
    }
}
