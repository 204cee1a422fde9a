use super::service::PlaybackSnapshot;

/// Receives transport-UI refresh triggers.
///
/// Fired when playback pauses, resumes, or switches tracks. Rendering (a
/// notification, lock-screen controls, an on-screen transport bar) belongs
/// to the platform layer; implementations get the current snapshot and
/// decide what to show.
pub trait Notifier: Send + Sync {
    fn refresh(&self, snapshot: &PlaybackSnapshot);
}

/// Notifier for headless hosts; drops every refresh
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn refresh(&self, _snapshot: &PlaybackSnapshot) {}
}
