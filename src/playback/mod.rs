// # Playback Module
//
// Queue-driven playback controller for streamable tracks:
//
// - **TrackQueue**: ordered tracks plus the current-selection cursor
// - **AudioEngine**: contract for the asynchronous platform audio engine
// - **PlaybackService**: single-task controller that serializes transport
//   commands and engine signals and owns the engine lifecycle
// - **ProgressReporter**: cancellable periodic position reporting
// - **ProgressHandle**: subscriber fan-out for `TrackProgress` events
//
// Public API:
// - `PlaybackService::start` / `PlaybackHandle`: create and drive the service
// - `Notifier`: transport-UI refresh triggers
// - `TrackProgress`: events via `PlaybackHandle::subscribe_progress`

mod engine;
mod notifier;
mod progress;
mod queue;
mod service;

pub use engine::{AudioEngine, EngineError, EngineFactory, EngineSignal, EngineStatus};
pub use notifier::{NoopNotifier, Notifier};
pub use progress::{ProgressHandle, TrackProgress};
pub use service::{
    PlaybackCommand, PlaybackConfig, PlaybackHandle, PlaybackService, PlaybackSnapshot,
    PlaybackState,
};
