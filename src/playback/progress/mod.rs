pub mod handle;
pub mod reporter;

pub use handle::ProgressHandle;
pub use reporter::ProgressReporter;

use crate::models::Track;
use std::time::Duration;

/// The one event kind the controller publishes: "this track is playing at
/// this position". Emitted once when a stream becomes ready (position zero)
/// and then once per reporter tick while playing. Subscribers are expected
/// to be idempotent; there is no sequence numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackProgress {
    pub track: Track,
    pub position: Duration,
}
