use serde::{Deserialize, Serialize};

/// A single playable item from the catalog.
///
/// Immutable once constructed. The queue owns its tracks; events and
/// snapshots carry clones, never references into controller state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Display name of the track
    pub name: String,
    /// Name of the grouping the track belongs to (album, single, ...)
    pub album_name: String,
    /// Small artwork URL; empty when the catalog has none
    pub small_artwork_url: String,
    /// Large artwork URL; empty when the catalog has none
    pub large_artwork_url: String,
    /// Stream URL; a track without one cannot be played
    pub stream_url: String,
}

impl Track {
    pub fn is_playable(&self) -> bool {
        !self.stream_url.is_empty()
    }
}
