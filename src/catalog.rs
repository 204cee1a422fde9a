use crate::models::Track;
use reqwest::{Client, Error as ReqwestError};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),
    #[error("catalog responded with status {0}")]
    Status(u16),
}

/// Top-tracks response wrapper
#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    tracks: Vec<TrackResponse>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    name: String,
    preview_url: Option<String>,
    album: AlbumResponse,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    name: String,
    #[serde(default)]
    images: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    url: String,
}

/// Client for the track catalog the discovery screens browse
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new() -> Self {
        Self::with_base_url("https://api.spotify.com/v1".to_string())
    }

    /// Create a client against a different base URL (used by tests)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Fetch an artist's top tracks for a country, mapped into playable tracks.
    ///
    /// Catalog entries without a preview stream are dropped; they cannot be
    /// played.
    pub async fn top_tracks(
        &self,
        artist_id: &str,
        country: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        let url = format!("{}/artists/{}/top-tracks", self.base_url, artist_id);
        let response = self
            .client
            .get(&url)
            .query(&[("country", country)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }

        let payload: TopTracksResponse = response.json().await?;
        Ok(map_tracks(payload))
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_tracks(payload: TopTracksResponse) -> Vec<Track> {
    let total = payload.tracks.len();
    let tracks: Vec<Track> = payload
        .tracks
        .into_iter()
        .filter_map(|track| {
            let stream_url = track.preview_url?;
            // Catalog image order: first is the small thumbnail, second the
            // large rendition.
            let small_artwork_url = track
                .album
                .images
                .first()
                .map(|image| image.url.clone())
                .unwrap_or_default();
            let large_artwork_url = track
                .album
                .images
                .get(1)
                .map(|image| image.url.clone())
                .unwrap_or_default();

            Some(Track {
                name: track.name,
                album_name: track.album.name,
                small_artwork_url,
                large_artwork_url,
                stream_url,
            })
        })
        .collect();

    if tracks.len() < total {
        warn!(
            dropped = total - tracks.len(),
            "dropped tracks without a preview stream"
        );
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_payload_into_tracks() {
        let payload: TopTracksResponse = serde_json::from_str(
            r#"{
                "tracks": [
                    {
                        "name": "One",
                        "preview_url": "https://p.test/one.mp3",
                        "album": {
                            "name": "Album One",
                            "images": [
                                { "url": "https://img.test/one-small.jpg" },
                                { "url": "https://img.test/one-large.jpg" }
                            ]
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        let tracks = map_tracks(payload);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "One");
        assert_eq!(tracks[0].album_name, "Album One");
        assert_eq!(tracks[0].small_artwork_url, "https://img.test/one-small.jpg");
        assert_eq!(tracks[0].large_artwork_url, "https://img.test/one-large.jpg");
        assert_eq!(tracks[0].stream_url, "https://p.test/one.mp3");
        assert!(tracks[0].is_playable());
    }

    #[test]
    fn skips_tracks_without_preview_stream() {
        let payload: TopTracksResponse = serde_json::from_str(
            r#"{
                "tracks": [
                    {
                        "name": "Silent",
                        "preview_url": null,
                        "album": { "name": "Album", "images": [] }
                    },
                    {
                        "name": "Audible",
                        "preview_url": "https://p.test/audible.mp3",
                        "album": { "name": "Album" }
                    }
                ]
            }"#,
        )
        .unwrap();

        let tracks = map_tracks(payload);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Audible");
        assert!(tracks[0].small_artwork_url.is_empty());
        assert!(tracks[0].large_artwork_url.is_empty());
    }
}
