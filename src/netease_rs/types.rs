use serde::{Deserialize, Serialize};

use crate::reconcile::{TrackRecord, format_duration};

/// Response of `/api/v6/playlist/detail`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetailResponse {
    pub code: i64,
    pub playlist: Option<NeteasePlaylist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteasePlaylist {
    pub id: u64,
    pub name: String,
    /// Every track id of the playlist; `tracks` on the same payload is
    /// truncated, so ids are fetched separately in batches.
    #[serde(rename = "trackIds", default)]
    pub track_ids: Vec<NeteaseTrackId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseTrackId {
    pub id: u64,
}

/// Response of `/api/v3/song/detail`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongDetailResponse {
    pub code: i64,
    #[serde(default)]
    pub songs: Vec<NeteaseSong>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseSong {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub ar: Vec<NeteaseArtist>,
    pub al: Option<NeteaseAlbum>,
    /// Duration in milliseconds
    #[serde(default)]
    pub dt: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseArtist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseAlbum {
    pub name: Option<String>,
}

impl From<NeteaseSong> for TrackRecord {
    fn from(song: NeteaseSong) -> Self {
        TrackRecord {
            id: song.id.to_string(),
            title: song.name,
            artist: song
                .ar
                .into_iter()
                .map(|artist| artist.name.unwrap_or_default())
                .collect::<Vec<_>>()
                .join("/"),
            album: song.al.and_then(|album| album.name).unwrap_or_default(),
            duration: format_duration(song.dt),
        }
    }
}
