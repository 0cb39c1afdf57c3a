use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::table::Tabular;

/// One song as known to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Opaque identifier assigned by the streaming service
    pub id: String,
    /// Raw display title, annotations included
    pub title: String,
    /// Contributing artists joined with `/`
    pub artist: String,
    /// Album name, possibly empty
    pub album: String,
    /// `MM:SS`, minutes not wrapped into hours
    pub duration: String,
}

/// Named field of a [`TrackRecord`], used to key table helpers explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackField {
    Id,
    Title,
    Artist,
    Album,
    Duration,
}

impl TrackField {
    pub const ALL: [TrackField; 5] = [
        TrackField::Id,
        TrackField::Title,
        TrackField::Artist,
        TrackField::Album,
        TrackField::Duration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrackField::Id => "id",
            TrackField::Title => "title",
            TrackField::Artist => "artist",
            TrackField::Album => "album",
            TrackField::Duration => "duration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl TrackRecord {
    pub fn get(&self, field: TrackField) -> &str {
        match field {
            TrackField::Id => &self.id,
            TrackField::Title => &self.title,
            TrackField::Artist => &self.artist,
            TrackField::Album => &self.album,
            TrackField::Duration => &self.duration,
        }
    }

    pub fn set(&mut self, field: TrackField, value: String) {
        match field {
            TrackField::Id => self.id = value,
            TrackField::Title => self.title = value,
            TrackField::Artist => self.artist = value,
            TrackField::Album => self.album = value,
            TrackField::Duration => self.duration = value,
        }
    }
}

impl Tabular for TrackRecord {
    fn headers() -> &'static [&'static str] {
        &["id", "title", "artist", "album", "duration"]
    }

    fn fields(&self) -> Vec<Cow<'_, str>> {
        TrackField::ALL
            .into_iter()
            .map(|field| Cow::Borrowed(self.get(field)))
            .collect()
    }
}

/// Format a millisecond count as `MM:SS`.
///
/// Minutes keep growing past 59 (`75:00`, not `1:15:00`).
pub fn format_duration(duration_ms: u64) -> String {
    format!(
        "{:02}:{:02}",
        duration_ms / 60_000,
        (duration_ms % 60_000) / 1000
    )
}

/// An ordered snapshot of one playlist plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistCollection {
    pub name: String,
    pub tracks: Vec<TrackRecord>,
}

impl PlaylistCollection {
    pub fn new(name: impl Into<String>, tracks: Vec<TrackRecord>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    /// Display name with the export file decoration (`playlist_` prefix and
    /// `.csv` suffix) removed.
    pub fn label(&self) -> String {
        display_label(&self.name)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

pub fn display_label(name: &str) -> String {
    name.replace("playlist_", "").replace(".csv", "")
}

#[cfg(test)]
pub(crate) fn track(id: &str, title: &str) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        title: title.to_string(),
        artist: String::new(),
        album: String::new(),
        duration: "03:00".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn track_by(id: &str, title: &str, artist: &str) -> TrackRecord {
    TrackRecord {
        artist: artist.to_string(),
        ..track(id, title)
    }
}
