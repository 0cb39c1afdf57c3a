use std::borrow::Cow;

use super::normalize::normalize_title;
use super::table::{Table, Tabular, group_by};
use super::track::PlaylistCollection;

/// A track that shares its normalized title with at least one other track
/// of the same playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRow {
    pub match_key: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: String,
}

impl Tabular for DuplicateRow {
    fn headers() -> &'static [&'static str] {
        &["match_key", "title", "artist", "album", "duration"]
    }

    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.match_key.as_str()),
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.artist.as_str()),
            Cow::Borrowed(self.album.as_str()),
            Cow::Borrowed(self.duration.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Sorted by (match key, artist)
    pub rows: Table<DuplicateRow>,
    /// Number of distinct keys with two or more tracks
    pub groups: usize,
}

/// Find tracks of one playlist that look like versions of the same song.
pub fn find_internal_duplicates(collection: &PlaylistCollection) -> DuplicateReport {
    let groups = group_by(&collection.tracks, |track| normalize_title(&track.title));

    let mut report = DuplicateReport::default();
    for (match_key, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        report.groups += 1;
        // Stable, so equal artists keep playlist order.
        members.sort_by(|a, b| a.artist.cmp(&b.artist));
        for track in members {
            report.rows.push(DuplicateRow {
                match_key: match_key.clone(),
                title: track.title.clone(),
                artist: track.artist.clone(),
                album: track.album.clone(),
                duration: track.duration.clone(),
            });
        }
    }
    report
}
