use super::MatchMode;
use super::table::{Table, dedup_first_by};
use super::track::{PlaylistCollection, TrackRecord};

/// Concatenate the collections in order, keeping the first track per key.
pub fn union(collections: &[PlaylistCollection], mode: MatchMode) -> Table<TrackRecord> {
    let concatenated = collections
        .iter()
        .flat_map(|collection| collection.tracks.iter());

    dedup_first_by(concatenated, |track| mode.key(track))
        .into_iter()
        .cloned()
        .collect()
}
