use super::MatchMode;
use super::table::{Table, anti_join_by};
use super::track::{PlaylistCollection, TrackRecord};

/// Tracks of `a` with no counterpart in `b`, in `a`'s order.
pub fn difference(
    a: &PlaylistCollection,
    b: &PlaylistCollection,
    mode: MatchMode,
) -> Table<TrackRecord> {
    anti_join_by(&a.tracks, &b.tracks, |track| mode.key(track))
        .into_iter()
        .cloned()
        .collect()
}
