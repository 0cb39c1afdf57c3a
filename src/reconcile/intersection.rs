use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use super::normalize::normalize_title;
use super::table::{Table, Tabular, dedup_first_by, group_by};
use super::track::{PlaylistCollection, TrackField, TrackRecord};

/// Tag emitted for ids found on both sides of a fuzzy intersection.
pub const BOTH_SOURCES: &str = "均有";

/// Inner join of every collection on track id.
///
/// Rows come from the first collection, in its order, one per id.
pub fn strict_intersection(collections: &[PlaylistCollection]) -> Table<TrackRecord> {
    let Some((first, rest)) = collections.split_first() else {
        return Table::new();
    };

    let others: Vec<HashSet<&str>> = rest
        .iter()
        .map(|collection| {
            collection
                .tracks
                .iter()
                .map(|track| track.get(TrackField::Id))
                .collect()
        })
        .collect();

    let joined = first.tracks.iter().filter(|track| {
        others
            .iter()
            .all(|ids| ids.contains(track.get(TrackField::Id)))
    });

    dedup_first_by(joined, |track| track.get(TrackField::Id))
        .into_iter()
        .cloned()
        .collect()
}

/// Which side(s) of a fuzzy intersection a row came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    Both,
    /// Only in the first playlist, carrying its display label
    OnlyA(String),
    /// Only in the second playlist, carrying its display label
    OnlyB(String),
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::Both => write!(f, "{BOTH_SOURCES}"),
            MatchSource::OnlyA(label) => write!(f, "[A] {label}"),
            MatchSource::OnlyB(label) => write!(f, "[B] {label}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatchRow {
    pub match_key: String,
    pub source: MatchSource,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub id: String,
}

impl FuzzyMatchRow {
    fn new(match_key: &str, source: MatchSource, track: &TrackRecord) -> Self {
        Self {
            match_key: match_key.to_string(),
            source,
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            id: track.id.clone(),
        }
    }
}

impl Tabular for FuzzyMatchRow {
    fn headers() -> &'static [&'static str] {
        &["match_key", "source", "title", "artist", "album", "id"]
    }

    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.match_key.as_str()),
            Cow::Owned(self.source.to_string()),
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.artist.as_str()),
            Cow::Borrowed(self.album.as_str()),
            Cow::Borrowed(self.id.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyIntersection {
    pub rows: Table<FuzzyMatchRow>,
    /// Distinct normalized titles present in both playlists
    pub matched_keys: usize,
}

/// Intersect two playlists on normalized title.
///
/// For every shared key, ids present on both sides are emitted once as
/// [`MatchSource::Both`] (using `a`'s record), followed by `a`'s other
/// versions and then `b`'s. Keys are visited in ascending order.
pub fn fuzzy_intersection(a: &PlaylistCollection, b: &PlaylistCollection) -> FuzzyIntersection {
    let groups_a = group_by(&a.tracks, |track| normalize_title(&track.title));
    let groups_b = group_by(&b.tracks, |track| normalize_title(&track.title));
    let (label_a, label_b) = (a.label(), b.label());

    let mut result = FuzzyIntersection::default();
    for (key, sub_a) in &groups_a {
        let Some(sub_b) = groups_b.get(key) else {
            continue;
        };
        result.matched_keys += 1;

        let ids_a: HashSet<&str> = sub_a.iter().map(|track| track.id.as_str()).collect();
        let ids_b: HashSet<&str> = sub_b.iter().map(|track| track.id.as_str()).collect();

        let shared = sub_a
            .iter()
            .copied()
            .filter(|track| ids_b.contains(track.id.as_str()));
        for track in dedup_first_by(shared, |track| track.id.as_str()) {
            result
                .rows
                .push(FuzzyMatchRow::new(key, MatchSource::Both, track));
        }

        for track in sub_a
            .iter()
            .filter(|track| !ids_b.contains(track.id.as_str()))
        {
            result
                .rows
                .push(FuzzyMatchRow::new(key, MatchSource::OnlyA(label_a.clone()), track));
        }

        for track in sub_b
            .iter()
            .filter(|track| !ids_a.contains(track.id.as_str()))
        {
            result
                .rows
                .push(FuzzyMatchRow::new(key, MatchSource::OnlyB(label_b.clone()), track));
        }
    }
    result
}
