//! Playlist reconciliation engine.
//!
//! Everything in here is pure: operations borrow playlist collections and
//! return freshly built tables. Matching runs under one of two policies,
//! see [`MatchMode`].

use std::borrow::Cow;

pub mod difference;
pub mod duplicates;
pub mod intersection;
pub mod normalize;
pub mod table;
pub mod track;
pub mod union;

pub use difference::difference;
pub use duplicates::find_internal_duplicates;
pub use intersection::{fuzzy_intersection, strict_intersection};
pub use normalize::normalize_title;
pub use table::Tabular;
pub use track::{PlaylistCollection, TrackField, TrackRecord, format_duration};
pub use union::union;

/// How two tracks are considered "the same song".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchMode {
    /// Same streaming-service track id
    Strict,
    /// Same normalized title, ignoring case and version annotations
    #[default]
    Fuzzy,
}

impl MatchMode {
    /// The equality key of `track` under this policy.
    pub fn key(self, track: &TrackRecord) -> Cow<'_, str> {
        match self {
            MatchMode::Strict => Cow::Borrowed(track.get(TrackField::Id)),
            MatchMode::Fuzzy => Cow::Owned(normalize_title(&track.title)),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Strict => write!(f, "strict"),
            MatchMode::Fuzzy => write!(f, "fuzzy"),
        }
    }
}
