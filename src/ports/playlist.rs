use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::reconcile::PlaylistCollection;

static ID_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id=([0-9]+)").expect("id pattern is valid"));

/// Numeric playlist identifier on the streaming service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaylistId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{input}` is neither a playlist id nor a link containing `id=<digits>`")]
pub struct InvalidPlaylistRef {
    pub input: String,
}

impl PlaylistId {
    /// Extract an id from a share link (`...playlist?id=123`) or a raw id.
    pub fn parse(input: &str) -> Result<Self, InvalidPlaylistRef> {
        if let Some(captures) = ID_QUERY.captures(input) {
            return Ok(Self(captures[1].to_string()));
        }
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self(input.to_string()));
        }
        Err(InvalidPlaylistRef {
            input: input.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PlaylistId {
    type Err = InvalidPlaylistRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observer for batched retrieval, called with `(completed, total)` track
/// counts before each batch and once more when the fetch is done.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressListener for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Listener that ignores progress.
#[cfg(test)]
pub struct NoProgress;

#[cfg(test)]
impl ProgressListener for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(#[from] reqwest::Error),
    #[error("API returned code {code} for playlist {id}")]
    Api { id: PlaylistId, code: i64 },
    #[error("API returned code {code}")]
    BadStatus { code: i64 },
    #[error("API returned no playlist data for {0}")]
    MissingPlaylist(PlaylistId),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(#[from] serde_json::Error),
    #[error("Invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Port for anything that can download a playlist snapshot.
///
/// Implementations live in `netease_rs` (production), `services::fetch_cache`
/// (memoizing wrapper) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn fetch_playlist<'p>(
        &self,
        id: &PlaylistId,
        progress: &'p (dyn ProgressListener + 'p),
    ) -> Result<PlaylistCollection, FetchError>;
}
