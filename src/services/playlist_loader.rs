use std::path::PathBuf;
use std::str::FromStr;

use color_eyre::eyre::{Result, WrapErr};

use crate::export::import_playlist;
use crate::ports::playlist::{InvalidPlaylistRef, PlaylistId, PlaylistSource};
use crate::reconcile::PlaylistCollection;
use crate::services::progress::ConsoleProgress;

/// A playlist named on the command line: either something on the streaming
/// service or a CSV file previously written by `fetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistRef {
    Remote(PlaylistId),
    File(PathBuf),
}

impl FromStr for PlaylistRef {
    type Err = InvalidPlaylistRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = PathBuf::from(s);
        let is_csv = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            return Ok(PlaylistRef::File(path));
        }
        PlaylistId::parse(s).map(PlaylistRef::Remote)
    }
}

/// Resolve one reference into a collection.
pub async fn load_playlist(
    source: &dyn PlaylistSource,
    playlist: &PlaylistRef,
) -> Result<PlaylistCollection> {
    match playlist {
        PlaylistRef::Remote(id) => {
            let progress = ConsoleProgress::new(id.to_string());
            source
                .fetch_playlist(id, &progress)
                .await
                .wrap_err_with(|| format!("Failed to fetch playlist {}", id))
        }
        PlaylistRef::File(path) => import_playlist(path),
    }
}

/// Resolve every reference, fetching remote playlists concurrently.
///
/// Fails as a whole if any single playlist cannot be loaded.
pub async fn load_playlists(
    source: &dyn PlaylistSource,
    playlists: &[PlaylistRef],
) -> Result<Vec<PlaylistCollection>> {
    let collections = futures::future::try_join_all(
        playlists
            .iter()
            .map(|playlist| load_playlist(source, playlist)),
    )
    .await?;

    for collection in &collections {
        if collection.is_empty() {
            log::warn!("Playlist \"{}\" has no tracks", collection.name);
        } else {
            log::info!(
                "Loaded playlist \"{}\" with {} tracks",
                collection.name,
                collection.len()
            );
        }
    }
    Ok(collections)
}
