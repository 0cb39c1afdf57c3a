//! Command handlers behind the CLI subcommands.
//!
//! Each handler loads its playlists, runs one reconciliation operation,
//! prints the result table to stdout and optionally exports it as CSV.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};

use crate::config::Config;
use crate::export::{export_csv, playlist_file_name};
use crate::netease_rs::NeteaseClient;
use crate::ports::playlist::{PlaylistId, PlaylistSource};
use crate::reconcile::{self, MatchMode, PlaylistCollection, Tabular};
use crate::services::fetch_cache::{CachedSource, DiskCacheStore, MemoryCacheStore};
use crate::services::playlist_loader::{PlaylistRef, load_playlist, load_playlists};
use crate::services::progress::ConsoleProgress;

/// Build the retrieval stack: the NetEase client, wrapped in the fetch cache
/// unless caching is disabled.
pub fn build_source(config: &Config, no_cache: bool) -> Result<Box<dyn PlaylistSource>> {
    let client = NeteaseClient::new(config.netease_client_config()?);
    let ttl = config.cache_ttl()?;

    if no_cache || ttl.is_zero() {
        log::debug!("Fetch cache disabled");
        return Ok(Box::new(client));
    }

    match config.cache_directory_path() {
        Some(directory) => {
            log::debug!("Caching fetches in {} for {:?}", directory.display(), ttl);
            Ok(Box::new(CachedSource::new(
                client,
                DiskCacheStore::new(directory),
                ttl,
            )))
        }
        None => Ok(Box::new(CachedSource::new(
            client,
            MemoryCacheStore::new(),
            ttl,
        ))),
    }
}

/// One tab-separated line; tabs and line breaks inside fields become spaces.
fn tsv_line<'a>(fields: impl IntoIterator<Item = Cow<'a, str>>) -> String {
    fields
        .into_iter()
        .map(|field| field.replace(['\t', '\n', '\r'], " "))
        .collect::<Vec<_>>()
        .join("\t")
}

fn print_table<R: Tabular>(rows: &[R]) {
    println!(
        "{}",
        tsv_line(R::headers().iter().map(|header| Cow::Borrowed(*header)))
    );
    for row in rows {
        println!("{}", tsv_line(row.fields()));
    }
}

fn emit<R: Tabular>(rows: &[R], output: Option<&Path>) -> Result<()> {
    if !rows.is_empty() {
        print_table(rows);
    }
    if let Some(path) = output {
        export_csv(path, rows)?;
    }
    Ok(())
}

/// Download a playlist into `playlist_<name>.csv` under the configured
/// output directory.
pub async fn fetch(
    source: &dyn PlaylistSource,
    config: &Config,
    id: &PlaylistId,
) -> Result<PathBuf> {
    let progress = ConsoleProgress::new(id.to_string());
    let playlist = source
        .fetch_playlist(id, &progress)
        .await
        .wrap_err_with(|| format!("Failed to fetch playlist {}", id))?;

    let directory = config.output_directory_path();
    std::fs::create_dir_all(&directory)
        .wrap_err_with(|| format!("Failed to create output directory: {}", directory.display()))?;
    let path = directory.join(playlist_file_name(&playlist.name));
    export_csv(&path, &playlist.tracks)?;

    println!(
        "Saved \"{}\" ({} tracks) to {}",
        playlist.name,
        playlist.len(),
        path.display()
    );
    Ok(path)
}

pub async fn check(
    source: &dyn PlaylistSource,
    playlist: &PlaylistRef,
    output: Option<&Path>,
) -> Result<()> {
    let collection = load_playlist(source, playlist).await?;
    let report = reconcile::find_internal_duplicates(&collection);

    emit(report.rows.rows(), output)?;
    if report.groups == 0 {
        println!("No duplicate tracks in \"{}\"", collection.name);
    } else {
        println!(
            "Found {} groups of likely duplicates in \"{}\"",
            report.groups, collection.name
        );
    }
    Ok(())
}

pub async fn intersect(
    source: &dyn PlaylistSource,
    playlists: &[PlaylistRef],
    mode: MatchMode,
    output: Option<&Path>,
) -> Result<()> {
    if mode == MatchMode::Fuzzy && playlists.len() != 2 {
        bail!(
            "Fuzzy intersection takes exactly two playlists, got {}",
            playlists.len()
        );
    }
    let collections = load_playlists(source, playlists).await?;

    match mode {
        MatchMode::Fuzzy => {
            let result = reconcile::fuzzy_intersection(&collections[0], &collections[1]);
            emit(result.rows.rows(), output)?;
            if result.matched_keys == 0 {
                println!("No similar tracks found");
            } else {
                println!("Found {} titles in both playlists", result.matched_keys);
            }
        }
        MatchMode::Strict => {
            let joined = reconcile::strict_intersection(&collections);
            emit(joined.rows(), output)?;
            println!("{} tracks with identical ids", joined.len());
        }
    }
    Ok(())
}

pub async fn diff(
    source: &dyn PlaylistSource,
    a: &PlaylistRef,
    b: &PlaylistRef,
    mode: MatchMode,
    output: Option<&Path>,
) -> Result<()> {
    let collections = load_playlists(source, &[a.clone(), b.clone()]).await?;
    let [keep, remove] = collections.as_slice() else {
        bail!("Expected two playlists");
    };

    let result = reconcile::difference(keep, remove, mode);
    emit(result.rows(), output)?;
    println!(
        "{} tracks only in \"{}\" ({} match)",
        result.len(),
        keep.name,
        mode
    );
    Ok(())
}

pub async fn union(
    source: &dyn PlaylistSource,
    playlists: &[PlaylistRef],
    mode: MatchMode,
    output: Option<&Path>,
) -> Result<()> {
    let collections = load_playlists(source, playlists).await?;
    let total: usize = collections.iter().map(PlaylistCollection::len).sum();

    let merged = reconcile::union(&collections, mode);
    emit(merged.rows(), output)?;
    println!(
        "{} tracks after merging ({} before, {} match)",
        merged.len(),
        total,
        mode
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::parse_csv;
    use crate::ports::playlist::{FetchError, MockPlaylistSource};
    use crate::reconcile::TrackRecord;

    fn record(id: &str, title: &str) -> TrackRecord {
        TrackRecord {
            id: id.into(),
            title: title.into(),
            artist: "Artist".into(),
            album: "Album".into(),
            duration: "03:00".into(),
        }
    }

    /// Playlist "1" holds Song + Song (Live), playlist "2" holds Song (id 3).
    fn source() -> MockPlaylistSource {
        let mut source = MockPlaylistSource::new();
        source
            .expect_fetch_playlist()
            .returning(|id, _| match id.as_str() {
                "1" => Ok(PlaylistCollection::new(
                    "One/Two",
                    vec![record("1", "Song"), record("2", "Song (Live)")],
                )),
                "2" => Ok(PlaylistCollection::new("Other", vec![record("3", "song")])),
                _ => Err(FetchError::MissingPlaylist(id.clone())),
            });
        source
    }

    fn remote(id: &str) -> PlaylistRef {
        PlaylistRef::Remote(PlaylistId::parse(id).unwrap())
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        parse_csv(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_writes_sanitized_csv() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = toml::from_str(&format!(
            "output_directory = {:?}",
            dir.path().join("out").to_str().unwrap()
        ))
        .unwrap();

        let path = fetch(&source(), &config, &PlaylistId::parse("1").unwrap())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "playlist_One_Two.csv");
        let rows = read_rows(&path);
        assert_eq!(rows[0], vec!["id", "title", "artist", "album", "duration"]);
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_check_exports_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dupes.csv");

        check(&source(), &remote("1"), Some(&output)).await.unwrap();

        let rows = read_rows(&output);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "song");
        assert_eq!(rows[2][1], "Song (Live)");
    }

    #[tokio::test]
    async fn test_fuzzy_intersect_exports_tagged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("intersection.csv");

        intersect(
            &source(),
            &[remote("1"), remote("2")],
            MatchMode::Fuzzy,
            Some(&output),
        )
        .await
        .unwrap();

        let rows = read_rows(&output);
        assert_eq!(rows[0], vec!["match_key", "source", "title", "artist", "album", "id"]);
        let sources: Vec<_> = rows[1..].iter().map(|row| row[1].as_str()).collect();
        assert_eq!(sources, vec!["[A] One/Two", "[A] One/Two", "[B] Other"]);
    }

    #[tokio::test]
    async fn test_fuzzy_intersect_needs_two_playlists() {
        let result = intersect(
            &source(),
            &[remote("1"), remote("2"), remote("1")],
            MatchMode::Fuzzy,
            None,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_diff_and_union_exports() {
        let dir = tempfile::tempdir().unwrap();
        let diff_path = dir.path().join("diff.csv");
        let union_path = dir.path().join("union.csv");

        diff(
            &source(),
            &remote("1"),
            &remote("2"),
            MatchMode::Strict,
            Some(&diff_path),
        )
        .await
        .unwrap();
        union(
            &source(),
            &[remote("2"), remote("1")],
            MatchMode::Fuzzy,
            Some(&union_path),
        )
        .await
        .unwrap();

        assert_eq!(read_rows(&diff_path).len(), 3);
        let union_rows = read_rows(&union_path);
        assert_eq!(union_rows.len(), 2);
        assert_eq!(union_rows[1][0], "3");
    }

    #[test]
    fn test_tsv_line_keeps_one_row_per_record() {
        let line = tsv_line([
            Cow::Borrowed("1"),
            Cow::Borrowed("Two\nLines"),
            Cow::Borrowed("tab\there\r\n"),
        ]);
        assert_eq!(line, "1\tTwo Lines\ttab here  ");
        assert_eq!(line.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let result = check(&source(), &remote("999"), None).await;
        let error = result.unwrap_err();
        assert!(format!("{:?}", error).contains("Failed to fetch playlist 999"));
    }
}
