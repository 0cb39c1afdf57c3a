use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::netease_rs::types::{NeteaseSong, PlaylistDetailResponse, SongDetailResponse};
use crate::ports::playlist::{FetchError, PlaylistId, PlaylistSource, ProgressListener};
use crate::reconcile::{PlaylistCollection, TrackRecord};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const PLAYLIST_DETAIL_PATH: &str = "/api/v6/playlist/detail";
const SONG_DETAIL_PATH: &str = "/api/v3/song/detail";

/// Status code the API uses for success inside the JSON body
const API_OK: i64 = 200;

#[derive(Debug, Clone)]
pub struct NeteaseClientConfig {
    pub base_url: Url,
    /// Track ids per song detail request
    pub batch_size: NonZeroUsize,
    pub requests_per_second: NonZeroU32,
    pub request_timeout: Duration,
    /// Extra attempts for a request that failed at the transport level
    pub retries: usize,
}

/// NetEase Cloud Music API client
pub struct NeteaseClient {
    client: reqwest::Client,
    config: NeteaseClientConfig,
    rate_limiter: Arc<DirectRateLimiter>,
}

impl NeteaseClient {
    pub fn new(config: NeteaseClientConfig) -> Self {
        let quota = Quota::per_second(config.requests_per_second);
        Self {
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            config,
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = &self.config.base_url.join(path)?;

        let send = || async move {
            self.rate_limiter.until_ready().await;
            log::debug!("POST {}", url);
            let body = self
                .client
                .post(url.clone())
                .form(form)
                .timeout(self.config.request_timeout)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            Ok::<_, FetchError>(body)
        };

        let body = send
            .retry(ExponentialBuilder::default().with_max_times(self.config.retries))
            .when(|error| matches!(error, FetchError::FailedToSendRequest(_)))
            .notify(|error, delay| {
                log::warn!("Request to {} failed, retrying in {:?}: {}", path, delay, error)
            })
            .await?;

        Ok(serde_json::from_slice(&body)?)
    }

    async fn song_details(&self, ids: &[u64]) -> Result<Vec<NeteaseSong>, FetchError> {
        let c = serde_json::to_string(
            &ids.iter()
                .map(|id| serde_json::json!({ "id": id }))
                .collect::<Vec<_>>(),
        )?;
        let response: SongDetailResponse = self.post_form(SONG_DETAIL_PATH, &[("c", c)]).await?;
        if response.code != API_OK {
            return Err(FetchError::BadStatus {
                code: response.code,
            });
        }
        Ok(response.songs)
    }
}

#[async_trait::async_trait]
impl PlaylistSource for NeteaseClient {
    async fn fetch_playlist<'p>(
        &self,
        id: &PlaylistId,
        progress: &'p (dyn ProgressListener + 'p),
    ) -> Result<PlaylistCollection, FetchError> {
        log::debug!("Fetching playlist detail for {}", id);
        let detail: PlaylistDetailResponse = self
            .post_form(
                PLAYLIST_DETAIL_PATH,
                &[
                    ("id", id.as_str().to_owned()),
                    ("n", "100000".to_string()),
                    ("s", "8".to_string()),
                ],
            )
            .await?;

        if detail.code != API_OK {
            return Err(FetchError::Api {
                id: id.clone(),
                code: detail.code,
            });
        }
        let playlist = detail
            .playlist
            .ok_or_else(|| FetchError::MissingPlaylist(id.clone()))?;

        let track_ids: Vec<u64> = playlist.track_ids.iter().map(|track| track.id).collect();
        let total = track_ids.len();
        let batch_size = self.config.batch_size.get();
        log::debug!(
            "Playlist {} ({}) has {} tracks, fetching in batches of {}",
            id,
            playlist.name,
            total,
            batch_size
        );

        let mut tracks = Vec::with_capacity(total);
        for (index, chunk) in track_ids.chunks(batch_size).enumerate() {
            let completed = index * batch_size;
            progress.on_progress(completed, total);

            match self.song_details(chunk).await {
                Ok(songs) => tracks.extend(songs.into_iter().map(TrackRecord::from)),
                Err(error) => log::warn!(
                    "Skipping tracks {}..{} of playlist {}: {}",
                    completed,
                    completed + chunk.len(),
                    id,
                    error
                ),
            }
        }
        progress.on_progress(total, total);

        log::info!(
            "Fetched playlist {} ({}): {}/{} tracks",
            id,
            playlist.name,
            tracks.len(),
            total
        );
        Ok(PlaylistCollection::new(playlist.name, tracks))
    }
}
