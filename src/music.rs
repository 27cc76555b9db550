//! Music generation from a selected post.
//!
//! The generation service lives at its own base address. One request may be
//! in flight at a time; the [`TaskGuard`] rejects overlapping submissions.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{read_json, PostSummary};
use crate::error::{ClientError, ClientResult};
use crate::guard::TaskGuard;
use crate::navigation::{Route, SongResult};
use crate::session::Session;

/// Error code the generation service uses when its search index failed.
const SEARCH_INDEX_ERROR: &str = "CE1";

#[derive(Serialize)]
struct CreateMusicRequest<'a> {
    user_id: &'a str,
    post_url: &'a str,
    token: &'a str,
}

/// What the generation service returns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MusicResult {
    #[serde(rename = "url")]
    pub music_url: String,
    pub emotion1: String,
    pub emotion2: String,
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
}

/// Post selection plus the generation request.
#[derive(Debug, Clone)]
pub struct MusicRequestFlow {
    http: reqwest::Client,
    base_url: String,
    guard: TaskGuard,
    selected: Option<i64>,
}

impl MusicRequestFlow {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            guard: TaskGuard::new(),
            selected: None,
        }
    }

    /// Select the post to generate from, replacing any earlier selection.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if `post_id` is not among `posts`.
    pub fn select(&mut self, posts: &[PostSummary], post_id: i64) -> ClientResult<()> {
        if !posts.iter().any(|p| p.post_id == post_id) {
            return Err(ClientError::precondition(format!(
                "Post {post_id} is not in the list."
            )));
        }
        self.selected = Some(post_id);
        Ok(())
    }

    #[must_use]
    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    /// True while a generation request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Handle to the in-flight guard, for showing a loading state elsewhere.
    #[must_use]
    pub fn guard(&self) -> &TaskGuard {
        &self.guard
    }

    /// Ask the generation service for a song based on the selected post.
    ///
    /// On success returns the route to the result view.
    ///
    /// # Errors
    ///
    /// `Precondition` without a selection or credential, `Busy` while another
    /// request runs (no request is sent in either case), otherwise the
    /// transport, status or decode failure.
    pub async fn generate(&self, posts: &[PostSummary], session: &Session) -> ClientResult<Route> {
        let post = self
            .selected
            .and_then(|id| posts.iter().find(|p| p.post_id == id))
            .ok_or_else(|| ClientError::precondition("Please select a post to make a song from."))?;

        let (Some(token), Some(uid)) = (session.token(), session.viewer_uid()) else {
            return Err(ClientError::precondition("Please log in first."));
        };

        let Some(_permit) = self.guard.try_acquire() else {
            warn!(post_id = post.post_id, "Music generation already in progress");
            return Err(ClientError::Busy);
        };

        info!(post_id = post.post_id, uid = %uid, "Requesting music generation");
        let result = self.request(uid, &post.post_url, token).await?;

        info!(post_id = post.post_id, title = %result.title, "Music generated");
        Ok(Route::SongResult(SongResult {
            title: result.title,
            emotion1: result.emotion1,
            emotion2: result.emotion2,
            music_url: result.music_url,
            post_id: post.post_id,
        }))
    }

    async fn request(&self, uid: &str, post_url: &str, token: &str) -> ClientResult<MusicResult> {
        let url = format!("{}/create/music", self.base_url);
        let body = CreateMusicRequest {
            user_id: uid,
            post_url,
            token,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, "Failed to reach music service: {e}");
                ClientError::transport(&url, e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail: ServiceError = response.json().await.unwrap_or_default();
            if detail.error_code.as_deref() == Some(SEARCH_INDEX_ERROR) {
                error!(status = %status, "Music service search index request failed");
            } else {
                error!(status = %status, "Music service returned an error");
            }
            return Err(ClientError::status(&url, status));
        }

        let result: MusicResult = read_json(&url, response).await?;

        if result.music_url.trim().is_empty() {
            return Err(ClientError::decode(&url, "empty music url"));
        }
        Ok(result)
    }
}
