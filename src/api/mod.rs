//! Typed access to the blogging backend's REST endpoints.

pub mod models;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

pub use models::{PostContent, PostPage, PostSummary, UserList, UserRecord};

const USER_AGENT: &str = concat!("sentifl-client/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct FollowRequest<'a> {
    uid: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdate<'a> {
    profile_url: &'a str,
}

/// HTTP client bound to the backend base URL and the session's credential.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client from configuration, carrying the session's credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config, session: &Session) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_http(http, &config.api_base_url, session))
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: &str, session: &Session) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: session.token().map(ToString::to_string),
        }
    }

    /// The shared HTTP client, for talking to other services.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve a path against the base URL. Absolute URLs pass through.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> ClientResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ClientError::transport(url, e))?;

        let status = response.status();
        trace!(url = %url, status = %status, "Backend response");
        if !status.is_success() {
            return Err(ClientError::status(url, status));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.send(&url, self.http.get(&url).query(query)).await?;
        read_json(&url, response).await
    }

    /// `GET /auth/user/search?keyword=&lastId=0`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad body.
    pub async fn search_users(&self, keyword: &str) -> ClientResult<Vec<UserRecord>> {
        debug!(keyword = %keyword, "Searching users");
        self.get_json(
            "/auth/user/search",
            &[("keyword", keyword.to_string()), ("lastId", "0".to_string())],
        )
        .await
    }

    /// Users that follow `uid`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad body.
    pub async fn followers(&self, uid: &str) -> ClientResult<Vec<UserRecord>> {
        let list: UserList = self.get_json(&format!("/followedby/{uid}"), &[]).await?;
        Ok(list.content)
    }

    /// Users that `uid` follows.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad body.
    pub async fn following(&self, uid: &str) -> ClientResult<Vec<UserRecord>> {
        let list: UserList = self.get_json(&format!("/follow/{uid}"), &[]).await?;
        Ok(list.content)
    }

    /// `POST /follow {uid}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn follow(&self, uid: &str) -> ClientResult<()> {
        let url = self.url("/follow");
        self.send(&url, self.http.post(&url).json(&FollowRequest { uid }))
            .await?;
        Ok(())
    }

    /// `DELETE /follow {uid}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn unfollow(&self, uid: &str) -> ClientResult<()> {
        let url = self.url("/follow");
        self.send(&url, self.http.delete(&url).json(&FollowRequest { uid }))
            .await?;
        Ok(())
    }

    /// `PUT /auth/profile {profileUrl}`, returning the success status.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn update_profile(&self, profile_url: &str) -> ClientResult<StatusCode> {
        let url = self.url("/auth/profile");
        let response = self
            .send(&url, self.http.put(&url).json(&ProfileUpdate { profile_url }))
            .await?;
        Ok(response.status())
    }

    /// One page of `uid`'s posts.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// whose `content` is not a list.
    pub async fn post_page(&self, uid: &str, page: u32, size: u32) -> ClientResult<PostPage> {
        self.get_json(
            &format!("/post/{uid}"),
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
    }

    /// Title and body stored at a post's content URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad body.
    pub async fn post_content(&self, post_url: &str) -> ClientResult<PostContent> {
        self.get_json(post_url, &[]).await
    }
}

/// Read a response body in full and decode it as JSON.
///
/// A body cut short is a transport failure; only a complete body that does
/// not parse is a decode failure.
pub(crate) async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> ClientResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::transport(url, e))?;
    serde_json::from_slice(&body).map_err(|e| ClientError::decode(url, e.to_string()))
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
