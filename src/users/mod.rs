//! User search, follow state and the viewer's profile summary.

pub mod debounce;

use std::collections::HashSet;

use tracing::{debug, info};

use crate::api::{ApiClient, UserRecord};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

pub use debounce::{QuerySender, SearchDebouncer};

/// Marker in the backend's stock avatar reference.
const DEFAULT_PROFILE_MARKER: &str = "default_profile.jpeg";

/// What the user panel shows about the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub uid: String,
    pub nickname: Option<String>,
    /// `None` when the user still has the stock avatar.
    pub profile_image: Option<String>,
    pub follower_count: usize,
    pub following_count: usize,
}

/// Search results with follow state relative to the viewer.
#[derive(Debug)]
pub struct UserDirectory {
    api: ApiClient,
    viewer_uid: Option<String>,
    results: Vec<UserRecord>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(api: ApiClient, session: &Session) -> Self {
        Self {
            api,
            viewer_uid: session.viewer_uid().map(ToString::to_string),
            results: Vec::new(),
        }
    }

    /// Current results.
    #[must_use]
    pub fn results(&self) -> &[UserRecord] {
        &self.results
    }

    /// Run a search and replace the current results.
    ///
    /// An empty query clears the results without a request. When the viewer
    /// is logged in, their own record is dropped and the follow list is
    /// fetched again to annotate each result.
    ///
    /// # Errors
    ///
    /// Returns an error if the search or the follow list request fails; the
    /// previous results are kept in that case.
    pub async fn search(&mut self, query: &str) -> ClientResult<&[UserRecord]> {
        let query = query.trim();
        if query.is_empty() {
            self.results.clear();
            return Ok(&self.results);
        }

        let mut found = self.api.search_users(query).await?;

        if let Some(viewer) = self.viewer_uid.as_deref() {
            found.retain(|user| user.uid != viewer);

            let following = self.api.following(viewer).await?;
            let followed: HashSet<&str> = following.iter().map(|u| u.uid.trim()).collect();
            for user in &mut found {
                user.is_following = followed.contains(user.uid.trim());
            }
        }

        debug!(query = %query, results = found.len(), "User search complete");
        self.results = found;
        Ok(&self.results)
    }

    /// Follow or unfollow `uid` depending on its current state, then flip
    /// that entry locally. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; local state is unchanged.
    pub async fn toggle_follow(&mut self, uid: &str, is_following: bool) -> ClientResult<bool> {
        if is_following {
            self.api.unfollow(uid).await?;
        } else {
            self.api.follow(uid).await?;
        }

        let now_following = !is_following;
        for user in self.results.iter_mut().filter(|u| u.uid == uid) {
            user.is_following = now_following;
        }

        info!(uid = %uid, following = now_following, "Follow state changed");
        Ok(now_following)
    }

    /// Profile image and follow counts for the logged-in viewer.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` when nobody is logged in, or the first failing
    /// request's error.
    pub async fn profile_summary(&self, session: &Session) -> ClientResult<ProfileSummary> {
        let uid = self
            .viewer_uid
            .as_deref()
            .ok_or_else(|| ClientError::precondition("Please log in first."))?;

        let matches = self.api.search_users(uid).await?;
        let own = matches
            .iter()
            .find(|u| u.uid == uid)
            .or_else(|| matches.first());

        let profile_image = own
            .and_then(|u| u.profile.clone())
            .or_else(|| session.profile_image.clone())
            .filter(|p| !p.is_empty() && !p.contains(DEFAULT_PROFILE_MARKER));

        let follower_count = self.api.followers(uid).await?.len();
        let following_count = self.api.following(uid).await?.len();

        Ok(ProfileSummary {
            uid: uid.to_string(),
            nickname: session
                .nickname
                .clone()
                .or_else(|| own.map(|u| u.nick_name.clone())),
            profile_image,
            follower_count,
            following_count,
        })
    }
}
