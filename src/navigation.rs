//! Navigation targets produced by client flows.

use serde::{Deserialize, Serialize};

/// Result of a music generation, handed to the result view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongResult {
    pub title: String,
    pub emotion1: String,
    pub emotion2: String,
    pub music_url: String,
    pub post_id: i64,
}

/// Where the caller should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    UserBlog { uid: String },
    UserPlaylist { uid: String },
    PostDetail { uid: String, post_id: i64 },
    SongResult(SongResult),
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::UserBlog { uid } => format!("/user/{uid}/blog"),
            Self::UserPlaylist { uid } => format!("/user/{uid}/playlist"),
            Self::PostDetail { uid, post_id } => format!("/user/{uid}/post/{post_id}"),
            Self::SongResult(_) => "/song-result".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let uid = "alice".to_string();
        assert_eq!(Route::UserBlog { uid: uid.clone() }.path(), "/user/alice/blog");
        assert_eq!(
            Route::UserPlaylist { uid: uid.clone() }.path(),
            "/user/alice/playlist"
        );
        assert_eq!(
            Route::PostDetail { uid, post_id: 42 }.path(),
            "/user/alice/post/42"
        );
    }
}
