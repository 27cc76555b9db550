use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A user as returned by search and follow listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub uid: String,
    #[serde(default)]
    pub nick_name: String,
    #[serde(default)]
    pub profile: Option<String>,
    /// Relative to the viewing user. Only meaningful after a search has
    /// cross-referenced the viewer's follow list.
    #[serde(default)]
    pub is_following: bool,
}

/// Wrapper used by the follow listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub content: Vec<UserRecord>,
}

/// One entry of a user's post listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub post_id: i64,
    /// Where the title and body live.
    pub post_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Empty when the backend sent none; such posts sort last.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_time: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

impl PostSummary {
    /// Parsed creation time.
    ///
    /// The backend sends either RFC 3339 or a zone-less local date-time;
    /// the latter is taken as UTC.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_time)
    }
}

/// One page of `GET /post/{uid}`.
///
/// Items stay raw so that one malformed entry does not cost the whole page;
/// see [`PostPage::into_posts`].
#[derive(Debug, Clone, Deserialize)]
pub struct PostPage {
    pub content: Vec<serde_json::Value>,
    /// Continuation flag: true on the final page.
    #[serde(default)]
    pub last: bool,
}

impl PostPage {
    /// Decode each item, returning the posts and the items that were rejected
    /// along with the reason.
    #[must_use]
    pub fn into_posts(self) -> (Vec<PostSummary>, Vec<(serde_json::Value, String)>) {
        let mut posts = Vec::with_capacity(self.content.len());
        let mut rejected = Vec::new();
        for item in self.content {
            match PostSummary::deserialize(&item) {
                Ok(post) => posts.push(post),
                Err(e) => rejected.push((item, e.to_string())),
            }
        }
        (posts, rejected)
    }
}

/// Title and body of a post, fetched from its `post_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}
