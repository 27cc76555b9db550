use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, trace};

use crate::api::{ApiClient, PostContent, PostSummary};

/// Shown while a post's title is unresolved.
pub const TITLE_PLACEHOLDER: &str = "Loading title...";

/// Titles and bodies of posts, keyed by post id.
///
/// Entries are filled independently of the post listing. A post whose
/// content could not be fetched simply stays absent.
#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    contents: HashMap<i64, PostContent>,
}

impl ContentResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch content for every post not yet resolved.
    ///
    /// Requests run concurrently, one attempt each; failures are dropped.
    /// Returns how many posts were newly resolved.
    pub async fn resolve(&mut self, api: &ApiClient, posts: &[PostSummary]) -> usize {
        let pending: Vec<&PostSummary> = posts
            .iter()
            .filter(|post| !self.contents.contains_key(&post.post_id))
            .collect();

        if pending.is_empty() {
            return 0;
        }
        debug!(pending = pending.len(), "Resolving post contents");

        let results = join_all(pending.into_iter().map(|post| async move {
            (post.post_id, api.post_content(&post.post_url).await)
        }))
        .await;

        let mut resolved = 0;
        for (post_id, result) in results {
            match result {
                Ok(content) => {
                    self.contents.insert(post_id, content);
                    resolved += 1;
                }
                Err(e) => trace!(post_id, "Post content unavailable: {e}"),
            }
        }
        resolved
    }

    #[must_use]
    pub fn get(&self, post_id: i64) -> Option<&PostContent> {
        self.contents.get(&post_id)
    }

    #[must_use]
    pub fn is_resolved(&self, post_id: i64) -> bool {
        self.contents.contains_key(&post_id)
    }

    /// The post's title, or the placeholder while unresolved.
    #[must_use]
    pub fn title_or_placeholder(&self, post_id: i64) -> &str {
        self.get(post_id)
            .map(|c| c.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(TITLE_PLACEHOLDER)
    }
}
