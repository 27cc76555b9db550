use std::cmp::Reverse;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, PostSummary};
use crate::error::{ClientError, ClientResult};

/// Every post of one owner, newest first.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    pub posts: Vec<PostSummary>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
    /// False when a page failed and the walk stopped before the last page.
    pub complete: bool,
}

/// Fetch all of `owner`'s posts by walking the paged listing.
///
/// Pages are requested one after another, starting at 0, until a page
/// reports `last`. A non-success status (or a body without a post list)
/// stops the walk and keeps what was already collected. An empty
/// non-final page also stops the walk. Items that do not decode as posts
/// are logged and skipped; the rest of their page still counts.
///
/// # Errors
///
/// Returns `Precondition` for an empty owner and `Transport` if any request
/// fails to complete; nothing collected so far is returned in that case.
pub async fn fetch_all_posts(
    api: &ApiClient,
    owner: &str,
    page_size: u32,
) -> ClientResult<Aggregated> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(ClientError::precondition("No user selected."));
    }
    let page_size = page_size.max(1);

    let mut aggregated = Aggregated::default();
    let mut page = 0u32;

    loop {
        let result = api.post_page(owner, page, page_size).await;
        aggregated.pages_fetched += 1;

        match result {
            Ok(batch) => {
                let batch_len = batch.content.len();
                let last = batch.last;
                debug!(owner = %owner, page, batch_len, last, "Fetched post page");

                let (posts, rejected) = batch.into_posts();
                for (item, reason) in rejected {
                    warn!(owner = %owner, page, %item, "Skipping malformed post: {reason}");
                }
                aggregated.posts.extend(posts);

                if last {
                    aggregated.complete = true;
                    break;
                }
                if batch_len == 0 {
                    warn!(owner = %owner, page, "Empty page without continuation end, stopping");
                    break;
                }
                page += 1;
            }
            Err(e @ ClientError::Transport { .. }) => {
                warn!(owner = %owner, page, "Failed to fetch posts: {e}");
                return Err(e);
            }
            Err(e) => {
                warn!(owner = %owner, page, "Could not load posts: {e}");
                break;
            }
        }
    }

    sort_newest_first(&mut aggregated.posts);

    info!(
        owner = %owner,
        posts = aggregated.posts.len(),
        pages = aggregated.pages_fetched,
        complete = aggregated.complete,
        "Aggregated posts"
    );

    Ok(aggregated)
}

/// Sort by creation time, most recent first.
///
/// Equal timestamps keep their relative order. Posts whose timestamp cannot
/// be parsed go after all others.
pub fn sort_newest_first(posts: &mut [PostSummary]) {
    posts.sort_by_cached_key(|post| Reverse(post.created_at()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, created: &str) -> PostSummary {
        PostSummary {
            post_id: id,
            post_url: format!("https://bucket/posts/{id}.json"),
            thumbnail_url: None,
            created_time: created.to_string(),
            modified_time: None,
        }
    }

    fn ids(posts: &[PostSummary]) -> Vec<i64> {
        posts.iter().map(|p| p.post_id).collect()
    }

    #[test]
    fn test_sort_descending() {
        let mut posts = vec![
            post(1, "2024-01-01T00:00:00"),
            post(2, "2024-03-01T00:00:00"),
            post(3, "2024-02-01T00:00:00"),
        ];
        sort_newest_first(&mut posts);
        assert_eq!(ids(&posts), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut posts = vec![
            post(1, "2024-01-01T00:00:00"),
            post(2, "2024-05-05T10:00:00"),
            post(3, "2024-01-01T00:00:00"),
            post(4, "2024-05-05T10:00:00"),
            post(5, "2024-01-01T00:00:00"),
        ];
        sort_newest_first(&mut posts);
        assert_eq!(ids(&posts), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_unparsable_sorts_last() {
        let mut posts = vec![
            post(1, "garbage"),
            post(2, "2024-01-01T00:00:00"),
            post(3, ""),
            post(4, "2023-01-01T00:00:00Z"),
        ];
        sort_newest_first(&mut posts);
        assert_eq!(ids(&posts), vec![2, 4, 1, 3]);
    }

    #[tokio::test]
    async fn test_empty_owner_rejected() {
        let api = ApiClient::with_http(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            &crate::session::Session::default(),
        );
        let err = fetch_all_posts(&api, "  ", 5).await.unwrap_err();
        assert!(err.is_precondition());
    }
}
