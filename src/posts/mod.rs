//! A user's posts: aggregation across backend pages, lazy content
//! resolution, and local pagination for display.

pub mod aggregate;
pub mod content;
pub mod pager;

pub use aggregate::{fetch_all_posts, sort_newest_first, Aggregated};
pub use content::{ContentResolver, TITLE_PLACEHOLDER};
pub use pager::PostPager;
