//! Sentifl client library.
//!
//! Talks to the Sentifl blogging backend and its music-generation service:
//! user search and follow state, profile image upload, aggregation of a
//! user's paged posts, and song generation from a selected post.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod music;
pub mod navigation;
pub mod posts;
pub mod profile;
pub mod s3;
pub mod session;
pub mod users;

pub use error::{ClientError, ClientResult};
