//! Profile image upload.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::s3::ObjectStore;
use crate::session::{Session, SessionStore};

/// Uploads a local image to the object store and makes it the viewer's
/// profile picture.
#[derive(Clone)]
pub struct ProfileUploader {
    api: ApiClient,
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ProfileUploader {
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            api,
            store,
            prefix: prefix.into(),
        }
    }

    fn profile_prefix(&self, uid: &str) -> String {
        format!("{}profile/{uid}/", self.prefix)
    }

    /// Upload `file` and record it as the profile image.
    ///
    /// The backend must confirm with 204; only then is the session updated
    /// and saved. The previous image is removed afterwards if it lives under
    /// this store's profile prefix.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` when no file is given, the file cannot be read,
    /// or nobody is logged in; otherwise the failing step's error.
    pub async fn upload(
        &self,
        file: Option<&Path>,
        session: &mut Session,
        session_store: &SessionStore,
    ) -> ClientResult<String> {
        let file = file.ok_or_else(|| ClientError::precondition("Please choose a file."))?;
        let uid = session
            .viewer_uid()
            .ok_or_else(|| ClientError::precondition("Please log in first."))?
            .to_string();

        let data = tokio::fs::read(file).await.map_err(|e| {
            ClientError::precondition(format!("Could not read {}: {e}", file.display()))
        })?;

        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| "profile".to_string(), sanitize_file_name);
        let key = format!(
            "{}{}-{file_name}",
            self.profile_prefix(&uid),
            Utc::now().format("%Y%m%d-%H%M%S")
        );
        let content_type = mime_guess::from_path(file)
            .first_or_octet_stream()
            .to_string();

        let url = self.store.put(&key, &data, &content_type).await?;

        let status = self.api.update_profile(&url).await?;
        if status != StatusCode::NO_CONTENT {
            warn!(status = %status, "Profile update not confirmed");
            return Err(ClientError::status(&self.api.url("/auth/profile"), status));
        }

        let previous = session.profile_image.replace(url.clone());
        if let Err(e) = session_store.save(session).await {
            warn!("Failed to persist profile image: {e:#}");
        }
        info!(uid = %uid, url = %url, "Profile image updated");

        if let Some(previous) = previous.filter(|p| *p != url) {
            self.remove_previous(&uid, &previous).await;
        }

        Ok(url)
    }

    async fn remove_previous(&self, uid: &str, previous: &str) {
        let Some(key) = self.store.key_for_url(previous) else {
            return;
        };
        if !key.starts_with(&self.profile_prefix(uid)) {
            return;
        }
        if let Err(e) = self.store.delete(&key).await {
            warn!(key = %key, "Failed to delete previous profile image: {e}");
        }
    }
}

impl std::fmt::Debug for ProfileUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUploader")
            .field("api", &self.api)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("me.png"), "me.png");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("프로필.png"), "___.png");
    }
}
