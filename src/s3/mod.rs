//! Object storage for uploaded profile images.

use anyhow::{Context, Result};
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// Somewhere uploaded files can be put and later removed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> ClientResult<String>;

    /// Remove the object under `key`.
    async fn delete(&self, key: &str) -> ClientResult<()>;

    /// The key behind a public URL produced by this store, if it is one.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3Client {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3Client {
    /// Create a client from configuration, or `None` when no bucket is set.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the bucket handle
    /// cannot be created.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(bucket_name) = config.s3_bucket.as_deref() else {
            return Ok(None);
        };

        let access_key = std::env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID not set")?;
        let secret_key =
            std::env::var("AWS_SECRET_ACCESS_KEY").context("AWS_SECRET_ACCESS_KEY not set")?;

        let credentials = Credentials::new(Some(&access_key), Some(&secret_key), None, None, None)
            .context("Failed to create S3 credentials")?;

        let region = if let Some(ref endpoint) = config.s3_endpoint {
            Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            }
        } else {
            config.s3_region.parse().unwrap_or(Region::UsEast1)
        };

        let bucket =
            Bucket::new(bucket_name, region, credentials).context("Failed to create S3 bucket")?;

        // Use path-style for custom endpoints (MinIO, R2, etc.)
        let bucket = if config.s3_endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };

        let public_base = public_base(config, bucket_name);
        Ok(Some(Self {
            bucket,
            public_base,
        }))
    }

    /// Public URL for an object key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> ClientResult<String> {
        debug!(key = %key, content_type = %content_type, size = data.len(), "Uploading to S3");

        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| ClientError::Storage(format!("upload of {key} failed: {e}")))?;

        let code = response.status_code();
        if !(200..300).contains(&code) {
            return Err(ClientError::Storage(format!(
                "upload of {key} returned status {code}"
            )));
        }

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> ClientResult<()> {
        debug!(key = %key, "Deleting S3 object");

        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| ClientError::Storage(format!("delete of {key} failed: {e}")))?;

        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(ToString::to_string)
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("bucket", &self.bucket.name())
            .field("public_base", &self.public_base)
            .finish()
    }
}

fn public_base(config: &Config, bucket: &str) -> String {
    if let Some(base) = config.s3_public_url.as_deref() {
        return base.trim_end_matches('/').to_string();
    }
    match config.s3_endpoint.as_deref() {
        Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.amazonaws.com"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_base_variants() {
        let mut config = Config::for_testing();
        assert_eq!(
            public_base(&config, "media"),
            "https://media.s3.amazonaws.com"
        );

        config.s3_endpoint = Some("http://minio:9000/".to_string());
        assert_eq!(public_base(&config, "media"), "http://minio:9000/media");

        config.s3_public_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(public_base(&config, "media"), "https://cdn.example.com");
    }

    #[test]
    fn test_no_bucket_means_no_client() {
        let config = Config::for_testing();
        assert!(S3Client::from_config(&config).unwrap().is_none());
    }
}
