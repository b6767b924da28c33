//! Attachment object stores.
//!
//! - `HttpObjectStore`: S3/MinIO-style `PUT {endpoint}/{bucket}/{key}`
//! - `FilesystemObjectStore`: local directory, atomic temp-file + rename

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use grievance_core::{Error, ObjectStore, Result};

/// Generate an object key: a random UUID plus the original extension.
pub fn object_key(extension: &str) -> String {
    format!("{}{}", uuid::Uuid::new_v4(), extension)
}

// =============================================================================
// HTTP
// =============================================================================

pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    public_url: String,
}

impl HttpObjectStore {
    /// `public_url` is the base returned to clients; defaults to `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        public_url: Option<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let public_url = public_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.clone());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.into(),
            public_url,
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);
        let size = data.len();
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "db",
                component = "object_store",
                op = "put",
                status = status.as_u16(),
                "Object store rejected upload"
            );
            return Err(Error::Storage(format!(
                "object store returned {}: {}",
                status, body
            )));
        }

        debug!(subsystem = "db", component = "object_store", op = "put", object_size = size, key = %key, "Stored object");
        Ok(format!("{}/{}/{}", self.public_url, self.bucket, key))
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
}

impl FilesystemObjectStore {
    pub fn new(base_path: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::InvalidInput(format!("invalid object key: {}", key)));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let full_path = self.full_path(key)?;
        fs::create_dir_all(&self.base_path).await?;

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "object_store: File::create failed");
            e
        })?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        debug!(subsystem = "db", component = "object_store", op = "put", object_size = data.len(), key = %key, "Stored object on filesystem");
        Ok(format!("{}/{}", self.public_url, key))
    }
}
