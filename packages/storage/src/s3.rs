//! S3-compatible backend built on the AWS SDK.

use std::path::Path;

use aws_config::Region;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::backend::{DeleteFailure, ObjectStorageBackend, is_benign_delete_code};
use crate::config::S3Config;
use crate::error::StorageError;

/// `DeleteObjects` accepts at most 1000 keys per request.
const S3_DELETE_BATCH_CAP: usize = 1000;

/// S3 (or S3-compatible) object storage backend.
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Backend {
    /// Creates a backend from validated configuration.
    #[must_use]
    pub fn new(config: &S3Config) -> Self {
        let creds = Credentials::new(&config.access_key, &config.secret_key, None, None, "lakesync");

        let sdk_config = aws_sdk_s3::Config::builder()
            .region(Region::new(config.region.clone()))
            .credentials_provider(creds)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStorageBackend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn location(&self) -> &str {
        &self.bucket
    }

    fn max_delete_batch(&self) -> usize {
        S3_DELETE_BATCH_CAP
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(|e| StorageError::List {
                location: self.bucket.clone(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

            for obj in output.contents() {
                if let Some(key) = obj.key() {
                    keys.push(key.to_string());
                }
            }

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StorageError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let to_storage_err = |e: Box<dyn std::error::Error + Send + Sync>| StorageError::Delete {
            location: self.bucket.clone(),
            count: keys.len(),
            source: e,
        };

        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let identifier = ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(|e| to_storage_err(Box::new(e)))?;
            objects.push(identifier);
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| to_storage_err(Box::new(e)))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| to_storage_err(Box::new(e)))?;

        // In quiet mode only failures come back. "Already gone" codes are
        // the desired end state and are classified out here.
        let failures = output
            .errors()
            .iter()
            .filter(|e| !e.code().is_some_and(is_benign_delete_code))
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_string(),
                message: format!(
                    "{}: {}",
                    e.code().unwrap_or("Unknown"),
                    e.message().unwrap_or("no message")
                ),
            })
            .collect();

        Ok(failures)
    }

    async fn put_file(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let data = tokio::fs::read(local_path).await?;
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                location: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(())
    }
}
