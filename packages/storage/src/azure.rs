//! Azure Blob Storage backend built on `object_store`.

use std::path::Path as FsPath;
use std::sync::Arc;

use futures::TryStreamExt as _;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload, RetryConfig};

use crate::backend::{DeleteFailure, ObjectStorageBackend};
use crate::config::AzureConfig;
use crate::error::StorageError;

/// The blob batch API caps a batch at 256 subrequests; individual deletes
/// are grouped to the same ceiling so a chunk maps to one provider batch.
const AZURE_DELETE_BATCH_CAP: usize = 256;

/// Azure Blob Storage backend.
pub struct AzureBackend {
    store: Arc<dyn ObjectStore>,
    container: String,
}

impl AzureBackend {
    /// Creates a backend from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Client`] when the blob client cannot be
    /// constructed.
    pub fn new(config: &AzureConfig) -> Result<Self, StorageError> {
        let store = MicrosoftAzureBuilder::new()
            .with_account(&config.account_name)
            .with_access_key(&config.account_key)
            .with_container_name(&config.container)
            .with_retry(RetryConfig::default())
            .build()
            .map_err(|e| StorageError::Client {
                backend: "azure",
                source: Box::new(e),
            })?;

        Ok(Self {
            store: Arc::new(store),
            container: config.container.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStorageBackend for AzureBackend {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn location(&self) -> &str {
        &self.container
    }

    fn max_delete_batch(&self) -> usize {
        AZURE_DELETE_BATCH_CAP
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let path = Path::from(prefix.trim_end_matches('/'));
        let objects: Vec<object_store::ObjectMeta> = self
            .store
            .list(Some(&path))
            .try_collect()
            .await
            .map_err(|e| StorageError::List {
                location: self.container.clone(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

        Ok(objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect())
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StorageError> {
        // Blobs within a chunk are deleted concurrently; a blob that is
        // already gone is the desired end state, not a failure.
        let results = futures::future::join_all(keys.iter().map(|key| async move {
            match self.store.delete(&Path::from(key.as_str())).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => None,
                Err(e) => Some(DeleteFailure {
                    key: key.clone(),
                    message: e.to_string(),
                }),
            }
        }))
        .await;

        Ok(results.into_iter().flatten().collect())
    }

    async fn put_file(&self, key: &str, local_path: &FsPath) -> Result<(), StorageError> {
        let data = tokio::fs::read(local_path).await?;

        self.store
            .put(&Path::from(key), PutPayload::from(data))
            .await
            .map_err(|e| StorageError::Upload {
                location: self.container.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(())
    }
}
