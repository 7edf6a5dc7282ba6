//! The backend abstraction shared by every sync phase.

use std::path::Path;

use crate::error::StorageError;

/// A single object whose deletion failed within a bulk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// Object key that could not be deleted.
    pub key: String,
    /// Backend-reported error message.
    pub message: String,
}

/// Operations the sync engine needs from an object store.
///
/// Implementations must be safe to share across concurrent workers: the
/// delete and upload phases fan calls out over one handle.
#[async_trait::async_trait]
pub trait ObjectStorageBackend: Send + Sync {
    /// Short provider name for logs (`"s3"`, `"azure"`).
    fn name(&self) -> &'static str;

    /// Bucket or container name, for logs and error context.
    fn location(&self) -> &str;

    /// Provider-imposed maximum number of keys per bulk-delete call.
    fn max_delete_batch(&self) -> usize;

    /// Lists every object key under `prefix`, paginating until exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] when the remote enumeration fails.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Deletes up to [`max_delete_batch`](Self::max_delete_batch) keys in
    /// one call, returning the per-key failures. Benign "already gone"
    /// outcomes are classified out before aggregation and never reported.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] when the call fails as a whole and
    /// no per-key outcome is available.
    async fn delete_batch(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StorageError>;

    /// Uploads a local file to `key`, overwriting any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Upload`] on remote failure or
    /// [`StorageError::Io`] when the local file cannot be read.
    async fn put_file(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;
}

/// Provider error codes that mean "the object was already gone" during a
/// delete. Deleting an absent key is the desired end state, not a failure.
const BENIGN_DELETE_CODES: &[&str] = &["NoSuchKey", "NotFound", "BlobNotFound"];

/// Whether a backend delete error code maps to an ignored outcome.
#[must_use]
pub fn is_benign_delete_code(code: &str) -> bool {
    BENIGN_DELETE_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_codes_are_benign() {
        assert!(is_benign_delete_code("NoSuchKey"));
        assert!(is_benign_delete_code("NotFound"));
        assert!(is_benign_delete_code("BlobNotFound"));
    }

    #[test]
    fn real_failures_are_not_benign() {
        assert!(!is_benign_delete_code("AccessDenied"));
        assert!(!is_benign_delete_code("InternalError"));
        assert!(!is_benign_delete_code(""));
    }
}
