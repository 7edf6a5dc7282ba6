//! In-memory backend for exercising the sync phases without a network.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use lakesync_storage::{DeleteFailure, ObjectStorageBackend, StorageError};

/// Object store stand-in backed by a key set, with injectable failures.
pub struct MockBackend {
    objects: Mutex<BTreeSet<String>>,
    /// Destination keys whose upload should fail.
    fail_uploads: BTreeSet<String>,
    /// When set, every key in every delete batch fails.
    fail_deletes: bool,
    /// When set, listing fails outright.
    fail_listing: bool,
    /// When set, listing never resolves.
    stall_listing: bool,
    max_delete_batch: usize,
    delete_calls: AtomicUsize,
    upload_attempts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(objects: impl IntoIterator<Item = String>) -> Self {
        Self {
            objects: Mutex::new(objects.into_iter().collect()),
            fail_uploads: BTreeSet::new(),
            fail_deletes: false,
            fail_listing: false,
            stall_listing: false,
            max_delete_batch: 1000,
            delete_calls: AtomicUsize::new(0),
            upload_attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_uploads(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.fail_uploads = keys.into_iter().collect();
        self
    }

    pub const fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub const fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub const fn with_stalled_listing(mut self) -> Self {
        self.stall_listing = true;
        self
    }

    pub const fn with_max_delete_batch(mut self, cap: usize) -> Self {
        self.max_delete_batch = cap;
        self
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn upload_attempts(&self) -> Vec<String> {
        self.upload_attempts.lock().unwrap().clone()
    }

    pub fn objects(&self) -> BTreeSet<String> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStorageBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn location(&self) -> &str {
        "mock-bucket"
    }

    fn max_delete_batch(&self) -> usize {
        self.max_delete_batch
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if self.stall_listing {
            std::future::pending::<()>().await;
        }
        if self.fail_listing {
            return Err(StorageError::List {
                location: "mock-bucket".to_string(),
                prefix: prefix.to_string(),
                source: "injected listing failure".into(),
            });
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Ok(keys
                .iter()
                .map(|key| DeleteFailure {
                    key: key.clone(),
                    message: "injected delete failure".to_string(),
                })
                .collect());
        }
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(Vec::new())
    }

    async fn put_file(&self, key: &str, _local_path: &Path) -> Result<(), StorageError> {
        self.upload_attempts.lock().unwrap().push(key.to_string());
        if self.fail_uploads.contains(key) {
            return Err(StorageError::Upload {
                location: "mock-bucket".to_string(),
                key: key.to_string(),
                source: "injected upload failure".into(),
            });
        }
        self.objects.lock().unwrap().insert(key.to_string());
        Ok(())
    }
}
