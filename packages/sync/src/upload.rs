//! Concurrent upload orchestrator.
//!
//! Uploads every transfer unit under bounded concurrency with overwrite
//! semantics. A single file's failure never aborts the rest: every file is
//! attempted, and the full success/failure partition is returned as data.

use futures::StreamExt as _;
use lakesync_storage::ObjectStorageBackend;

use crate::SyncOptions;
use crate::local::TransferUnit;

/// Per-file outcomes of the upload phase.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Destination keys uploaded successfully.
    pub succeeded: Vec<String>,
    /// Destination keys that failed, with their error messages.
    pub failed: Vec<(String, String)>,
}

impl UploadReport {
    /// Whether every file was delivered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of files attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Uploads all units to the backend. Infallible by design: upload errors
/// are data collected into the report, not exceptions.
pub async fn execute(
    backend: &dyn ObjectStorageBackend,
    units: &[TransferUnit],
    options: &SyncOptions,
    dataset: &str,
) -> UploadReport {
    if units.is_empty() {
        log::info!("[{dataset}] No files found to upload");
        return UploadReport::default();
    }

    log::info!(
        "[{dataset}] Uploading {} file(s) to {} ({}) with {} worker(s)...",
        units.len(),
        backend.location(),
        backend.name(),
        options.upload_workers
    );

    let outcomes: Vec<(String, Option<String>)> =
        futures::stream::iter(units.iter().map(|unit| async move {
            let result = tokio::time::timeout(
                options.request_timeout,
                backend.put_file(&unit.destination_key, &unit.local_path),
            )
            .await;

            let error = match result {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("upload timed out".to_string()),
            };
            (unit.destination_key.clone(), error)
        }))
        .buffer_unordered(options.upload_workers.max(1))
        .collect()
        .await;

    let mut report = UploadReport::default();
    for (key, error) in outcomes {
        match error {
            None => report.succeeded.push(key),
            Some(message) => {
                log::error!("[{dataset}] Upload of '{key}' failed: {message}");
                report.failed.push((key, message));
            }
        }
    }

    log::info!(
        "[{dataset}] Upload finished on {}: {} sent, {} error(s)",
        backend.name(),
        report.succeeded.len(),
        report.failed.len()
    );
    if !report.failed.is_empty() {
        log::warn!(
            "[{dataset}] Files that failed to upload: {:?}",
            report.failed.iter().map(|(key, _)| key).collect::<Vec<_>>()
        );
    }

    report
}
