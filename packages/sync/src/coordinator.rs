//! Backend sync coordinator.
//!
//! Runs the full pipeline per backend (scan local tree, list remote,
//! plan, delete, upload) and fans out across backends in parallel. Phase
//! errors are caught at this boundary, logged with backend and destination
//! context, and folded into a per-backend boolean; a failed backend fails
//! the aggregated outcome but never stops the others.

use std::path::Path;
use std::sync::Arc;

use lakesync_storage::ObjectStorageBackend;

use crate::delete::{self, DeleteReport};
use crate::error::SyncError;
use crate::lister;
use crate::local::LocalTree;
use crate::upload::{self, UploadReport};
use crate::SyncOptions;

/// Result of syncing one dataset to one backend.
#[derive(Debug)]
pub struct BackendReport {
    /// Backend name (`"s3"`, `"azure"`).
    pub backend: &'static str,
    /// Bucket or container the sync targeted.
    pub location: String,
    /// Destination prefix (`{portal}/{dataset}`).
    pub destination: String,
    /// True iff the delete phase did not fail and every upload succeeded.
    pub success: bool,
    /// Objects matched by the delete plan.
    pub matched_for_delete: usize,
    /// Objects deleted (zero on a dry run).
    pub deleted: usize,
    /// Files uploaded successfully.
    pub uploaded: usize,
    /// Error descriptions collected from the failed phase or files.
    pub errors: Vec<String>,
}

/// Aggregated result across every targeted backend.
#[derive(Debug)]
pub struct SyncOutcome {
    /// One report per backend, in request order.
    pub reports: Vec<BackendReport>,
}

impl SyncOutcome {
    /// True iff every targeted backend succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.reports.iter().all(|report| report.success)
    }

    /// Every error across all backends, prefixed with the backend name.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.reports
            .iter()
            .flat_map(|report| {
                report
                    .errors
                    .iter()
                    .map(move |e| format!("{}: {e}", report.backend))
            })
            .collect()
    }
}

/// Syncs one dataset to one backend: delete the reloaded partitions'
/// remote objects, then upload the local tree. Deletion fully completes
/// before the first upload starts.
pub async fn sync_backend(
    backend: &dyn ObjectStorageBackend,
    local_dir: &Path,
    destination_prefix: &str,
    options: &SyncOptions,
) -> BackendReport {
    let dataset = dataset_label(destination_prefix);
    log::info!(
        "[{dataset}] Starting sync to {} ({})",
        backend.location(),
        backend.name()
    );

    match run_pipeline(backend, local_dir, destination_prefix, options, dataset).await {
        Ok((delete_report, upload_report)) => {
            let success = upload_report.is_success();
            if success {
                log::info!(
                    "[{dataset}] Sync to {} ({}) completed",
                    backend.location(),
                    backend.name()
                );
            }
            BackendReport {
                backend: backend.name(),
                location: backend.location().to_string(),
                destination: destination_prefix.to_string(),
                success,
                matched_for_delete: delete_report.matched,
                deleted: delete_report.deleted,
                uploaded: upload_report.succeeded.len(),
                errors: upload_report
                    .failed
                    .into_iter()
                    .map(|(key, message)| format!("upload '{key}': {message}"))
                    .collect(),
            }
        }
        Err(e) => {
            log::error!(
                "[{dataset}] Sync to {} ({}) failed: {e}",
                backend.location(),
                backend.name()
            );
            BackendReport {
                backend: backend.name(),
                location: backend.location().to_string(),
                destination: destination_prefix.to_string(),
                success: false,
                matched_for_delete: 0,
                deleted: 0,
                uploaded: 0,
                errors: vec![e.to_string()],
            }
        }
    }
}

/// Syncs one dataset to every targeted backend concurrently. The backends
/// are fully independent; the outcome is the AND of their successes.
pub async fn sync_all(
    backends: &[Arc<dyn ObjectStorageBackend>],
    local_dir: &Path,
    destination_prefix: &str,
    options: &SyncOptions,
) -> SyncOutcome {
    let reports = futures::future::join_all(
        backends
            .iter()
            .map(|backend| sync_backend(backend.as_ref(), local_dir, destination_prefix, options)),
    )
    .await;

    SyncOutcome { reports }
}

async fn run_pipeline(
    backend: &dyn ObjectStorageBackend,
    local_dir: &Path,
    destination_prefix: &str,
    options: &SyncOptions,
    dataset: &str,
) -> Result<(DeleteReport, UploadReport), SyncError> {
    let tree = LocalTree::scan(local_dir, destination_prefix)?;
    if tree.units.is_empty() {
        log::info!("[{dataset}] Nothing to upload in '{}'", local_dir.display());
        return Ok((DeleteReport::default(), UploadReport::default()));
    }

    let existing =
        lister::existing_partitions(backend, destination_prefix, options.request_timeout).await?;
    let plan = lakesync_partition::plan(&existing, &tree.partitions);

    let delete_report =
        delete::execute(backend, destination_prefix, &plan, options, dataset).await?;
    let upload_report = upload::execute(backend, &tree.units, options, dataset).await;

    Ok((delete_report, upload_report))
}

/// Dataset name for log tags: the final component of the destination
/// prefix (`portal/Vendas` -> `Vendas`).
fn dataset_label(destination_prefix: &str) -> &str {
    destination_prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(destination_prefix)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::mock::MockBackend;

    fn dataset_dir(name: &str, partitions: &[&str]) -> PathBuf {
        let root = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&root);
        for partition in partitions {
            let dir = root.join(partition);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("part-0000.parquet"), b"data").unwrap();
        }
        if partitions.is_empty() {
            fs::create_dir_all(&root).unwrap();
        }
        root
    }

    #[tokio::test]
    async fn replaces_reloaded_partitions_and_uploads() {
        let root = dataset_dir(
            "lakesync_coord_replace_test",
            &["idEmpresa=1/Ano=2024/Mes=01"],
        );
        let backend = MockBackend::new([
            "portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/stale.parquet".to_string(),
        ]);

        let report =
            sync_backend(&backend, &root, "portal/Vendas", &SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.uploaded, 1);
        let objects = backend.objects();
        assert!(!objects.contains("portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/stale.parquet"));
        assert!(
            objects.contains("portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/part-0000.parquet")
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn delete_failure_skips_upload() {
        let root = dataset_dir(
            "lakesync_coord_delete_fail_test",
            &["idEmpresa=1/Ano=2024/Mes=01"],
        );
        let backend = MockBackend::new([
            "portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/stale.parquet".to_string(),
        ])
        .with_failing_deletes();

        let report =
            sync_backend(&backend, &root, "portal/Vendas", &SyncOptions::default()).await;

        assert!(!report.success);
        assert_eq!(report.uploaded, 0);
        assert!(backend.upload_attempts().is_empty());
        assert!(!report.errors.is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn listing_failure_fails_the_backend() {
        let root = dataset_dir(
            "lakesync_coord_listing_fail_test",
            &["idEmpresa=1/Ano=2024/Mes=01"],
        );
        let backend = MockBackend::new([]).with_failing_listing();

        let report =
            sync_backend(&backend, &root, "portal/Vendas", &SyncOptions::default()).await;

        assert!(!report.success);
        assert!(backend.upload_attempts().is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn empty_local_tree_is_a_successful_no_op() {
        let root = dataset_dir("lakesync_coord_empty_test", &[]);
        let backend = MockBackend::new([]);

        let report =
            sync_backend(&backend, &root, "portal/Vendas", &SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.uploaded, 0);
        assert_eq!(backend.delete_calls(), 0);

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn outcome_is_the_and_of_backend_successes() {
        let root = dataset_dir(
            "lakesync_coord_fanout_test",
            &["idEmpresa=1/Ano=2024/Mes=01"],
        );
        let healthy: Arc<dyn ObjectStorageBackend> = Arc::new(MockBackend::new([]));
        let failing: Arc<dyn ObjectStorageBackend> = Arc::new(
            MockBackend::new([]).with_failing_uploads([
                "portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/part-0000.parquet".to_string(),
            ]),
        );

        let outcome = sync_all(
            &[healthy, failing],
            &root,
            "portal/Vendas",
            &SyncOptions::default(),
        )
        .await;

        assert!(!outcome.success());
        assert!(outcome.reports[0].success);
        assert!(!outcome.reports[1].success);
        assert_eq!(outcome.errors().len(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn dry_run_reports_matches_but_still_uploads() {
        let root = dataset_dir(
            "lakesync_coord_dry_run_test",
            &["idEmpresa=1/Ano=2024/Mes=01"],
        );
        let backend = MockBackend::new([
            "portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/stale.parquet".to_string(),
        ]);
        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };

        let report = sync_backend(&backend, &root, "portal/Vendas", &options).await;

        assert!(report.success);
        assert_eq!(report.matched_for_delete, 1);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.uploaded, 1);
        // The stale object survives a dry run.
        assert!(
            backend
                .objects()
                .contains("portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/stale.parquet")
        );

        let _ = fs::remove_dir_all(&root);
    }
}
