//! Batch delete executor.
//!
//! Expands an exclusion plan into concrete object keys and deletes them in
//! size-capped batches fanned out across a bounded number of concurrent
//! calls. Partial failure never aborts other in-flight batches, but any
//! failed key makes the whole phase fail: stale objects left in place
//! would silently pollute the dataset.

use std::collections::BTreeSet;

use futures::StreamExt as _;
use lakesync_partition::{ExclusionPlan, PartitionKey};
use lakesync_storage::{DeleteFailure, ObjectStorageBackend};

use crate::error::SyncError;
use crate::lister;
use crate::SyncOptions;

/// Outcome of the delete phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteReport {
    /// Objects matched by the plan's prefixes.
    pub matched: usize,
    /// Objects actually deleted (zero on a dry run).
    pub deleted: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Groups keys into chunks of at most `cap` keys each.
///
/// For `n` keys this produces `ceil(n / cap)` chunks whose union is exactly
/// the input, preserving order and duplicating nothing.
#[must_use]
pub fn chunk_keys(keys: Vec<String>, cap: usize) -> Vec<Vec<String>> {
    keys.chunks(cap.max(1)).map(<[String]>::to_vec).collect()
}

/// Executes the exclusion plan against one backend.
///
/// # Errors
///
/// Returns [`SyncError::Listing`] when expanding a plan prefix fails, or
/// [`SyncError::BatchDelete`] when any key could not be deleted (the
/// caller must then skip the upload phase).
pub async fn execute(
    backend: &dyn ObjectStorageBackend,
    destination_prefix: &str,
    plan: &ExclusionPlan,
    options: &SyncOptions,
    dataset: &str,
) -> Result<DeleteReport, SyncError> {
    let prefixes = plan.covering_prefixes();
    if prefixes.is_empty() {
        log::info!("[{dataset}] No partitions need deletion on {}", backend.name());
        return Ok(DeleteReport::default());
    }

    log::info!(
        "[{dataset}] Clearing {} partition prefix(es) on {}: {}",
        prefixes.len(),
        backend.name(),
        preview(&prefixes)
    );

    let destination = destination_prefix.trim_end_matches('/');
    let mut keys: BTreeSet<String> = BTreeSet::new();
    for prefix in &prefixes {
        let full = format!("{destination}/{prefix}/");
        let listed = lister::list_with_timeout(backend, &full, options.request_timeout).await?;
        keys.extend(listed.into_iter().filter(|k| !k.ends_with('/')));
    }

    let matched = keys.len();
    if matched == 0 {
        log::info!("[{dataset}] No objects found under the planned prefixes");
        return Ok(DeleteReport::default());
    }

    if options.dry_run {
        log::info!(
            "[{dataset}] Dry run: {matched} object(s) would be deleted from {}",
            backend.location()
        );
        return Ok(DeleteReport {
            matched,
            deleted: 0,
            dry_run: true,
        });
    }

    log::info!(
        "[{dataset}] Removing {matched} object(s) from {} with {} worker(s)...",
        backend.location(),
        options.delete_workers
    );

    let chunks = chunk_keys(keys.into_iter().collect(), backend.max_delete_batch());
    let outcomes: Vec<Vec<DeleteFailure>> = futures::stream::iter(chunks.into_iter().map(|chunk| async move {
        match tokio::time::timeout(options.request_timeout, backend.delete_batch(&chunk)).await {
            Ok(Ok(failures)) => failures,
            Ok(Err(e)) => failed_chunk(&chunk, &e.to_string()),
            Err(_) => failed_chunk(&chunk, "delete call timed out"),
        }
    }))
    .buffer_unordered(options.delete_workers.max(1))
    .collect()
    .await;

    let failed: Vec<DeleteFailure> = outcomes.into_iter().flatten().collect();
    for failure in &failed {
        log::error!(
            "[{dataset}] Failed to delete '{}': {}",
            failure.key,
            failure.message
        );
    }

    let deleted = matched - failed.len();
    log::info!(
        "[{dataset}] Delete phase finished on {}: {deleted} removed, {} error(s)",
        backend.name(),
        failed.len()
    );

    if failed.is_empty() {
        Ok(DeleteReport {
            matched,
            deleted,
            dry_run: false,
        })
    } else {
        Err(SyncError::BatchDelete {
            prefix: destination.to_string(),
            failed,
        })
    }
}

/// Marks every key of a chunk as failed with the same message.
fn failed_chunk(chunk: &[String], message: &str) -> Vec<DeleteFailure> {
    chunk
        .iter()
        .map(|key| DeleteFailure {
            key: key.clone(),
            message: message.to_string(),
        })
        .collect()
}

/// First and last entries only; partition lists can run to the thousands.
fn preview(prefixes: &[PartitionKey]) -> String {
    match prefixes {
        [] => String::new(),
        [only] => only.to_string(),
        [first, .., last] => format!("{first} ... {last}"),
    }
}
