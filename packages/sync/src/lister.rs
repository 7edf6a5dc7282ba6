//! Remote partition enumeration.

use std::collections::BTreeSet;
use std::time::Duration;

use lakesync_partition::PartitionKey;
use lakesync_storage::{ObjectStorageBackend, StorageError};

use crate::error::SyncError;

/// Lists every key under `prefix`, bounding the call with `timeout`.
///
/// A stalled listing must not hang the phase: an elapsed timeout surfaces
/// as the same [`SyncError::Listing`] a remote failure would.
pub(crate) async fn list_with_timeout(
    backend: &dyn ObjectStorageBackend,
    prefix: &str,
    timeout: Duration,
) -> Result<Vec<String>, SyncError> {
    let listed = match tokio::time::timeout(timeout, backend.list_keys(prefix)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::List {
            location: backend.location().to_string(),
            prefix: prefix.to_string(),
            source: "listing timed out".into(),
        }),
    };
    listed.map_err(|source| SyncError::Listing {
        prefix: prefix.to_string(),
        source,
    })
}

/// Lists every object under the destination prefix and derives the set of
/// tenant-scoped partitions that currently exist remotely.
///
/// Keys are made relative to the destination prefix so they compare
/// directly against the locally discovered reload set.
///
/// # Errors
///
/// Returns [`SyncError::Listing`] when the remote enumeration fails or
/// exceeds `timeout`. This is fatal for the backend's run: deletion cannot
/// proceed safely without knowing what exists.
pub async fn existing_partitions(
    backend: &dyn ObjectStorageBackend,
    destination_prefix: &str,
    timeout: Duration,
) -> Result<BTreeSet<PartitionKey>, SyncError> {
    let prefix = format!("{}/", destination_prefix.trim_end_matches('/'));

    let keys = list_with_timeout(backend, &prefix, timeout).await?;

    let partitions: BTreeSet<PartitionKey> = keys
        .iter()
        .filter(|key| !key.ends_with('/'))
        .filter_map(|key| key.strip_prefix(&prefix))
        .map(PartitionKey::from_object_key)
        .filter(PartitionKey::is_tenant_scoped)
        .collect();

    log::info!(
        "Found {} object(s) in {} distinct partition(s) under {prefix}",
        keys.len(),
        partitions.len()
    );

    Ok(partitions)
}
