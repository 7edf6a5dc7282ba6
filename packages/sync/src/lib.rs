#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incremental partition reconciliation and sync engine.
//!
//! Given a freshly produced local partition tree and a destination prefix
//! on one or more object-storage backends, the engine replaces exactly the
//! partitions that were regenerated:
//!
//! 1. [`local`] walks the dataset directory, producing the upload list and
//!    the set of partitions this run touched.
//! 2. [`lister`] enumerates what already exists remotely.
//! 3. The planner (in `lakesync_partition`) computes which prefixes are
//!    safe to delete in bulk.
//! 4. [`delete`] expands the plan to object keys and deletes them in
//!    capped, concurrent batches. Deletion fully completes before upload
//!    starts: a failure here skips the upload rather than masking stale
//!    data with a false success.
//! 5. [`upload`] pushes every local file under bounded concurrency,
//!    collecting per-file outcomes without ever aborting early.
//!
//! [`coordinator`] wires the phases together per backend and fans out
//! across backends in parallel, AND-aggregating the per-backend results
//! into a single [`coordinator::SyncOutcome`].

use std::time::Duration;

pub mod coordinator;
pub mod delete;
pub mod error;
pub mod lister;
pub mod local;
pub mod upload;

#[cfg(test)]
pub(crate) mod mock;

pub use coordinator::{BackendReport, SyncOutcome, sync_all, sync_backend};
pub use error::SyncError;
pub use local::TransferUnit;

/// Tuning knobs for one dataset sync.
///
/// Delete and upload concurrency are independent: deletes are API-rate
/// bound while uploads are bandwidth bound and tolerate far higher fan-out.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Concurrent bulk-delete calls in flight.
    pub delete_workers: usize,
    /// Concurrent file uploads in flight.
    pub upload_workers: usize,
    /// Report what would be deleted without touching the remote store.
    pub dry_run: bool,
    /// Upper bound for a single remote call; a call exceeding it is
    /// recorded as a failure for its unit of work.
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            delete_workers: 5,
            upload_workers: 10,
            dry_run: false,
            request_timeout: Duration::from_secs(300),
        }
    }
}
