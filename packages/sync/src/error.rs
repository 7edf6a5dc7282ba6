//! Error types for the sync phases.

use lakesync_storage::{DeleteFailure, StorageError};

/// Phase-level errors that abort one backend's sync run.
///
/// Per-file upload failures are deliberately *not* represented here: they
/// are data collected into the upload report, never raised.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Walking the local dataset directory failed.
    #[error("Failed to walk local directory '{path}': {source}")]
    LocalWalk {
        /// Directory being walked.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Remote enumeration failed; the delete phase cannot proceed safely
    /// without knowing what exists.
    #[error("Failed to enumerate remote objects under '{prefix}': {source}")]
    Listing {
        /// Prefix being listed.
        prefix: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// One or more delete batches failed; upload is skipped so stale data
    /// is never masked by a false success.
    #[error("Bulk delete left {} object(s) in place under '{prefix}'", failed.len())]
    BatchDelete {
        /// Destination prefix the delete phase was clearing.
        prefix: String,
        /// Every key that could not be deleted, with its error.
        failed: Vec<DeleteFailure>,
    },
}
