//! Error types for backend configuration and remote operations.

/// Errors produced while validating backend configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more required configuration fields are missing. Every missing
    /// field is enumerated so a single failure reports the full fix.
    #[error("Missing configuration fields: {}", fields.join(", "))]
    MissingFields {
        /// Names of the missing fields.
        fields: Vec<&'static str>,
    },
}

/// Errors that can occur while talking to an object storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backend client could not be constructed.
    #[error("Failed to initialize {backend} client: {source}")]
    Client {
        /// Backend name.
        backend: &'static str,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Listing objects under a prefix failed.
    #[error("Failed to list {location}/{prefix}: {source}")]
    List {
        /// Bucket or container name.
        location: String,
        /// Key prefix.
        prefix: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A bulk delete call failed as a whole (no per-key outcome available).
    #[error("Failed to delete {count} object(s) from {location}: {source}")]
    Delete {
        /// Bucket or container name.
        location: String,
        /// Number of keys in the failed call.
        count: usize,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Uploading a single object failed.
    #[error("Failed to upload {location}/{key}: {source}")]
    Upload {
        /// Bucket or container name.
        location: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error reading local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
