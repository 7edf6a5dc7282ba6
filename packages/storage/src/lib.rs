#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Object storage backends for dataset sync.
//!
//! One trait, [`ObjectStorageBackend`], covers the three operations the
//! sync engine needs (paginated listing, capped bulk delete, and
//! overwriting uploads) with an S3 implementation ([`s3::S3Backend`]) and
//! an Azure Blob implementation ([`azure::AzureBackend`]). Backend handles
//! are shared read-mostly across all workers in a phase and are safe for
//! concurrent use.
//!
//! Credentials come from explicit typed configuration structs
//! ([`config::S3Config`], [`config::AzureConfig`]) whose constructors fail
//! fast, enumerating every missing field at once.

pub mod azure;
pub mod backend;
pub mod config;
pub mod error;
pub mod s3;

pub use backend::{DeleteFailure, ObjectStorageBackend, is_benign_delete_code};
pub use config::{AzureConfig, S3Config};
pub use error::{ConfigError, StorageError};
