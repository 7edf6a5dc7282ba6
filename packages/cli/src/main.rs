#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the lakesync partition sync engine.
//!
//! Syncs a locally produced partitioned dataset directory to one or more
//! object-storage backends, deleting exactly the remote partitions the run
//! regenerated before uploading their replacements. Backend credentials
//! come from `LAKESYNC_S3_*` / `LAKESYNC_AZURE_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use lakesync_storage::azure::AzureBackend;
use lakesync_storage::s3::S3Backend;
use lakesync_storage::{AzureConfig, ObjectStorageBackend, S3Config};
use lakesync_sync::local::LocalTree;
use lakesync_sync::{SyncOptions, lister, sync_all};

#[derive(Parser)]
#[command(name = "lakesync", about = "Incremental partition sync for object storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which backends to target.
#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    /// S3 only
    S3,
    /// Azure Blob Storage only
    Azure,
    /// Both backends, in parallel
    Both,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile and upload a dataset to the configured backends
    Sync {
        /// Local directory containing the dataset's partition tree
        #[arg(long)]
        local_dir: PathBuf,
        /// Portal name (first component of the destination prefix)
        #[arg(long)]
        portal: String,
        /// Dataset name (second component of the destination prefix)
        #[arg(long)]
        dataset: String,
        /// Backend(s) to sync to
        #[arg(long, value_enum, default_value = "both")]
        backend: BackendKind,
        /// Concurrent bulk-delete calls in flight
        #[arg(long, default_value = "5")]
        delete_workers: usize,
        /// Concurrent file uploads in flight
        #[arg(long, default_value = "10")]
        upload_workers: usize,
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the exclusion plan against the live remote listing without
    /// deleting or uploading anything
    Plan {
        /// Local directory containing the dataset's partition tree
        #[arg(long)]
        local_dir: PathBuf,
        /// Portal name (first component of the destination prefix)
        #[arg(long)]
        portal: String,
        /// Dataset name (second component of the destination prefix)
        #[arg(long)]
        dataset: String,
        /// Backend(s) to plan against
        #[arg(long, value_enum, default_value = "both")]
        backend: BackendKind,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            local_dir,
            portal,
            dataset,
            backend,
            delete_workers,
            upload_workers,
            dry_run,
        } => {
            let backends = build_backends(backend)?;
            let destination = format!("{portal}/{dataset}");
            let options = SyncOptions {
                delete_workers,
                upload_workers,
                dry_run,
                ..SyncOptions::default()
            };

            let outcome = sync_all(&backends, &local_dir, &destination, &options).await;

            for report in &outcome.reports {
                println!(
                    "{} ({}): {}, {} deleted, {} uploaded",
                    report.backend,
                    report.location,
                    if report.success { "ok" } else { "FAILED" },
                    report.deleted,
                    report.uploaded
                );
            }

            if !outcome.success() {
                for error in outcome.errors() {
                    log::error!("{error}");
                }
                std::process::exit(1);
            }
        }
        Commands::Plan {
            local_dir,
            portal,
            dataset,
            backend,
        } => {
            let backends = build_backends(backend)?;
            let destination = format!("{portal}/{dataset}");
            let tree = LocalTree::scan(&local_dir, &destination)?;

            let timeout = SyncOptions::default().request_timeout;
            for backend in &backends {
                let existing =
                    lister::existing_partitions(backend.as_ref(), &destination, timeout).await?;
                let plan = lakesync_partition::plan(&existing, &tree.partitions);

                println!("{} ({}):", backend.name(), backend.location());
                if plan.is_empty() {
                    println!("  nothing to delete");
                    continue;
                }
                for (level, key) in plan.entries() {
                    println!("  [{level}] {key}");
                }
            }
        }
    }

    Ok(())
}

/// Builds the requested backends from environment configuration, failing
/// fast with every missing field enumerated.
fn build_backends(
    kind: BackendKind,
) -> Result<Vec<Arc<dyn ObjectStorageBackend>>, Box<dyn std::error::Error>> {
    let mut backends: Vec<Arc<dyn ObjectStorageBackend>> = Vec::new();

    if matches!(kind, BackendKind::S3 | BackendKind::Both) {
        let config = S3Config::from_env()?;
        backends.push(Arc::new(S3Backend::new(&config)));
    }
    if matches!(kind, BackendKind::Azure | BackendKind::Both) {
        let config = AzureConfig::from_env()?;
        backends.push(Arc::new(AzureBackend::new(&config)?));
    }

    Ok(backends)
}
