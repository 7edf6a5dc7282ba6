#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hierarchical partition key model and reconciliation planner.
//!
//! Datasets are published as partitioned file trees whose directory names
//! encode `segment=value` tokens (e.g. `idEmpresa=42/Ano=2024/Mes=03`). This
//! crate owns the pure, I/O-free half of the sync engine:
//!
//! - [`key`]: normalization, coverage, and hierarchy navigation over
//!   partition key strings.
//! - [`planner`]: given the partitions that exist remotely and the partitions
//!   regenerated by the current run, compute the minimal set of prefix
//!   deletions that replaces exactly the regenerated data, rolling fine
//!   partitions up to coarser prefixes whenever that cannot delete untouched
//!   data.

pub mod key;
pub mod planner;

pub use key::PartitionKey;
pub use planner::{ExclusionPlan, plan};
