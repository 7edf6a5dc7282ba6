//! Local dataset tree discovery.
//!
//! Walks the directory produced by the extraction step and derives both
//! halves of the sync input: the files to upload and the partitions this
//! run regenerated (the reload set). Partition segments are encoded as
//! `key=value` directory names; only tenant-scoped directories count as
//! partitions.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use lakesync_partition::PartitionKey;

use crate::error::SyncError;

/// One file to upload: local path plus the destination object key
/// (`destinationPrefix/relativePath`, separators normalized to `/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUnit {
    /// Absolute or caller-relative path of the local file.
    pub local_path: PathBuf,
    /// Destination object key.
    pub destination_key: String,
}

/// Result of scanning a local dataset directory.
#[derive(Debug, Default)]
pub struct LocalTree {
    /// Every file found, mapped to its destination key.
    pub units: Vec<TransferUnit>,
    /// Tenant-scoped leaf partitions (directories directly containing at
    /// least one file) regenerated by this run.
    pub partitions: BTreeSet<PartitionKey>,
}

impl LocalTree {
    /// Scans `local_dir` recursively.
    ///
    /// An empty (but existing) directory yields an empty tree, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LocalWalk`] when the directory cannot be read.
    pub fn scan(local_dir: &Path, destination_prefix: &str) -> Result<Self, SyncError> {
        let destination = destination_prefix.trim_end_matches('/');
        let mut tree = Self::default();
        visit(local_dir, local_dir, destination, &mut tree)?;
        Ok(tree)
    }
}

fn visit(
    root: &Path,
    dir: &Path,
    destination: &str,
    tree: &mut LocalTree,
) -> Result<(), SyncError> {
    let entries = fs::read_dir(dir).map_err(|source| SyncError::LocalWalk {
        path: dir.display().to_string(),
        source,
    })?;

    let mut has_direct_file = false;

    for entry in entries {
        let entry = entry.map_err(|source| SyncError::LocalWalk {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            visit(root, &path, destination, tree)?;
        } else {
            has_direct_file = true;
            let relative = relative_key(root, &path);
            tree.units.push(TransferUnit {
                local_path: path,
                destination_key: format!("{destination}/{relative}"),
            });
        }
    }

    if has_direct_file && dir != root {
        let partition = PartitionKey::new(&relative_key(root, dir));
        if partition.is_tenant_scoped() {
            tree.partitions.insert(partition);
        }
    }

    Ok(())
}

/// Path relative to `root`, joined with `/` regardless of platform.
fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn scan_maps_files_to_destination_keys() {
        let root = scratch("lakesync_local_scan_test");
        let partition = root.join("idEmpresa=1/Ano=2024/Mes=01");
        fs::create_dir_all(&partition).unwrap();
        fs::write(partition.join("part-0000.parquet"), b"data").unwrap();

        let tree = LocalTree::scan(&root, "portal/Vendas").unwrap();

        assert_eq!(tree.units.len(), 1);
        assert_eq!(
            tree.units[0].destination_key,
            "portal/Vendas/idEmpresa=1/Ano=2024/Mes=01/part-0000.parquet"
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scan_collects_leaf_partitions_only() {
        let root = scratch("lakesync_local_partitions_test");
        for leaf in ["idEmpresa=1/Ano=2024/Mes=01", "idEmpresa=1/Ano=2024/Mes=02"] {
            let dir = root.join(leaf);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("part.parquet"), b"x").unwrap();
        }

        let tree = LocalTree::scan(&root, "portal/Vendas").unwrap();

        let expected: BTreeSet<PartitionKey> = [
            PartitionKey::new("idEmpresa=1/Ano=2024/Mes=01"),
            PartitionKey::new("idEmpresa=1/Ano=2024/Mes=02"),
        ]
        .into_iter()
        .collect();
        assert_eq!(tree.partitions, expected);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scan_ignores_directories_without_tenant_marker() {
        let root = scratch("lakesync_local_no_tenant_test");
        let dir = root.join("staging/raw");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), b"x").unwrap();

        let tree = LocalTree::scan(&root, "portal/Vendas").unwrap();

        assert!(tree.partitions.is_empty());
        // Files still upload; partition discovery is what's tenant-scoped.
        assert_eq!(tree.units.len(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scan_of_empty_directory_is_empty() {
        let root = scratch("lakesync_local_empty_test");
        let tree = LocalTree::scan(&root, "portal/Vendas").unwrap();
        assert!(tree.units.is_empty());
        assert!(tree.partitions.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        let root = std::env::temp_dir().join("lakesync_local_missing_test_nope");
        let _ = fs::remove_dir_all(&root);
        assert!(LocalTree::scan(&root, "portal/Vendas").is_err());
    }
}
