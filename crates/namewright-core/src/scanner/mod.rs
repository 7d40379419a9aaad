//! Scanner: builds the fully materialised [`TreeEntry`] forest that the
//! planner consumes.
//!
//! Each root is stat'ed directly; directory roots are then walked with
//! `jwalk`'s rayon-backed parallel traversal. Children are grouped by parent
//! path while walking and assembled into a tree once the walk finishes.
//! Unreadable descendants are logged and left out.
use crate::model::{EntryMetadata, TreeEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read scan root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A child found during the walk, before it is attached to its parent.
struct Pending {
    path: PathBuf,
    is_directory: bool,
    metadata: Option<EntryMetadata>,
}

/// Scan every root, returning one entry per root in the given order.
pub fn scan_paths(roots: &[PathBuf]) -> Result<Vec<TreeEntry>, ScanError> {
    roots.iter().map(|root| scan_root(root)).collect()
}

/// Scan a single root.
pub fn scan_root(root: &Path) -> Result<TreeEntry, ScanError> {
    let start = Instant::now();
    let meta = std::fs::symlink_metadata(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    if !meta.is_dir() {
        return Ok(TreeEntry::file(root).with_metadata(EntryMetadata::from(&meta)));
    }

    // Parent directory → children in walk order (sorted by file name).
    let mut dir_map: HashMap<PathBuf, Vec<Pending>> = HashMap::new();
    let mut error_count: u64 = 0;

    let walker = jwalk::WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                error_count += 1;
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!(path = %path, error = %err, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let Some(parent) = path.parent().map(Path::to_path_buf) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(m) => Some(EntryMetadata::from(&m)),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "No metadata");
                None
            }
        };

        dir_map.entry(parent).or_default().push(Pending {
            is_directory: entry.file_type().is_dir(),
            path,
            metadata,
        });
    }

    let tree = assemble(root.to_path_buf(), true, Some(EntryMetadata::from(&meta)), &mut dir_map);
    info!(
        root = %root.display(),
        entries = tree.len(),
        errors = error_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Scan complete"
    );
    Ok(tree)
}

fn assemble(
    path: PathBuf,
    is_directory: bool,
    metadata: Option<EntryMetadata>,
    dir_map: &mut HashMap<PathBuf, Vec<Pending>>,
) -> TreeEntry {
    let mut entry = if is_directory {
        let children = dir_map.remove(&path).unwrap_or_default();
        let subs = children
            .into_iter()
            .map(|child| assemble(child.path, child.is_directory, child.metadata, dir_map))
            .collect();
        TreeEntry::dir(path, subs)
    } else {
        TreeEntry::file(path)
    };
    entry.info.metadata = metadata;
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_error() {
        let err = scan_paths(&[PathBuf::from("/definitely/not/here/namewright")]).unwrap_err();
        assert!(matches!(err, ScanError::Root { .. }));
        assert!(err.to_string().contains("cannot read scan root"));
    }

    #[test]
    fn test_assemble_nests_children() {
        let mut map = HashMap::new();
        map.insert(
            PathBuf::from("/r"),
            vec![
                Pending {
                    path: PathBuf::from("/r/d"),
                    is_directory: true,
                    metadata: None,
                },
                Pending {
                    path: PathBuf::from("/r/f"),
                    is_directory: false,
                    metadata: None,
                },
            ],
        );
        let tree = assemble(PathBuf::from("/r"), true, None, &mut map);
        let subs = tree.sub_entries.as_ref().unwrap();
        assert_eq!(subs.len(), 2);
        // Empty directories still get an (empty) child list.
        assert_eq!(subs[0].sub_entries.as_deref(), Some(&[][..]));
        assert!(subs[1].sub_entries.is_none());
    }
}
