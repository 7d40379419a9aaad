//! Batch rename executor.
//!
//! Applies a pruned [`RenameOperation`] forest to the filesystem. Every
//! attempt is independent: a failure becomes a failed [`RenameResult`] and
//! the batch carries on.
//!
//! Within one level, all sub-entries are processed before the level's own
//! renames, so a child is always renamed while its parent still has the
//! path recorded in the operation. Results list, per level, every
//! descendant result followed by the level's own results, both in operation
//! order.
pub mod selection;

use crate::model::{RenameOperation, RenameResult, RenameResults};
use rayon::prelude::*;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The primitive used to move one path to another.
pub type RenameFn<'a> = dyn Fn(&Path, &Path) -> io::Result<()> + Sync + 'a;

/// Apply `operations` with [`std::fs::rename`].
pub fn process_rename_operations(operations: &[RenameOperation]) -> RenameResults {
    process_rename_operations_with(operations, &|from: &Path, to: &Path| {
        std::fs::rename(from, to)
    })
}

/// Apply `operations` with a caller-supplied rename primitive.
pub fn process_rename_operations_with(
    operations: &[RenameOperation],
    rename: &RenameFn<'_>,
) -> RenameResults {
    let start = Instant::now();
    let results = process_level(operations, rename);
    info!(
        attempted = results.results.len(),
        failed = results.failure_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rename batch complete"
    );
    results
}

fn process_level(operations: &[RenameOperation], rename: &RenameFn<'_>) -> RenameResults {
    let nested: Vec<RenameResults> = operations
        .par_iter()
        .filter_map(|op| op.sub_entries.as_deref())
        .map(|subs| process_level(subs, rename))
        .collect();

    let own: Vec<RenameResult> = operations
        .par_iter()
        .filter_map(|op| Some(attempt(op.from_path(), op.to_path()?, rename)))
        .collect();

    let mut results = RenameResults::default();
    for sub in nested {
        results.extend(sub);
    }
    for result in own {
        results.push(result);
    }
    results
}

fn attempt(
    from_path: std::path::PathBuf,
    to_path: std::path::PathBuf,
    rename: &RenameFn<'_>,
) -> RenameResult {
    match rename(&from_path, &to_path) {
        Ok(()) => {
            debug!(from = %from_path.display(), to = %to_path.display(), "Renamed");
            RenameResult::succeeded(from_path, to_path)
        }
        Err(err) => {
            warn!(from = %from_path.display(), to = %to_path.display(), error = %err, "Rename failed");
            RenameResult::failed(from_path, to_path, err.to_string())
        }
    }
}
