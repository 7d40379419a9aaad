//! Turning a planned forest plus the user's selection into operations, and
//! folding results back into scan roots.
use crate::model::{RenameEntry, RenameOperation, RenameResult, RenameResults, Selection};
use std::path::PathBuf;

fn is_selected(entry: &RenameEntry, selection: &Selection) -> bool {
    entry.rename.is_some() && selection.get(&entry.full_path).copied().unwrap_or(false)
}

/// Prune `entries` down to the operations needed for `selection`.
///
/// An entry is kept if it is selected and has a rename, or if any descendant
/// is. Kept ancestors that are not themselves renamed get `to = None`.
pub fn build_operations(entries: &[RenameEntry], selection: &Selection) -> Vec<RenameOperation> {
    entries
        .iter()
        .filter_map(|entry| {
            let sub_entries = entry
                .sub_entries
                .as_deref()
                .map(|subs| build_operations(subs, selection))
                .filter(|subs| !subs.is_empty());
            let to = if is_selected(entry, selection) {
                entry.rename.clone()
            } else {
                None
            };
            if to.is_none() && sub_entries.is_none() {
                return None;
            }
            Some(RenameOperation {
                base_path: entry.base_path.clone(),
                from: entry.base.clone(),
                to,
                is_directory: entry.is_directory,
                sub_entries,
            })
        })
        .collect()
}

/// `true` if at least one selected entry has a rename.
pub fn can_apply(entries: &[RenameEntry], selection: &Selection) -> bool {
    let mut found = false;
    for entry in entries {
        entry.walk(&mut |e, _| found |= is_selected(e, selection));
        if found {
            break;
        }
    }
    found
}

/// Select every entry that has a rename.
pub fn select_all(entries: &[RenameEntry]) -> Selection {
    let mut selection = Selection::new();
    for entry in entries {
        entry.walk(&mut |e, _| {
            if e.rename.is_some() {
                selection.insert(e.full_path.clone(), true);
            }
        });
    }
    selection
}

/// Replace every scan root that was renamed successfully by its new path,
/// keeping the original order.
pub fn recreate_scan_paths(roots: &[PathBuf], results: &RenameResults) -> Vec<PathBuf> {
    roots
        .iter()
        .map(|root| {
            results
                .results
                .iter()
                .find(|r| r.success && &r.from_path == root)
                .map_or_else(|| root.clone(), |r| r.to_path.clone())
        })
        .collect()
}

/// The failed attempts of a batch.
pub fn failed_results(results: &RenameResults) -> Vec<&RenameResult> {
    results.results.iter().filter(|r| !r.success).collect()
}
