//! End-to-end scanner tests.
//!
//! These run the real `jwalk` walk against a temporary directory and check
//! the shape, ordering and path invariants of the resulting forest.
use namewright_core::model::TreeEntry;
use namewright_core::scanner::{scan_paths, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   .hidden
///   beta/
///     c.png   (300 bytes)
///   alpha/
///     a.txt   (100 bytes)
///     nested/
///   d.zip     (400 bytes)
/// ```
fn build_test_tree(root: &Path) {
    fs::create_dir_all(root.join("alpha/nested")).unwrap();
    fs::create_dir_all(root.join("beta")).unwrap();
    fs::write(root.join("alpha/a.txt"), vec![0u8; 100]).unwrap();
    fs::write(root.join("beta/c.png"), vec![0u8; 300]).unwrap();
    fs::write(root.join("d.zip"), vec![0u8; 400]).unwrap();
    fs::write(root.join(".hidden"), b"x").unwrap();
}

fn child<'a>(entry: &'a TreeEntry, base: &str) -> &'a TreeEntry {
    entry
        .sub_entries
        .as_ref()
        .and_then(|subs| subs.iter().find(|e| e.base == base))
        .unwrap_or_else(|| panic!("{base} not found under {}", entry.full_path.display()))
}

fn check_paths(entry: &TreeEntry) {
    assert_eq!(entry.base_path.join(entry.base.as_str()), entry.full_path);
    assert_eq!(format!("{}{}", entry.name, entry.ext), entry.base.as_str());
    for sub in entry.sub_entries.iter().flatten() {
        assert_eq!(sub.base_path, entry.full_path);
        check_paths(sub);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The whole tree is materialised, sorted by name, with hidden files.
#[test]
fn test_scan_directory_tree() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let forest = scan_paths(&[tmp.path().to_path_buf()]).unwrap();
    assert_eq!(forest.len(), 1);
    let root = &forest[0];
    assert!(root.is_directory);
    assert_eq!(root.full_path, tmp.path());

    let names: Vec<&str> = root
        .sub_entries
        .as_ref()
        .unwrap()
        .iter()
        .map(|e| e.base.as_str())
        .collect();
    assert_eq!(names, vec![".hidden", "alpha", "beta", "d.zip"]);

    let alpha = child(root, "alpha");
    assert!(alpha.sub_entries.is_some());
    let nested = child(alpha, "nested");
    assert_eq!(nested.sub_entries.as_deref(), Some(&[][..]));

    let zip = child(root, "d.zip");
    assert!(zip.sub_entries.is_none());
    assert_eq!(zip.ext, ".zip");
    assert_eq!(zip.metadata.as_ref().map(|m| m.size), Some(400));
    assert_eq!(child(root, ".hidden").ext, "");

    assert_eq!(root.len(), 8);
    check_paths(root);
}

/// A file root yields a single leaf; roots keep their input order.
#[test]
fn test_scan_file_and_dir_roots() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let roots = vec![tmp.path().join("d.zip"), tmp.path().join("beta")];

    let forest = scan_paths(&roots).unwrap();
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].base, "d.zip");
    assert!(forest[0].sub_entries.is_none());
    assert_eq!(forest[1].base, "beta");
    assert_eq!(forest[1].len(), 2);
}

/// A missing root fails the whole scan.
#[test]
fn test_missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    let missing: PathBuf = tmp.path().join("gone");
    match scan_paths(&[tmp.path().to_path_buf(), missing.clone()]) {
        Err(ScanError::Root { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected a root error, got {other:?}"),
    }
}
