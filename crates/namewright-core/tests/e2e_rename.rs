//! End-to-end scan → plan → select → apply tests against a real temporary
//! filesystem.
use namewright_core::executor::selection::{
    build_operations, failed_results, recreate_scan_paths, select_all,
};
use namewright_core::executor::{process_rename_operations, process_rename_operations_with};
use namewright_core::model::{count_renames, ReplaceSettings, Scope, SearchSettings, Selection};
use namewright_core::planner::{plan_renames, plan_renames_async};
use namewright_core::scanner::scan_paths;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// photos/
///   photo one.JPG
///   photo two.jpg
///   photo album/
///     photo three.jpg
/// ```
fn build_photos(root: &Path) -> PathBuf {
    let photos = root.join("photos");
    fs::create_dir_all(photos.join("photo album")).unwrap();
    fs::write(photos.join("photo one.JPG"), b"1").unwrap();
    fs::write(photos.join("photo two.jpg"), b"2").unwrap();
    fs::write(photos.join("photo album/photo three.jpg"), b"3").unwrap();
    photos
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Renaming a folder and its contents in one batch works because children
/// are moved before their parent.
#[test]
fn test_apply_renames_nested_tree() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos.clone()];

    let tree = scan_paths(&roots).unwrap();
    let planned = plan_renames(
        &tree,
        &roots,
        &SearchSettings::literal("photo "),
        &ReplaceSettings::literal("img_").with_scope(Scope::Name),
    );
    assert_eq!(count_renames(&planned), 4);

    let selection = select_all(&planned);
    let ops = build_operations(&planned, &selection);
    let results = process_rename_operations(&ops);

    assert!(results.success, "{:?}", failed_results(&results));
    assert_eq!(results.results.len(), 4);
    assert_eq!(
        listing(&photos),
        vec!["img_album", "img_one.JPG", "img_two.jpg"]
    );
    assert_eq!(listing(&photos.join("img_album")), vec!["img_three.jpg"]);

    // The root itself was not renamed, so it stays as it was.
    assert_eq!(recreate_scan_paths(&roots, &results), roots);
}

/// Only the selected entries move; unselected ancestors are traversed.
#[test]
fn test_apply_partial_selection() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos.clone()];
    let tree = scan_paths(&roots).unwrap();
    let planned = plan_renames(
        &tree,
        &roots,
        &SearchSettings::regex(r"\.jpg$"),
        &ReplaceSettings::literal(".jpeg"),
    );
    // Case-insensitive by default, so the .JPG file matches too.
    assert_eq!(count_renames(&planned), 3);

    let mut selection = Selection::new();
    selection.insert(photos.join("photo album/photo three.jpg"), true);
    selection.insert(photos.join("photo two.jpg"), false);

    let results = process_rename_operations(&build_operations(&planned, &selection));
    assert!(results.success);
    assert_eq!(results.results.len(), 1);
    assert_eq!(
        listing(&photos.join("photo album")),
        vec!["photo three.jpeg"]
    );
    assert!(photos.join("photo two.jpg").exists());
}

/// A failing rename is reported without stopping the rest of the batch.
#[test]
fn test_failure_does_not_abort_batch() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos.clone()];
    let tree = scan_paths(&roots).unwrap();
    let planned = plan_renames(
        &tree,
        &roots,
        &SearchSettings::literal("photo "),
        &ReplaceSettings::literal("p_"),
    );
    let ops = build_operations(&planned, &select_all(&planned));

    // The file disappears between planning and applying.
    fs::remove_file(photos.join("photo two.jpg")).unwrap();

    let results = process_rename_operations(&ops);
    assert!(!results.success);
    assert_eq!(results.results.len(), 4);
    let failed = failed_results(&results);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].from_path, photos.join("photo two.jpg"));
    assert!(failed[0].error.is_some());
    assert_eq!(listing(&photos), vec!["p_album", "p_one.JPG"]);
    assert_eq!(listing(&photos.join("p_album")), vec!["p_three.jpg"]);
}

/// Renaming a scan root is reflected by `recreate_scan_paths`.
#[test]
fn test_renamed_root_is_recreated() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos.clone()];
    let tree = scan_paths(&roots).unwrap();
    let planned = plan_renames(
        &tree,
        &roots,
        &SearchSettings::function("upper"),
        &ReplaceSettings::default(),
    );
    let results = process_rename_operations(&build_operations(&planned, &select_all(&planned)));
    assert!(results.success, "{:?}", failed_results(&results));

    let new_roots = recreate_scan_paths(&roots, &results);
    assert_eq!(new_roots, vec![tmp.path().join("PHOTOS")]);
    let rescanned = scan_paths(&new_roots).unwrap();
    assert_eq!(rescanned[0].len(), 5);
    assert!(tmp.path().join("PHOTOS/PHOTO ALBUM/PHOTO THREE.JPG").exists());
}

/// The async planner agrees with the sync planner on a real tree.
#[test]
fn test_async_plan_matches_sync_on_disk() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos];
    let tree = scan_paths(&roots).unwrap();
    let search = SearchSettings::function(r#"skip_folders | set("{folder:02}_{value}")"#);
    let replace = ReplaceSettings::default();

    let sync = plan_renames(&tree, &roots, &search, &replace);
    let async_ = futures::executor::block_on(plan_renames_async(&tree, &roots, &search, &replace));
    assert_eq!(sync, async_);
}

/// The injectable rename primitive sees every target exactly once.
#[test]
fn test_injected_rename_primitive() {
    let tmp = TempDir::new().unwrap();
    let photos = build_photos(tmp.path());
    let roots = vec![photos];
    let tree = scan_paths(&roots).unwrap();
    let planned = plan_renames(
        &tree,
        &roots,
        &SearchSettings::literal("photo"),
        &ReplaceSettings::literal("pic"),
    );
    let ops = build_operations(&planned, &select_all(&planned));
    let seen = parking_lot::Mutex::new(Vec::new());
    let results = process_rename_operations_with(&ops, &|from: &Path, to: &Path| {
        seen.lock().push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    });
    assert!(results.success);
    assert_eq!(seen.into_inner().len(), results.results.len());
}
