//! Scanned entries and their rename-annotated counterparts.
//!
//! A [`TreeEntry`] forest is an immutable snapshot produced once per scan.
//! A [`RenameEntry`] forest has the exact same shape and is recomputed in full
//! whenever the tree or the settings change.
use super::name::split_base;
use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Stat-like information captured at scan time.
///
/// Exposed read-only to user transforms, so it deliberately carries no
/// handles, only plain values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Logical size in bytes (0 for directories on most platforms).
    pub size: u64,
    /// Last-modified timestamp, if the platform reports one.
    pub modified: Option<DateTime<Local>>,
    /// Creation timestamp, if the platform reports one.
    pub created: Option<DateTime<Local>>,
    /// `true` if the entry is read-only.
    pub readonly: bool,
}

impl From<&std::fs::Metadata> for EntryMetadata {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            created: meta.created().ok().map(DateTime::<Local>::from),
            readonly: meta.permissions().readonly(),
        }
    }
}

/// Fields shared by every node of both entry trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInfo {
    /// File name without its extension.
    pub name: CompactString,
    /// File name including its extension (`name + ext`).
    pub base: CompactString,
    /// Extension including the leading dot, or empty.
    pub ext: CompactString,
    /// Directory that contains this entry.
    pub base_path: PathBuf,
    /// `base_path` joined with `base`.
    pub full_path: PathBuf,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntryMetadata>,
}

impl EntryInfo {
    /// Build the info for `full_path`, deriving `base`, `name`, `ext` and
    /// `base_path` from it.
    ///
    /// Paths without a final component (`/`, `C:\`) use the whole path as
    /// their `base`.
    pub fn from_path(
        full_path: PathBuf,
        is_directory: bool,
        metadata: Option<EntryMetadata>,
    ) -> Self {
        let base = match full_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => full_path.to_string_lossy().into_owned(),
        };
        let (name, ext) = split_base(&base);
        let base_path = full_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            name: CompactString::new(name),
            ext: CompactString::new(ext),
            base: CompactString::new(&base),
            base_path,
            full_path,
            is_directory,
            metadata,
        }
    }

    /// The portion of `base` a replacement targets under `scope`.
    pub fn scoped(&self, scope: super::Scope) -> &str {
        match scope {
            super::Scope::Full => &self.base,
            super::Scope::Name => &self.name,
            super::Scope::Extension => &self.ext,
        }
    }
}

/// A node of the scanned tree.
///
/// `sub_entries` is `Some` if and only if the entry is a directory that has
/// been scanned, and then holds its complete recursive subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    #[serde(flatten)]
    pub info: EntryInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_entries: Option<Vec<TreeEntry>>,
}

impl TreeEntry {
    /// Create a file entry for `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            info: EntryInfo::from_path(path.into(), false, None),
            sub_entries: None,
        }
    }

    /// Create a scanned directory entry for `path` with the given children.
    pub fn dir(path: impl Into<PathBuf>, sub_entries: Vec<TreeEntry>) -> Self {
        Self {
            info: EntryInfo::from_path(path.into(), true, None),
            sub_entries: Some(sub_entries),
        }
    }

    /// Attach stat information to this entry.
    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.info.metadata = Some(metadata);
        self
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        1 + self
            .sub_entries
            .iter()
            .flatten()
            .map(TreeEntry::len)
            .sum::<usize>()
    }

    /// Always `false`: a subtree contains at least its own root.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Deref for TreeEntry {
    type Target = EntryInfo;

    fn deref(&self) -> &EntryInfo {
        &self.info
    }
}

/// A [`TreeEntry`] annotated with its proposed new `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameEntry {
    #[serde(flatten)]
    pub info: EntryInfo,
    /// Proposed new `base`, or `None` for "no change". Never equal to `base`.
    pub rename: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_entries: Option<Vec<RenameEntry>>,
}

impl RenameEntry {
    /// Wrap `entry`'s info with no rename and no children yet.
    pub fn unchanged(entry: &TreeEntry) -> Self {
        Self {
            info: entry.info.clone(),
            rename: None,
            sub_entries: None,
        }
    }

    /// Full path this entry would have after its own rename.
    pub fn renamed_path(&self) -> Option<PathBuf> {
        self.rename
            .as_ref()
            .map(|rename| self.info.base_path.join(rename.as_str()))
    }

    /// Visit this entry and every descendant in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RenameEntry, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a RenameEntry, usize)) {
        visit(self, depth);
        for sub in self.sub_entries.iter().flatten() {
            sub.walk_at(depth + 1, visit);
        }
    }
}

impl Deref for RenameEntry {
    type Target = EntryInfo;

    fn deref(&self) -> &EntryInfo {
        &self.info
    }
}

/// Count the proposed renames in a forest.
pub fn count_renames(entries: &[RenameEntry]) -> usize {
    let mut count = 0;
    for entry in entries {
        entry.walk(&mut |e, _| {
            if e.rename.is_some() {
                count += 1;
            }
        });
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;

    #[test]
    fn test_info_from_path() {
        let info = EntryInfo::from_path(PathBuf::from("/data/photos/img.jpeg"), false, None);
        assert_eq!(info.name, "img");
        assert_eq!(info.ext, ".jpeg");
        assert_eq!(info.base, "img.jpeg");
        assert_eq!(info.base_path, PathBuf::from("/data/photos"));
        assert_eq!(info.base_path.join(info.base.as_str()), info.full_path);
    }

    #[test]
    fn test_scoped_portions() {
        let info = EntryInfo::from_path(PathBuf::from("/x/file.txt"), false, None);
        assert_eq!(info.scoped(Scope::Full), "file.txt");
        assert_eq!(info.scoped(Scope::Name), "file");
        assert_eq!(info.scoped(Scope::Extension), ".txt");
    }

    #[test]
    fn test_tree_len_counts_descendants() {
        let tree = TreeEntry::dir(
            "/r",
            vec![
                TreeEntry::file("/r/a.txt"),
                TreeEntry::dir("/r/sub", vec![TreeEntry::file("/r/sub/b.txt")]),
            ],
        );
        assert_eq!(tree.len(), 4);
        assert!(tree.sub_entries.is_some());
        assert!(TreeEntry::file("/r/a.txt").sub_entries.is_none());
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let tree = TreeEntry::dir(
            "/r",
            vec![
                TreeEntry::dir("/r/sub", vec![TreeEntry::file("/r/sub/b.txt")]),
                TreeEntry::file("/r/a.txt"),
            ],
        );
        fn convert(entry: &TreeEntry) -> RenameEntry {
            let mut out = RenameEntry::unchanged(entry);
            out.sub_entries = entry
                .sub_entries
                .as_ref()
                .map(|subs| subs.iter().map(convert).collect());
            out
        }
        let renamed = convert(&tree);
        let mut seen = Vec::new();
        renamed.walk(&mut |e, depth| seen.push((e.base.to_string(), depth)));
        assert_eq!(
            seen,
            vec![
                ("r".to_string(), 0),
                ("sub".to_string(), 1),
                ("b.txt".to_string(), 2),
                ("a.txt".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_serde_flattens_info() {
        let entry = TreeEntry::file("/x/file.txt");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["base"], "file.txt");
        assert!(json.get("sub_entries").is_none());
    }
}
