//! Rename operations submitted to the executor and the results it reports.
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// User selection at apply time: `full_path` → selected.
pub type Selection = HashMap<PathBuf, bool>;

/// Minimal from/to instruction for one selected entry.
///
/// Built only for entries the user selected or that contain a selected
/// descendant; in the latter case `to` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOperation {
    pub base_path: PathBuf,
    pub from: CompactString,
    pub to: Option<CompactString>,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_entries: Option<Vec<RenameOperation>>,
}

impl RenameOperation {
    /// Absolute source path, computed from the pre-batch snapshot.
    pub fn from_path(&self) -> PathBuf {
        self.base_path.join(self.from.as_str())
    }

    /// Absolute target path, if this operation renames anything.
    pub fn to_path(&self) -> Option<PathBuf> {
        self.to.as_ref().map(|to| self.base_path.join(to.as_str()))
    }
}

/// Outcome of a single rename attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResult {
    pub from_path: PathBuf,
    pub to_path: PathBuf,
    pub success: bool,
    /// Human-readable failure reason; `None` on success.
    pub error: Option<String>,
}

impl RenameResult {
    pub fn succeeded(from_path: PathBuf, to_path: PathBuf) -> Self {
        Self {
            from_path,
            to_path,
            success: true,
            error: None,
        }
    }

    pub fn failed(from_path: PathBuf, to_path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            from_path,
            to_path,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregated outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResults {
    /// `true` iff every attempted rename succeeded.
    pub success: bool,
    /// Every result, in the order the executor produced them.
    pub results: Vec<RenameResult>,
}

impl Default for RenameResults {
    fn default() -> Self {
        Self {
            success: true,
            results: Vec::new(),
        }
    }
}

impl RenameResults {
    /// Append all of `other`'s results, folding in its success flag.
    pub fn extend(&mut self, other: RenameResults) {
        self.success &= other.success;
        self.results.extend(other.results);
    }

    /// Append one result.
    pub fn push(&mut self, result: RenameResult) {
        self.success &= result.success;
        self.results.push(result);
    }

    /// Number of failed attempts.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Options passed alongside a batch by the apply trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// Stop after reporting instead of re-scanning the (possibly renamed) roots.
    pub close_after: bool,
}
