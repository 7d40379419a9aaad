//! Counters threaded through one planning walk.
use crate::model::EntryInfo;
use crate::transform::TransformContext;
use std::collections::HashMap;
use std::path::PathBuf;

/// Per-walk rename counters. A fresh, zeroed instance is owned by each walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameStats {
    /// Entries renamed so far.
    pub global_index: usize,
    /// Files renamed so far, keyed by their original containing directory.
    pub file_in_folder_index: HashMap<PathBuf, usize>,
}

impl RenameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the counters for `info`, registering its folder key.
    pub fn context_for(&mut self, info: &EntryInfo) -> TransformContext {
        let in_folder = *self
            .file_in_folder_index
            .entry(info.base_path.clone())
            .or_insert(0);
        TransformContext {
            global_index: self.global_index,
            file_in_folder_index: (!info.is_directory).then_some(in_folder),
            is_folder: info.is_directory,
            metadata: info.metadata.clone(),
        }
    }

    /// Count a produced rename for `info`.
    pub fn record(&mut self, info: &EntryInfo) {
        self.global_index += 1;
        if !info.is_directory {
            *self
                .file_in_folder_index
                .entry(info.base_path.clone())
                .or_insert(0) += 1;
        }
    }

    /// Files renamed so far in `folder`.
    pub fn files_in(&self, folder: &std::path::Path) -> usize {
        self.file_in_folder_index.get(folder).copied().unwrap_or(0)
    }
}
