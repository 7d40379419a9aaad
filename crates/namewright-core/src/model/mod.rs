//! Data model shared by the scanner, planner, executor and frontends.
//!
//! Re-exports the entry trees, operation/result types and settings.
pub mod entry;
pub mod name;
pub mod operation;
pub mod settings;

pub use entry::{count_renames, EntryInfo, EntryMetadata, RenameEntry, TreeEntry};
pub use name::split_base;
pub use operation::{ApplyOptions, RenameOperation, RenameResult, RenameResults, Selection};
pub use settings::{ReplaceSettings, Scope, SearchSettings};
