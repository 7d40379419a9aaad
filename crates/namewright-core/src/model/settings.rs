//! Search and replace settings supplied by the frontend.
//!
//! Both structs deserialize with per-field defaults so presets only need to
//! name the fields they change.
use serde::{Deserialize, Serialize};

/// Which part of a `base` the replacement targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Whole file name, extension included.
    #[default]
    Full,
    /// File name without extension; the original extension is reattached.
    Name,
    /// Extension only (with its dot); the original name is reattached.
    #[serde(alias = "ext")]
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search text, regex pattern, or transform source when `use_function`.
    pub input: String,
    pub is_regex: bool,
    /// Replace every occurrence instead of only the first.
    pub matches_all: bool,
    pub is_case_sensitive: bool,
    /// `input` is a transform that computes the whole new name by itself.
    pub use_function: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            input: String::new(),
            is_regex: false,
            matches_all: true,
            is_case_sensitive: false,
            use_function: false,
        }
    }
}

impl SearchSettings {
    /// Literal search for `input` with the default flags.
    pub fn literal(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Regex search for `pattern` with the default flags.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            input: pattern.into(),
            is_regex: true,
            ..Self::default()
        }
    }

    /// Search-side transform: `source` computes every new name on its own.
    pub fn function(source: impl Into<String>) -> Self {
        Self {
            input: source.into(),
            use_function: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceSettings {
    /// Replacement text, or transform source when `use_function`.
    pub input: String,
    pub use_function: bool,
    pub include_files: bool,
    pub include_folders: bool,
    /// Also rename entries found below the scan roots' direct children.
    pub include_subfolders: bool,
    pub scope: Scope,
}

impl Default for ReplaceSettings {
    fn default() -> Self {
        Self {
            input: String::new(),
            use_function: false,
            include_files: true,
            include_folders: true,
            include_subfolders: true,
            scope: Scope::Full,
        }
    }
}

impl ReplaceSettings {
    /// Literal replacement text with the default filters.
    pub fn literal(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Replacement computed per match by the transform `source`.
    pub fn function(source: impl Into<String>) -> Self {
        Self {
            input: source.into(),
            use_function: true,
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}
