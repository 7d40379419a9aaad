//! Command-line arguments.
use crate::preset::Preset;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use namewright_core::model::{ReplaceSettings, Scope, SearchSettings};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Whole file name
    Full,
    /// File name without extension
    Name,
    /// Extension only
    #[value(alias = "extension")]
    Ext,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Full => Scope::Full,
            ScopeArg::Name => Scope::Name,
            ScopeArg::Ext => Scope::Extension,
        }
    }
}

/// Preview and apply bulk renames of files and folders
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "namewright")]
#[command(about = "Preview and apply bulk renames of files and folders", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Files or folders to scan
    #[arg(value_name = "PATHS", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Text (or pattern with --regex) to search for
    #[arg(short = 's', long = "search", value_name = "TEXT", conflicts_with = "search_script")]
    pub search: Option<String>,

    /// Replacement text; `$1`, `$<name>` and `$&` expand with --regex
    #[arg(short = 'r', long = "replace", value_name = "TEXT", conflicts_with = "replace_script")]
    pub replace: Option<String>,

    /// Treat the search text as a regular expression
    #[arg(long = "regex")]
    pub regex: bool,

    /// Replace only the first occurrence in each name
    #[arg(long = "first")]
    pub first: bool,

    /// Match case exactly
    #[arg(long = "case-sensitive")]
    pub case_sensitive: bool,

    /// Pipeline script computing each new name (replaces search and replace)
    #[arg(long = "search-script", value_name = "SCRIPT")]
    pub search_script: Option<String>,

    /// Pipeline script computing the replacement for each match
    #[arg(long = "replace-script", value_name = "SCRIPT")]
    pub replace_script: Option<String>,

    /// Part of the name the replacement applies to
    #[arg(long = "scope", value_enum, value_name = "SCOPE")]
    pub scope: Option<ScopeArg>,

    /// Do not rename files
    #[arg(long = "no-files")]
    pub no_files: bool,

    /// Do not rename folders
    #[arg(long = "no-folders")]
    pub no_folders: bool,

    /// Only rename the direct children of the given paths
    #[arg(long = "no-subfolders")]
    pub no_subfolders: bool,

    /// Load search/replace settings from a TOML preset
    #[arg(long = "preset", value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Only apply the rename of this path (repeatable; default: all)
    #[arg(long = "select", value_name = "PATH")]
    pub select: Vec<PathBuf>,

    /// Never apply the rename of this path (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    pub exclude: Vec<PathBuf>,

    /// Perform the renames instead of only previewing them
    #[arg(long = "apply")]
    pub apply: bool,

    /// Stop after applying instead of re-scanning and previewing again
    #[arg(long = "close", requires = "apply")]
    pub close: bool,

    /// Print the plan and results as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Write the preview to a CSV file
    #[arg(long = "export", value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective settings: the preset (if any) overlaid with the
    /// flags given on the command line.
    pub fn settings(&self) -> Result<(SearchSettings, ReplaceSettings)> {
        let preset = match &self.preset {
            Some(path) => Preset::load(path)?,
            None => Preset::default(),
        };
        Ok(self.overlay(preset))
    }

    /// Apply explicit flags on top of `preset`.
    pub fn overlay(&self, preset: Preset) -> (SearchSettings, ReplaceSettings) {
        let Preset {
            mut search,
            mut replace,
        } = preset;

        if let Some(text) = &self.search {
            search.input = text.clone();
            search.use_function = false;
        }
        if let Some(script) = &self.search_script {
            search.input = script.clone();
            search.use_function = true;
        }
        if self.regex {
            search.is_regex = true;
        }
        if self.first {
            search.matches_all = false;
        }
        if self.case_sensitive {
            search.is_case_sensitive = true;
        }

        if let Some(text) = &self.replace {
            replace.input = text.clone();
            replace.use_function = false;
        }
        if let Some(script) = &self.replace_script {
            replace.input = script.clone();
            replace.use_function = true;
        }
        if let Some(scope) = self.scope {
            replace.scope = scope.into();
        }
        if self.no_files {
            replace.include_files = false;
        }
        if self.no_folders {
            replace.include_folders = false;
        }
        if self.no_subfolders {
            replace.include_subfolders = false;
        }

        (search, replace)
    }
}
