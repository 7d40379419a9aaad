//! TOML presets: saved search/replace settings.
//!
//! ```toml
//! [search]
//! input = "IMG_"
//! matches_all = false
//!
//! [replace]
//! input = "photo_"
//! scope = "name"
//! include_folders = false
//! ```
//!
//! Omitted fields keep their defaults.
use anyhow::{Context, Result};
use namewright_core::model::{ReplaceSettings, SearchSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Preset {
    pub search: SearchSettings,
    pub replace: ReplaceSettings,
}

impl Preset {
    /// Parse a preset from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse preset")
    }

    /// Load a preset file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid preset: {}", path.display()))
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize preset")
    }
}
