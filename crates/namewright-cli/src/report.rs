//! Human- and machine-readable output of plans and batch results.
use anyhow::{Context, Result};
use namewright_core::model::{RenameEntry, RenameResults, Selection};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;

/// Plain-text preview: one `old → new` line per proposed rename, indented by
/// depth. Unselected renames are marked with `[ ]`.
pub fn render_preview(entries: &[RenameEntry], selection: &Selection) -> String {
    let mut out = String::new();
    for entry in entries {
        entry.walk(&mut |e, depth| {
            if let Some(rename) = &e.rename {
                let mark = if selection.get(&e.full_path).copied().unwrap_or(false) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let _ = writeln!(out, "{:indent$}{mark} {} → {rename}", "", e.base, indent = depth * 2);
            }
        });
    }
    out
}

/// Summary of a batch, listing every failure.
pub fn render_summary(results: &RenameResults) -> String {
    let failed: Vec<_> = results.results.iter().filter(|r| !r.success).collect();
    let mut out = format!(
        "Renamed {} of {} entries\n",
        results.results.len() - failed.len(),
        results.results.len()
    );
    if !failed.is_empty() {
        let _ = writeln!(out, "{} rename(s) failed:", failed.len());
        for result in failed {
            let _ = writeln!(
                out,
                "  {} → {}: {}",
                result.from_path.display(),
                result.to_path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    plan: &'a [RenameEntry],
    selection: Vec<&'a std::path::Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a RenameResults>,
}

/// The plan, the selected paths and (optionally) batch results as JSON.
pub fn to_json(
    entries: &[RenameEntry],
    selection: &Selection,
    results: Option<&RenameResults>,
) -> Result<String> {
    let mut selected: Vec<_> = selection
        .iter()
        .filter(|(_, on)| **on)
        .map(|(path, _)| path.as_path())
        .collect();
    selected.sort();
    let report = JsonReport {
        plan: entries,
        selection: selected,
        results,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize report")
}

#[derive(Serialize)]
struct PreviewRow<'a> {
    path: String,
    new_name: &'a str,
    new_path: String,
    is_directory: bool,
    selected: bool,
}

/// Write one CSV row per proposed rename.
pub fn export_csv<W: io::Write>(
    entries: &[RenameEntry],
    selection: &Selection,
    writer: W,
) -> Result<usize> {
    let mut rows = Vec::new();
    for entry in entries {
        entry.walk(&mut |e, _| {
            if let (Some(rename), Some(new_path)) = (&e.rename, e.renamed_path()) {
                rows.push(PreviewRow {
                    path: e.full_path.display().to_string(),
                    new_name: rename.as_str(),
                    new_path: new_path.display().to_string(),
                    is_directory: e.is_directory,
                    selected: selection.get(&e.full_path).copied().unwrap_or(false),
                });
            }
        });
    }

    let mut csv = csv::Writer::from_writer(writer);
    for row in &rows {
        csv.serialize(row).context("Failed to write CSV row")?;
    }
    csv.flush().context("Failed to flush CSV")?;
    Ok(rows.len())
}
