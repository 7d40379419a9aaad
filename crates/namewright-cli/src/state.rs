//! Rename session state.
//!
//! Centralises everything a frontend reads and writes while previewing and
//! applying renames: scan roots, the scanned tree, the current settings, the
//! latest plan, the user's selection and the last batch results.
//!
//! Planning runs on a [`PlanWorker`]; every settings or tree change
//! resubmits, and `process_plan_messages()` adopts whichever plan is newest.
use anyhow::{bail, Context, Result};
use namewright_core::executor::process_rename_operations;
use namewright_core::executor::selection::{
    build_operations, can_apply, failed_results, recreate_scan_paths, select_all,
};
use namewright_core::model::{
    count_renames, ApplyOptions, RenameEntry, RenameResult, RenameResults, ReplaceSettings,
    SearchSettings, Selection, TreeEntry,
};
use namewright_core::planner::{PlanOutcome, PlanRequest, PlanWorker};
use namewright_core::scanner::scan_paths;
use namewright_core::transform::ScriptEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The current phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing scanned yet, or the last scan failed.
    Idle,
    /// A plan is being computed for the current tree and settings.
    Planning,
    /// `plan` matches the current tree and settings.
    Ready,
}

pub struct RenameSession {
    // ── Inputs ─────────────────────────────────────────
    pub scan_paths: Vec<PathBuf>,
    pub tree: Arc<Vec<TreeEntry>>,
    pub search: SearchSettings,
    pub replace: ReplaceSettings,

    // ── Plan ───────────────────────────────────────────
    pub phase: SessionPhase,
    pub plan: Vec<RenameEntry>,
    pub selection: Selection,
    /// Time the adopted plan took to compute.
    pub plan_elapsed: Option<Duration>,

    // ── Outcome ────────────────────────────────────────
    pub last_results: Option<RenameResults>,
    pub last_error: Option<String>,

    worker: PlanWorker,
    /// Generation the session is waiting for.
    pending: Option<u64>,
    /// Set when the tree changed since the last adopted plan.
    tree_changed: bool,
}

impl Default for RenameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RenameSession {
    pub fn new() -> Self {
        Self::with_worker(PlanWorker::default())
    }

    /// Use a custom script engine for transforms.
    pub fn with_engine(engine: Arc<dyn ScriptEngine>) -> Self {
        Self::with_worker(PlanWorker::new(engine))
    }

    fn with_worker(worker: PlanWorker) -> Self {
        Self {
            scan_paths: Vec::new(),
            tree: Arc::new(Vec::new()),
            search: SearchSettings::default(),
            replace: ReplaceSettings::default(),
            phase: SessionPhase::Idle,
            plan: Vec::new(),
            selection: Selection::new(),
            plan_elapsed: None,
            last_results: None,
            last_error: None,
            worker,
            pending: None,
            tree_changed: false,
        }
    }

    /// Scan `paths` and start planning against the new tree.
    pub fn scan(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        match scan_paths(&paths) {
            Ok(tree) => {
                info!(roots = paths.len(), "Scan finished");
                self.scan_paths = paths;
                self.tree = Arc::new(tree);
                self.tree_changed = true;
                self.last_error = None;
                self.replan()
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.phase = SessionPhase::Idle;
                Err(err).context("Scan failed")
            }
        }
    }

    /// Replace both settings and replan.
    pub fn set_settings(&mut self, search: SearchSettings, replace: ReplaceSettings) -> Result<()> {
        self.search = search;
        self.replace = replace;
        self.replan()
    }

    pub fn set_search(&mut self, search: SearchSettings) -> Result<()> {
        self.search = search;
        self.replan()
    }

    pub fn set_replace(&mut self, replace: ReplaceSettings) -> Result<()> {
        self.replace = replace;
        self.replan()
    }

    /// Submit the current inputs to the worker. A no-op before the first scan.
    fn replan(&mut self) -> Result<()> {
        if self.scan_paths.is_empty() {
            return Ok(());
        }
        let request = PlanRequest {
            entries: self.tree.clone(),
            roots: self.scan_paths.clone(),
            search: self.search.clone(),
            replace: self.replace.clone(),
        };
        match self.worker.submit(request) {
            Ok(generation) => {
                debug!(generation, "Plan requested");
                self.pending = Some(generation);
                self.phase = SessionPhase::Planning;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err).context("Failed to start planning thread")
            }
        }
    }

    /// Adopt the newest finished plan, if any. Returns `true` if one was
    /// adopted.
    pub fn process_plan_messages(&mut self) -> bool {
        match self.worker.try_latest() {
            Some(outcome) => {
                self.adopt(outcome);
                true
            }
            None => false,
        }
    }

    /// Block until the pending plan is adopted or `timeout` elapses.
    pub fn wait_for_plan(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.phase == SessionPhase::Planning {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            if let Some(outcome) = self.worker.wait_latest(remaining) {
                self.adopt(outcome);
            }
        }
        self.phase == SessionPhase::Ready
    }

    fn adopt(&mut self, outcome: PlanOutcome) {
        if self.pending != Some(outcome.generation) {
            debug!(generation = outcome.generation, "Ignoring plan for an older request");
            return;
        }

        let mut selection = select_all(&outcome.entries);
        if !self.tree_changed {
            // Keep explicit deselections across settings changes.
            for (path, selected) in &self.selection {
                if !selected && selection.contains_key(path) {
                    selection.insert(path.clone(), false);
                }
            }
        }

        info!(
            renames = outcome.renames,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Plan adopted"
        );
        self.plan = outcome.entries;
        self.plan_elapsed = Some(outcome.elapsed);
        self.selection = selection;
        self.pending = None;
        self.tree_changed = false;
        self.phase = SessionPhase::Ready;
    }

    /// Number of proposed renames in the current plan.
    pub fn rename_count(&self) -> usize {
        count_renames(&self.plan)
    }

    /// Number of selected renames.
    pub fn selected_count(&self) -> usize {
        self.selection.values().filter(|&&selected| selected).count()
    }

    pub fn set_selected(&mut self, path: &Path, selected: bool) {
        if let Some(value) = self.selection.get_mut(path) {
            *value = selected;
        } else {
            warn!(path = %path.display(), "No proposed rename for path");
        }
    }

    /// Keep only `paths` selected.
    pub fn select_only(&mut self, paths: &[PathBuf]) {
        for value in self.selection.values_mut() {
            *value = false;
        }
        for path in paths {
            self.set_selected(path, true);
        }
    }

    pub fn select_all(&mut self) {
        self.selection = select_all(&self.plan);
    }

    pub fn can_apply(&self) -> bool {
        self.phase == SessionPhase::Ready && can_apply(&self.plan, &self.selection)
    }

    /// Apply the selected renames.
    ///
    /// Scan roots that were renamed are replaced by their new paths. Unless
    /// `options.close_after` is set, the roots are then re-scanned and a new
    /// plan is requested. A failed re-scan is recorded in `last_error` and
    /// leaves the session idle; the batch results are still returned.
    pub fn apply(&mut self, options: ApplyOptions) -> Result<RenameResults> {
        if self.phase != SessionPhase::Ready {
            bail!("No plan is ready to apply");
        }

        let operations = build_operations(&self.plan, &self.selection);
        let results = process_rename_operations(&operations);
        if !results.success {
            warn!(failed = results.failure_count(), "Some renames failed");
        }

        self.scan_paths = recreate_scan_paths(&self.scan_paths, &results);
        self.last_results = Some(results.clone());

        if !options.close_after {
            if let Err(err) = self.scan(self.scan_paths.clone()) {
                warn!(error = %format!("{err:#}"), "Re-scan after apply failed");
            }
        }
        Ok(results)
    }

    /// Failed attempts of the last batch.
    pub fn failed_results(&self) -> Vec<&RenameResult> {
        self.last_results
            .as_ref()
            .map(failed_results)
            .unwrap_or_default()
    }

    /// Dismiss the last batch results.
    pub fn acknowledge_results(&mut self) {
        self.last_results = None;
    }
}
