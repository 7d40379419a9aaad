//! Rename planner: walks a scanned forest and annotates every node with its
//! proposed rename.
//!
//! The walk is depth-first and pre-order: a node's rename is decided, and the
//! counters updated, before any of its children are visited. The sync and
//! async walks produce identical forests and identical final counters.
pub mod worker;

use crate::model::{ReplaceSettings, RenameEntry, SearchSettings, TreeEntry};
use crate::replace::{Composer, RenameStats};
use crate::transform::{PipelineEngine, ScriptEngine};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub use worker::{PlanOutcome, PlanRequest, PlanWorker};

/// Plans renames for one set of settings.
#[derive(Clone)]
pub struct Planner {
    composer: Composer,
}

type LevelFuture<'a> = BoxFuture<'a, Option<Vec<RenameEntry>>>;

impl Planner {
    pub fn new(
        roots: &[PathBuf],
        search: &SearchSettings,
        replace: &ReplaceSettings,
        engine: &dyn ScriptEngine,
    ) -> Self {
        Self {
            composer: Composer::new(roots, search, replace, engine),
        }
    }

    /// Plan synchronously. Transforms that do not resolve immediately leave
    /// their entry unrenamed.
    pub fn plan(&self, entries: &[TreeEntry]) -> Vec<RenameEntry> {
        self.plan_with_stats(entries).0
    }

    /// [`plan`](Self::plan), also returning the final counters.
    pub fn plan_with_stats(&self, entries: &[TreeEntry]) -> (Vec<RenameEntry>, RenameStats) {
        let mut stats = RenameStats::new();
        let planned = entries
            .iter()
            .map(|entry| self.visit(entry, &mut stats))
            .collect();
        debug!(renamed = stats.global_index, "Sync plan complete");
        (planned, stats)
    }

    fn visit(&self, entry: &TreeEntry, stats: &mut RenameStats) -> RenameEntry {
        let mut node = RenameEntry::unchanged(entry);
        node.rename = self.composer.compose_now(&entry.info, stats);
        node.sub_entries = entry
            .sub_entries
            .as_ref()
            .map(|subs| subs.iter().map(|sub| self.visit(sub, stats)).collect());
        node
    }

    /// Plan, awaiting deferred transform results.
    pub async fn plan_async(&self, entries: &[TreeEntry]) -> Vec<RenameEntry> {
        self.plan_async_with_stats(entries).await.0
    }

    /// [`plan_async`](Self::plan_async), also returning the final counters.
    pub async fn plan_async_with_stats(
        &self,
        entries: &[TreeEntry],
    ) -> (Vec<RenameEntry>, RenameStats) {
        let mut stats = RenameStats::new();
        let planned = self
            .walk_async(entries, &mut stats, None)
            .await
            .unwrap_or_default();
        (planned, stats)
    }

    /// Async plan that gives up as soon as `cancel` is raised.
    ///
    /// Returns `None` for an abandoned walk; a partial forest is never
    /// returned.
    pub async fn plan_async_cancellable(
        &self,
        entries: &[TreeEntry],
        cancel: &AtomicBool,
    ) -> Option<Vec<RenameEntry>> {
        let mut stats = RenameStats::new();
        let planned = self.walk_async(entries, &mut stats, Some(cancel)).await;
        match &planned {
            Some(_) => debug!(renamed = stats.global_index, "Async plan complete"),
            None => debug!("Async plan abandoned"),
        }
        planned
    }

    fn walk_async<'a>(
        &'a self,
        entries: &'a [TreeEntry],
        stats: &'a mut RenameStats,
        cancel: Option<&'a AtomicBool>,
    ) -> LevelFuture<'a> {
        if self.composer.is_counter_independent() {
            self.visit_level_concurrent(entries, stats, cancel)
        } else {
            self.visit_level_sequential(entries, stats, cancel)
        }
    }

    /// Every sibling's computation is started before any is awaited; the
    /// results are then folded into the counters in pre-order.
    fn visit_level_concurrent<'a>(
        &'a self,
        entries: &'a [TreeEntry],
        stats: &'a mut RenameStats,
        cancel: Option<&'a AtomicBool>,
    ) -> LevelFuture<'a> {
        async move {
            if is_cancelled(cancel) {
                return None;
            }

            let pending: Vec<_> = entries
                .iter()
                .map(|entry| self.composer.begin(&entry.info, stats))
                .collect();
            let outcomes = futures::future::join_all(pending.into_iter().map(|candidate| async move {
                match candidate {
                    Some(candidate) => Some(candidate.await),
                    None => None,
                }
            }))
            .await;

            let mut planned = Vec::with_capacity(entries.len());
            for (entry, outcome) in entries.iter().zip(outcomes) {
                let mut node = RenameEntry::unchanged(entry);
                node.rename = outcome.and_then(|o| self.composer.finish(&entry.info, o, stats));
                if let Some(subs) = &entry.sub_entries {
                    node.sub_entries = Some(self.visit_level_concurrent(subs, stats, cancel).await?);
                }
                planned.push(node);
            }
            Some(planned)
        }
        .boxed()
    }

    /// Each node is awaited before the next one starts, so every transform
    /// sees the counters left by all earlier nodes.
    fn visit_level_sequential<'a>(
        &'a self,
        entries: &'a [TreeEntry],
        stats: &'a mut RenameStats,
        cancel: Option<&'a AtomicBool>,
    ) -> LevelFuture<'a> {
        async move {
            let mut planned = Vec::with_capacity(entries.len());
            for entry in entries {
                if is_cancelled(cancel) {
                    return None;
                }
                let mut node = RenameEntry::unchanged(entry);
                if let Some(candidate) = self.composer.begin(&entry.info, stats) {
                    let outcome = candidate.await;
                    node.rename = self.composer.finish(&entry.info, outcome, stats);
                }
                if let Some(subs) = &entry.sub_entries {
                    node.sub_entries = Some(self.visit_level_sequential(subs, stats, cancel).await?);
                }
                planned.push(node);
            }
            Some(planned)
        }
        .boxed()
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Plan `entries` synchronously with the default pipeline engine.
pub fn plan_renames(
    entries: &[TreeEntry],
    roots: &[PathBuf],
    search: &SearchSettings,
    replace: &ReplaceSettings,
) -> Vec<RenameEntry> {
    Planner::new(roots, search, replace, &PipelineEngine).plan(entries)
}

/// Plan `entries` asynchronously with the default pipeline engine.
pub async fn plan_renames_async(
    entries: &[TreeEntry],
    roots: &[PathBuf],
    search: &SearchSettings,
    replace: &ReplaceSettings,
) -> Vec<RenameEntry> {
    Planner::new(roots, search, replace, &PipelineEngine)
        .plan_async(entries)
        .await
}
