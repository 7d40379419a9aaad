//! Background planning with last-write-wins semantics.
//!
//! Every [`PlanWorker::submit`] starts an async walk on its own named thread
//! and raises the cancel flag of the walk before it. A finished walk only
//! publishes its forest if no newer request has been submitted in the
//! meantime, so a slow, stale walk can never overwrite a fresher plan.
use super::Planner;
use crate::model::{count_renames, ReplaceSettings, RenameEntry, SearchSettings, TreeEntry};
use crate::transform::{PipelineEngine, ScriptEngine};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Inputs of one planning walk.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub entries: Arc<Vec<TreeEntry>>,
    pub roots: Vec<PathBuf>,
    pub search: SearchSettings,
    pub replace: ReplaceSettings,
}

/// A published plan.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Generation returned by the `submit` call that produced this plan.
    pub generation: u64,
    pub entries: Vec<RenameEntry>,
    /// Number of proposed renames in `entries`.
    pub renames: usize,
    pub elapsed: Duration,
}

/// State shared between the worker handle and its planning threads.
struct Shared {
    /// Generation of the most recent submission.
    current: AtomicU64,
    /// Newest published plan not yet handed out.
    latest: Mutex<Option<PlanOutcome>>,
}

/// Runs planning walks off the caller's thread, keeping only the newest.
pub struct PlanWorker {
    engine: Arc<dyn ScriptEngine>,
    shared: Arc<Shared>,
    /// Cancel flag of the most recent walk.
    cancel_flag: Option<Arc<AtomicBool>>,
    done_tx: Sender<u64>,
    done_rx: Receiver<u64>,
}

impl Default for PlanWorker {
    fn default() -> Self {
        Self::new(Arc::new(PipelineEngine))
    }
}

impl PlanWorker {
    pub fn new(engine: Arc<dyn ScriptEngine>) -> Self {
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        Self {
            engine,
            shared: Arc::new(Shared {
                current: AtomicU64::new(0),
                latest: Mutex::new(None),
            }),
            cancel_flag: None,
            done_tx,
            done_rx,
        }
    }

    /// Generation of the most recent submission (0 before the first).
    pub fn current_generation(&self) -> u64 {
        self.shared.current.load(Ordering::SeqCst)
    }

    /// Start planning `request`, superseding any walk still in flight.
    ///
    /// Returns the generation assigned to this request.
    pub fn submit(&mut self, request: PlanRequest) -> io::Result<u64> {
        if let Some(previous) = self.cancel_flag.take() {
            previous.store(true, Ordering::Relaxed);
        }

        let generation = self.shared.current.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel_flag.clone();
        let shared = self.shared.clone();
        let engine = self.engine.clone();
        let done_tx = self.done_tx.clone();

        thread::Builder::new()
            .name(format!("namewright-plan-{generation}"))
            .spawn(move || {
                let start = Instant::now();
                let walk = panic::catch_unwind(AssertUnwindSafe(|| {
                    let planner = Planner::new(
                        &request.roots,
                        &request.search,
                        &request.replace,
                        engine.as_ref(),
                    );
                    futures::executor::block_on(
                        planner.plan_async_cancellable(&request.entries, &cancel_clone),
                    )
                }));
                let planned = match walk {
                    Ok(planned) => planned,
                    Err(_) => {
                        error!(generation, "Planning walk panicked; no plan published");
                        return;
                    }
                };
                let Some(entries) = planned else {
                    debug!(generation, "Plan superseded before completion");
                    return;
                };

                let outcome = PlanOutcome {
                    generation,
                    renames: count_renames(&entries),
                    entries,
                    elapsed: start.elapsed(),
                };

                {
                    let mut latest = shared.latest.lock();
                    if shared.current.load(Ordering::SeqCst) != generation {
                        debug!(generation, "Discarding stale plan");
                        return;
                    }
                    info!(
                        generation,
                        renames = outcome.renames,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "Plan ready"
                    );
                    *latest = Some(outcome);
                }
                let _ = done_tx.send(generation);
            })?;

        self.cancel_flag = Some(cancel_flag);
        Ok(generation)
    }

    /// Take the newest published plan, if one is waiting.
    pub fn try_latest(&self) -> Option<PlanOutcome> {
        // Notifications only wake waiters; the slot is the source of truth.
        while self.done_rx.try_recv().is_ok() {}
        self.take_current()
    }

    /// Block up to `timeout` for a plan to be published.
    pub fn wait_latest(&self, timeout: Duration) -> Option<PlanOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = self.try_latest() {
                return Some(outcome);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if self.done_rx.recv_timeout(remaining).is_err() {
                return self.take_current();
            }
        }
    }

    fn take_current(&self) -> Option<PlanOutcome> {
        let mut latest = self.shared.latest.lock();
        match latest.take() {
            Some(outcome) if outcome.generation == self.current_generation() => Some(outcome),
            Some(outcome) => {
                debug!(generation = outcome.generation, "Dropping superseded plan");
                None
            }
            None => None,
        }
    }
}

impl Drop for PlanWorker {
    fn drop(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{from_fn, Transform, TransformError, TransformFuture};
    use futures::FutureExt;

    fn request(search: &str, replace: &str) -> PlanRequest {
        PlanRequest {
            entries: Arc::new(vec![TreeEntry::dir(
                "/r",
                vec![TreeEntry::file("/r/alpha.txt"), TreeEntry::file("/r/beta.txt")],
            )]),
            roots: vec![PathBuf::from("/r")],
            search: SearchSettings::literal(search),
            replace: ReplaceSettings::literal(replace),
        }
    }

    #[test]
    fn test_single_plan_is_delivered_once() {
        let mut worker = PlanWorker::default();
        let generation = worker.submit(request("a", "4")).unwrap();
        let outcome = worker.wait_latest(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.generation, generation);
        assert_eq!(outcome.renames, 2);
        assert!(worker.try_latest().is_none());
    }

    /// Transforms containing "slow" sleep before resolving, simulating a
    /// walk that finishes after a newer one was submitted.
    struct SlowEngine;

    impl ScriptEngine for SlowEngine {
        fn compile(&self, source: &str) -> Result<Arc<dyn Transform>, TransformError> {
            let delay = if source.contains("slow") { 300 } else { 0 };
            let tag = source.to_string();
            Ok(from_fn(move |call, _ctx| -> TransformFuture {
                std::thread::sleep(Duration::from_millis(delay));
                futures::future::ready(Ok(format!("{tag}-{}", call.matched))).boxed()
            }))
        }
    }

    #[test]
    fn test_newer_request_wins() {
        let mut worker = PlanWorker::new(Arc::new(SlowEngine));
        let mut slow = request("slow", "");
        slow.search = SearchSettings::function("slow");
        let mut fast = request("fast", "");
        fast.search = SearchSettings::function("fast");

        worker.submit(slow).unwrap();
        let newest = worker.submit(fast).unwrap();

        let outcome = worker.wait_latest(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.generation, newest);
        assert_eq!(outcome.entries[0].rename.as_deref(), Some("fast-r"));

        // Give the slow walk time to finish; it must not surface.
        std::thread::sleep(Duration::from_millis(800));
        assert!(worker.try_latest().is_none());
    }

    /// Panics while compiling any source containing "boom".
    struct PanickingEngine;

    impl ScriptEngine for PanickingEngine {
        fn compile(&self, source: &str) -> Result<Arc<dyn Transform>, TransformError> {
            if source.contains("boom") {
                panic!("engine failure");
            }
            PipelineEngine.compile(source)
        }
    }

    #[test]
    fn test_panicking_walk_publishes_nothing() {
        let mut worker = PlanWorker::new(Arc::new(PanickingEngine));
        let mut broken = request("", "");
        broken.search = SearchSettings::function("boom");
        worker.submit(broken).unwrap();
        assert!(worker.wait_latest(Duration::from_millis(300)).is_none());

        let mut fine = request("", "");
        fine.search = SearchSettings::function("upper");
        let generation = worker.submit(fine).unwrap();
        let outcome = worker.wait_latest(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.generation, generation);
        assert_eq!(outcome.entries[0].rename.as_deref(), Some("R"));
    }

    #[test]
    fn test_wait_times_out_without_submission() {
        let worker = PlanWorker::default();
        assert!(worker.wait_latest(Duration::from_millis(20)).is_none());
        assert_eq!(worker.current_generation(), 0);
    }
}
