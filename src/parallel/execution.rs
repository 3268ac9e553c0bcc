use super::core::{FailurePolicy, PoolConfig, PoolKind};
use super::lifecycle::{StopHandle, WorkerExit};
use super::progress::{ProgressState, ProgressTracker, print_in_place};
use super::queue::SharedWorkQueue;
use super::results::{ResultRecord, ResultStore};
use super::work::WorkItem;
use std::any::Any;
use std::borrow::Borrow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, warn};

/// The user callback, shared by every worker thread of a pool.
///
/// `Ok(None)` is a successful item with nothing to cache.
pub type WorkerFn<V, R> = Arc<dyn Fn(&WorkItem<V>) -> anyhow::Result<Option<R>> + Send + Sync>;

/// Where a worker takes its items from
pub(crate) trait WorkSource<V> {
    type Item: Borrow<WorkItem<V>>;

    fn next_item(&mut self) -> Option<Self::Item>;

    /// Nothing left to take. Sources only shrink during a run, so once this
    /// holds it keeps holding.
    fn is_drained(&self) -> bool;
}

/// A static worker's bucket
impl<'a, V> WorkSource<V> for std::slice::Iter<'a, WorkItem<V>> {
    type Item = &'a WorkItem<V>;

    fn next_item(&mut self) -> Option<Self::Item> {
        self.next()
    }

    fn is_drained(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// The dynamic pool's queue. Pulling never consults `is_drained`; it only
/// classifies how a worker exited.
impl<V> WorkSource<V> for &SharedWorkQueue<WorkItem<V>> {
    type Item = WorkItem<V>;

    fn next_item(&mut self) -> Option<Self::Item> {
        self.try_pop()
    }

    fn is_drained(&self) -> bool {
        self.is_empty()
    }
}

impl<V, S: WorkSource<V> + ?Sized> WorkSource<V> for &mut S {
    type Item = S::Item;

    fn next_item(&mut self) -> Option<Self::Item> {
        (**self).next_item()
    }

    fn is_drained(&self) -> bool {
        (**self).is_drained()
    }
}

/// Everything worker threads write, behind one lock per pool
pub(crate) struct Tally<V, R> {
    pub progress: ProgressTracker,
    pub results: ResultStore<V, R>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemOutcome {
    Completed,
    Failed,
}

/// State shared between a pool and its worker threads
pub(crate) struct RunShared<V, R> {
    kind: PoolKind,
    policy: FailurePolicy,
    verbose: AtomicBool,
    stop: StopHandle,
    tally: Mutex<Tally<V, R>>,
}

impl<V, R> RunShared<V, R> {
    pub fn new(kind: PoolKind, config: &PoolConfig, total: usize, workers: usize) -> Self {
        Self {
            kind,
            policy: config.failure_policy,
            verbose: AtomicBool::new(config.verbose),
            stop: StopHandle::default(),
            tally: Mutex::new(Tally {
                progress: ProgressTracker::new(kind.label(), total, workers),
                results: ResultStore::new(config.cache_results),
            }),
        }
    }

    pub fn stop_handle(&self) -> &StopHandle {
        &self.stop
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    /// Worker panics are contained per item, so a poisoned lock still holds
    /// consistent counters
    pub fn tally(&self) -> MutexGuard<'_, Tally<V, R>> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn progress(&self) -> ProgressState {
        self.tally().progress.state()
    }

    /// Back to empty defaults after a clear
    pub fn reset(&self) {
        let mut tally = self.tally();
        tally.progress.reset(0, 0);
        tally.results.clear();
        tally.results.set_enabled(true);
        drop(tally);
        self.set_verbose(false);
        self.stop.reset();
    }

    /// Run one worker: pull items from `source` until it is drained.
    ///
    /// The stop flag is polled before every pull, so a stopped worker never
    /// takes an item it will not run. A worker whose source is already
    /// drained reports `Finished` even when it then sees a stop or a failure.
    pub fn drive<S>(&self, worker: &WorkerFn<V, R>, worker_id: usize, mut source: S) -> WorkerExit
    where
        V: Clone,
        S: WorkSource<V>,
    {
        let mut sequence_index = 0;
        loop {
            if self.stop.is_stopped() {
                if source.is_drained() {
                    return WorkerExit::Finished;
                }
                debug!(
                    pool = self.kind.label(),
                    worker = worker_id,
                    "Stop requested, worker exiting"
                );
                return WorkerExit::Stopped;
            }
            let Some(item) = source.next_item() else {
                return WorkerExit::Finished;
            };

            let outcome = self.run_item(worker, worker_id, sequence_index, item.borrow());
            sequence_index += 1;

            if outcome == ItemOutcome::Failed && self.policy == FailurePolicy::AbortWorker {
                if source.is_drained() {
                    return WorkerExit::Finished;
                }
                warn!(
                    pool = self.kind.label(),
                    worker = worker_id,
                    "Worker aborted after a failed item"
                );
                return WorkerExit::Aborted;
            }
        }
    }

    fn run_item(
        &self,
        worker: &WorkerFn<V, R>,
        worker_id: usize,
        sequence_index: usize,
        item: &WorkItem<V>,
    ) -> ItemOutcome
    where
        V: Clone,
    {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| worker(item)));
        let elapsed = started.elapsed();

        let mut tally = self.tally();
        match result {
            Ok(Ok(value)) => {
                if let Some(return_value) = value
                    && tally.results.is_enabled()
                {
                    tally.results.append(
                        worker_id,
                        ResultRecord {
                            parameter: item.clone(),
                            sequence_index,
                            return_value,
                        },
                    );
                }
                let line = tally.progress.record(elapsed);
                if self.is_verbose() {
                    print_in_place(&line);
                }
                ItemOutcome::Completed
            }
            Ok(Err(err)) => {
                tally.progress.record_failure();
                drop(tally);
                error!(
                    pool = self.kind.label(),
                    worker = worker_id,
                    index = sequence_index,
                    "Worker callback failed: {err:#}"
                );
                ItemOutcome::Failed
            }
            Err(payload) => {
                tally.progress.record_failure();
                drop(tally);
                error!(
                    pool = self.kind.label(),
                    worker = worker_id,
                    index = sequence_index,
                    "Worker callback panicked: {}",
                    panic_message(payload.as_ref())
                );
                ItemOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
