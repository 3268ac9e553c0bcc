use super::core::{PoolConfig, PoolKind};
use super::execution::{RunShared, WorkerFn};
use super::lifecycle::{Lifecycle, PoolState, RunOutcome, StopHandle, ThreadBody};
use super::progress::ProgressState;
use super::queue::SharedWorkQueue;
use super::results::ResultSnapshot;
use super::work::WorkItem;
use crate::error::PoolError;
use std::sync::Arc;
use tracing::{debug, info};

/// Worker pool whose threads compete for items from one shared queue.
///
/// Whichever worker is free first takes the next item, so uneven item cost
/// balances itself out. There is no ordering guarantee between items.
pub struct DynamicWorkerPool<V, R> {
    queue: Arc<SharedWorkQueue<WorkItem<V>>>,
    threads: usize,
    shared: Arc<RunShared<V, R>>,
    lifecycle: Lifecycle,
}

impl<V, R> DynamicWorkerPool<V, R>
where
    V: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new(work: Vec<WorkItem<V>>, config: PoolConfig) -> Result<Self, PoolError> {
        let total = work.len();
        let threads = config.resolve_threads(total)?;
        info!("Using {threads} threads.");

        Ok(Self {
            queue: Arc::new(SharedWorkQueue::new(work)),
            threads,
            shared: Arc::new(RunShared::new(PoolKind::Dynamic, &config, total, threads)),
            lifecycle: Lifecycle::new(PoolKind::Dynamic.thread_prefix()),
        })
    }

    /// Bind the callback and prepare the worker threads.
    ///
    /// Argument passing is the same as
    /// [`StaticWorkerPool::bind_worker`](super::StaticWorkerPool::bind_worker).
    pub fn bind_worker<F>(&mut self, worker: F) -> Result<(), PoolError>
    where
        F: Fn(&WorkItem<V>) -> anyhow::Result<Option<R>> + Send + Sync + 'static,
    {
        if self.lifecycle.state() != PoolState::Configured {
            return Err(PoolError::invalid_state("bind a worker", self.lifecycle.state()));
        }
        if self.threads == 0 {
            return Err(PoolError::InvalidConfiguration(
                "pool has no worker threads; it was cleared".to_string(),
            ));
        }

        let worker: WorkerFn<V, R> = Arc::new(worker);
        let bodies = (0..self.threads)
            .map(|worker_id| {
                let shared = self.shared.clone();
                let queue = self.queue.clone();
                let worker = worker.clone();
                Box::new(move || shared.drive(&worker, worker_id, queue.as_ref()))
                    as ThreadBody
            })
            .collect();

        self.lifecycle.bind(bodies)
    }

    pub fn start(&mut self) -> Result<(), PoolError> {
        let started = self.lifecycle.start()?;
        debug!(threads = started, queued = self.queue.len(), "Dynamic pool started");
        Ok(())
    }

    /// Block until the queue is exhausted (or the stop took effect) and every
    /// worker has terminated
    pub fn sync(&mut self) -> Result<RunOutcome, PoolError> {
        let outcome = self.lifecycle.join()?;
        if self.shared.is_verbose() {
            println!();
        }
        info!("All threads synchronized.");
        Ok(outcome)
    }

    /// Ask every worker to stop before taking its next item; items still
    /// queued stay in the queue
    pub fn stop_all(&self) {
        self.shared.stop_handle().stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.shared.stop_handle().clone()
    }

    /// Stop, join, drop the queued items, and reset to an empty, unbound pool
    pub fn clear(&mut self) {
        self.shared.stop_handle().stop();
        self.lifecycle.shutdown();
        let discarded = self.queue.clear();
        debug!(discarded, "Work queue cleared");
        self.threads = 0;
        self.shared.reset();
    }

    /// Copy of the items still queued, in FIFO order.
    ///
    /// Not available while workers are running.
    pub fn queue_snapshot(&self) -> Result<Vec<WorkItem<V>>, PoolError> {
        if self.lifecycle.state() == PoolState::Running {
            return Err(PoolError::invalid_state(
                "snapshot the work queue",
                PoolState::Running,
            ));
        }
        Ok(self.queue.snapshot())
    }

    /// Number of items not yet taken by a worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn results(&self) -> Result<ResultSnapshot<V, R>, PoolError>
    where
        R: Clone,
    {
        self.shared.tally().results.snapshot()
    }

    pub fn return_values(&self) -> Result<Vec<R>, PoolError>
    where
        R: Clone,
    {
        self.shared.tally().results.return_values()
    }

    pub fn progress(&self) -> ProgressState {
        self.shared.progress()
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.shared.set_verbose(verbose);
    }

    pub fn state(&self) -> PoolState {
        self.lifecycle.state()
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }
}

impl<V, R> Drop for DynamicWorkerPool<V, R> {
    fn drop(&mut self) {
        self.shared.stop_handle().stop();
    }
}
