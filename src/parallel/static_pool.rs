use super::core::{PoolConfig, PoolKind};
use super::execution::{RunShared, WorkerFn};
use super::lifecycle::{Lifecycle, PoolState, RunOutcome, StopHandle, ThreadBody, WorkerExit};
use super::partition::partition_round_robin;
use super::progress::ProgressState;
use super::results::ResultSnapshot;
use super::work::WorkItem;
use crate::error::PoolError;
use std::sync::Arc;
use tracing::{debug, info};

/// Worker pool with work pre-partitioned round robin, one bucket per thread.
///
/// Each thread walks its own bucket in order, so items of one bucket never
/// run concurrently and need no synchronization between them. Buckets are
/// fixed at construction; a slow or stopped thread never hands work to
/// another.
///
/// ```
/// use workpool::parallel::{PoolConfig, StaticWorkerPool, ThreadCount, positional_work};
///
/// let config = PoolConfig::with_threads(ThreadCount::fixed(2)?);
/// let mut pool = StaticWorkerPool::new(positional_work(1..=6), config)?;
/// pool.bind_worker(|item| Ok(Some(item.value()? * 10)))?;
/// pool.start()?;
/// pool.sync()?;
///
/// let mut values = pool.return_values()?;
/// values.sort();
/// assert_eq!(values, vec![10, 20, 30, 40, 50, 60]);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct StaticWorkerPool<V, R> {
    partition: Arc<Vec<Vec<WorkItem<V>>>>,
    threads: usize,
    shared: Arc<RunShared<V, R>>,
    lifecycle: Lifecycle,
}

impl<V, R> StaticWorkerPool<V, R>
where
    V: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    /// Resolve the thread count and partition `work` across the threads
    pub fn new(work: Vec<WorkItem<V>>, config: PoolConfig) -> Result<Self, PoolError> {
        let total = work.len();
        let threads = config.resolve_threads(total)?;
        info!("Using {threads} threads.");

        let partition = partition_round_robin(work, threads);
        debug!(items = total, buckets = threads, "Work distributed");

        Ok(Self {
            partition: Arc::new(partition),
            threads,
            shared: Arc::new(RunShared::new(PoolKind::Static, &config, total, threads)),
            lifecycle: Lifecycle::new(PoolKind::Static.thread_prefix()),
        })
    }

    /// Bind the callback and prepare one thread per bucket.
    ///
    /// `Named` items reach the callback as named arguments
    /// ([`WorkItem::arg`]), `Positional` items as a single value
    /// ([`WorkItem::value`]).
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
                let partition = self.partition.clone();
                let worker = worker.clone();
                Box::new(move || {
                    let bucket = partition.get(worker_id).map(Vec::as_slice).unwrap_or_default();
                    shared.drive(&worker, worker_id, bucket.iter())
                }) as ThreadBody
            })
            .collect();

        self.lifecycle.bind(bodies)
    }

    /// Launch every worker thread
    pub fn start(&mut self) -> Result<(), PoolError> {
        let started = self.lifecycle.start()?;
        debug!(threads = started, "Static pool started");
        Ok(())
    }

    /// Block until every worker thread has terminated.
    ///
    /// Returns normally whether threads drained their buckets, failed, or
    /// stopped early; inspect [`progress`](Self::progress) or the results to
    /// detect partial failure.
    pub fn sync(&mut self) -> Result<RunOutcome, PoolError> {
        let outcome = self.lifecycle.join()?;
        self.finish_line();
        Ok(outcome)
    }

    /// Ask every worker to stop before its next item
    pub fn stop_all(&self) {
        self.shared.stop_handle().stop();
    }

    /// Handle for stopping the pool from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.shared.stop_handle().clone()
    }

    /// Stop, join, and reset the pool to an empty, unbound state.
    ///
    /// Work, partition, thread count, progress and cached results are
    /// discarded; caching returns to enabled and verbosity to off.
    pub fn clear(&mut self) {
        self.shared.stop_handle().stop();
        self.lifecycle.shutdown();
        self.partition = Arc::new(Vec::new());
        self.threads = 0;
        self.shared.reset();
    }

    pub fn partition(&self) -> &[Vec<WorkItem<V>>] {
        &self.partition
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

    /// Prepare caller-managed threads: `body` runs once per bucket of
    /// `partition`, on its own thread.
    ///
    /// The returned handles bypass the pool's callback, progress and result
    /// store; drive them with [`start_external`](Self::start_external) and
    /// [`sync_external`](Self::sync_external). `partition` must have exactly
    /// one bucket per resolved thread.
    pub fn external_threads<T, F>(
        &self,
        body: F,
        partition: Vec<Vec<T>>,
    ) -> Result<ExternalThreads, PoolError>
    where
        T: Send + 'static,
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        if self.threads == 0 {
            return Err(PoolError::InvalidConfiguration(
                "pool has no worker threads; it was cleared".to_string(),
            ));
        }
        if partition.len() != self.threads {
            return Err(PoolError::InvalidConfiguration(format!(
                "external partition has {} buckets but the pool resolved {} threads",
                partition.len(),
                self.threads
            )));
        }

        let body = Arc::new(body);
        let bodies = partition
            .into_iter()
            .map(|bucket| {
                let body = body.clone();
                Box::new(move || {
                    body(bucket);
                    WorkerExit::Finished
                }) as ThreadBody
            })
            .collect();

        let mut lifecycle = Lifecycle::new("external-worker");
        lifecycle.bind(bodies)?;
        Ok(ExternalThreads { lifecycle })
    }

    pub fn start_external(&self, threads: &mut ExternalThreads) -> Result<(), PoolError> {
        let started = threads.lifecycle.start()?;
        debug!(threads = started, "External threads started");
        Ok(())
    }

    pub fn sync_external(&self, threads: &mut ExternalThreads) -> Result<RunOutcome, PoolError> {
        let outcome = threads.lifecycle.join()?;
        self.finish_line();
        Ok(outcome)
    }

    fn finish_line(&self) {
        if self.shared.is_verbose() {
            println!();
        }
        info!("All threads synchronized.");
    }
}

impl<V, R> Drop for StaticWorkerPool<V, R> {
    fn drop(&mut self) {
        self.shared.stop_handle().stop();
    }
}

/// Opaque collection of caller-managed threads built by
/// [`StaticWorkerPool::external_threads`]
pub struct ExternalThreads {
    lifecycle: Lifecycle,
}

impl ExternalThreads {
    pub fn len(&self) -> usize {
        self.lifecycle.thread_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> PoolState {
        self.lifecycle.state()
    }
}
