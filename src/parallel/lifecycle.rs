//! Lifecycle shared by both pool kinds.
//!
//! ```text
//! Configured --bind--> WorkerBound --start--> Running --sync--> Synced(Completed | Stopped)
//!      ^                                                              |
//!      +------------------------------ clear -------------------------+
//! ```
//!
//! `clear` is accepted from every state. Rust threads cannot be created in a
//! suspended state, so binding prepares one thread body per worker and
//! `start` spawns them.

use crate::error::PoolError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Configured,
    WorkerBound,
    Running,
    /// All threads joined; terminal until the pool is cleared
    Synced(RunOutcome),
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Configured => f.write_str("configured"),
            PoolState::WorkerBound => f.write_str("worker-bound"),
            PoolState::Running => f.write_str("running"),
            PoolState::Synced(outcome) => write!(f, "synced ({outcome})"),
        }
    }
}

/// How a run ended, as observed by `sync`.
///
/// When workers ended for different reasons, `Stopped` wins over `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every worker drained its work source
    Completed,
    /// At least one worker left work behind because a stop was requested
    Stopped,
    /// At least one worker ended at a failed item while its source still
    /// held work ([`FailurePolicy::AbortWorker`](super::FailurePolicy::AbortWorker))
    Aborted,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Stopped => f.write_str("stopped"),
            RunOutcome::Aborted => f.write_str("aborted"),
        }
    }
}

/// Why a worker thread returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Finished,
    Stopped,
    Aborted,
}

/// Cooperative stop flag of one pool.
///
/// Clones share the flag, so a handle taken before `sync` can stop the pool
/// from another thread. Workers poll it before each item; an item already
/// running is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub(crate) type ThreadBody = Box<dyn FnOnce() -> WorkerExit + Send + 'static>;

/// Owns the prepared thread bodies and the join handles of a running pool
pub(crate) struct Lifecycle {
    thread_prefix: &'static str,
    state: PoolState,
    pending: Vec<ThreadBody>,
    handles: Vec<JoinHandle<WorkerExit>>,
}

impl Lifecycle {
    pub fn new(thread_prefix: &'static str) -> Self {
        Self {
            thread_prefix,
            state: PoolState::Configured,
            pending: Vec::new(),
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn thread_count(&self) -> usize {
        self.pending.len() + self.handles.len()
    }

    pub fn bind(&mut self, bodies: Vec<ThreadBody>) -> Result<(), PoolError> {
        if self.state != PoolState::Configured {
            return Err(PoolError::invalid_state("bind a worker", self.state));
        }
        self.pending = bodies;
        self.state = PoolState::WorkerBound;
        Ok(())
    }

    /// Spawn every prepared thread.
    ///
    /// If the OS refuses a thread, the ones already spawned keep running and
    /// the pool stays `Running`, so it can still be stopped and synced.
    pub fn start(&mut self) -> Result<usize, PoolError> {
        if self.state != PoolState::WorkerBound {
            return Err(PoolError::invalid_state("start", self.state));
        }
        self.state = PoolState::Running;

        for (worker_id, body) in self.pending.drain(..).enumerate() {
            let handle = thread::Builder::new()
                .name(format!("{}-{}", self.thread_prefix, worker_id))
                .spawn(body)
                .map_err(|source| PoolError::Spawn { worker_id, source })?;
            self.handles.push(handle);
        }
        Ok(self.handles.len())
    }

    /// Block until every spawned thread has returned
    pub fn join(&mut self) -> Result<RunOutcome, PoolError> {
        match self.state {
            PoolState::Running => {}
            PoolState::Synced(outcome) => return Ok(outcome),
            state => return Err(PoolError::invalid_state("sync", state)),
        }

        let mut stopped = false;
        let mut aborted = false;
        for (worker_id, handle) in self.handles.drain(..).enumerate() {
            match handle.join() {
                Ok(WorkerExit::Finished) => debug!(worker = worker_id, "worker finished"),
                Ok(WorkerExit::Stopped) => stopped = true,
                Ok(WorkerExit::Aborted) => aborted = true,
                Err(_) => warn!(worker = worker_id, "worker thread panicked"),
            }
        }

        let outcome = if stopped {
            RunOutcome::Stopped
        } else if aborted {
            RunOutcome::Aborted
        } else {
            RunOutcome::Completed
        };
        self.state = PoolState::Synced(outcome);
        Ok(outcome)
    }

    /// Join anything still running and return to `Configured`.
    ///
    /// The caller raises the stop flag first so the join is bounded by the
    /// items currently in flight.
    pub fn shutdown(&mut self) {
        if self.state == PoolState::Running {
            let _ = self.join();
        }
        self.pending.clear();
        self.state = PoolState::Configured;
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_bodies(counter: &Arc<AtomicUsize>, n: usize) -> Vec<ThreadBody> {
        (0..n)
            .map(|_| {
                let counter = counter.clone();
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    WorkerExit::Finished
                }) as ThreadBody
            })
            .collect()
    }

    #[test]
    fn test_full_lifecycle() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = Lifecycle::new("test-worker");
        assert_eq!(lifecycle.state(), PoolState::Configured);

        lifecycle.bind(counting_bodies(&counter, 3)).unwrap();
        assert_eq!(lifecycle.state(), PoolState::WorkerBound);
        assert_eq!(lifecycle.thread_count(), 3);

        assert_eq!(lifecycle.start().unwrap(), 3);
        assert_eq!(lifecycle.state(), PoolState::Running);

        assert_eq!(lifecycle.join().unwrap(), RunOutcome::Completed);
        assert_eq!(lifecycle.state(), PoolState::Synced(RunOutcome::Completed));
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        // A second sync is a no-op
        assert_eq!(lifecycle.join().unwrap(), RunOutcome::Completed);
    }

    #[test]
    fn test_invalid_transitions() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = Lifecycle::new("test-worker");

        assert!(matches!(
            lifecycle.start(),
            Err(PoolError::InvalidState { operation: "start", .. })
        ));
        assert!(matches!(
            lifecycle.join(),
            Err(PoolError::InvalidState { operation: "sync", .. })
        ));

        lifecycle.bind(counting_bodies(&counter, 1)).unwrap();
        assert!(lifecycle.bind(counting_bodies(&counter, 1)).is_err());

        lifecycle.start().unwrap();
        assert!(matches!(
            lifecycle.start(),
            Err(PoolError::InvalidState {
                state: PoolState::Running,
                ..
            })
        ));
        lifecycle.join().unwrap();
    }

    #[test]
    fn test_stopped_exit_marks_outcome() {
        let mut lifecycle = Lifecycle::new("test-worker");
        let bodies: Vec<ThreadBody> = vec![
            Box::new(|| WorkerExit::Finished),
            Box::new(|| WorkerExit::Stopped),
        ];
        lifecycle.bind(bodies).unwrap();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.join().unwrap(), RunOutcome::Stopped);
    }

    #[test]
    fn test_aborted_exit_marks_outcome() {
        let mut lifecycle = Lifecycle::new("test-worker");
        let bodies: Vec<ThreadBody> = vec![
            Box::new(|| WorkerExit::Finished),
            Box::new(|| WorkerExit::Aborted),
        ];
        lifecycle.bind(bodies).unwrap();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.join().unwrap(), RunOutcome::Aborted);
        assert_eq!(lifecycle.state().to_string(), "synced (aborted)");
    }

    #[test]
    fn test_stop_outranks_abort() {
        let mut lifecycle = Lifecycle::new("test-worker");
        let bodies: Vec<ThreadBody> = vec![
            Box::new(|| WorkerExit::Aborted),
            Box::new(|| WorkerExit::Stopped),
        ];
        lifecycle.bind(bodies).unwrap();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.join().unwrap(), RunOutcome::Stopped);
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RunOutcome::Aborted).unwrap(), "aborted");
        assert_eq!(serde_json::to_value(RunOutcome::Completed).unwrap(), "completed");
    }

    #[test]
    fn test_shutdown_resets_from_any_state() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = Lifecycle::new("test-worker");
        lifecycle.bind(counting_bodies(&counter, 2)).unwrap();
        lifecycle.shutdown();
        assert_eq!(lifecycle.state(), PoolState::Configured);
        assert_eq!(lifecycle.thread_count(), 0);

        lifecycle.bind(counting_bodies(&counter, 2)).unwrap();
        lifecycle.start().unwrap();
        lifecycle.shutdown();
        assert_eq!(lifecycle.state(), PoolState::Configured);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let handle = StopHandle::default();
        let clone = handle.clone();
        assert!(!handle.is_stopped());
        clone.stop();
        assert!(handle.is_stopped());
        handle.reset();
        assert!(!clone.is_stopped());
    }
}
