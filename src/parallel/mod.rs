//! Worker-pool execution engine
//!
//! Runs a user callback over every item of a finite work collection on a
//! bounded set of OS threads, with progress tracking, optional capture of
//! return values, and cooperative cancellation.
//!
//! # Strategies
//!
//! - [`StaticWorkerPool`]: the collection is split round robin into one
//!   bucket per thread up front. Each thread walks its bucket in order.
//! - [`DynamicWorkerPool`]: all items sit in one [`SharedWorkQueue`]; threads
//!   pop the next item whenever they are free.
//!
//! # Data Flow
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────────────┐   ┌────────────────┐
//! │ Work items   │──▶│ ThreadCount │──▶│ Partition (static) │──▶│ Worker threads │
//! │ Positional / │   │ resolver    │   │ Queue (dynamic)    │   │ callback/item  │
//! │ Named        │   └─────────────┘   └────────────────────┘   └───────┬────────┘
//! └──────────────┘                                                      │ one lock
//!                                                             ┌─────────▼─────────┐
//!                                                             │ ProgressTracker + │
//!                                                             │ ResultStore       │
//!                                                             └───────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `new` → `bind_worker` → `start` → `sync`, with `stop_all` and `clear`
//! available throughout. See [`lifecycle`] for the state machine.
//!
//! # Failure Containment
//!
//! A callback failure (returned `Err` or panic) is logged and never reaches
//! the caller of `start`/`sync`. [`FailurePolicy`] decides whether the worker
//! moves on to its next item or ends; both pool kinds follow the same
//! policy. Nothing is retried.
//!
//! # Example
//!
//! ```rust
//! use workpool::parallel::{DynamicWorkerPool, PoolConfig, ThreadCount, WorkItem};
//!
//! let work = (0..10)
//!     .map(|i| WorkItem::named([("num1", i), ("num2", i + 10)]))
//!     .collect();
//! let mut pool = DynamicWorkerPool::new(work, PoolConfig::with_threads(ThreadCount::fixed(5)?))?;
//! pool.bind_worker(|item| Ok(Some(item.arg("num1")? * item.arg("num2")?)))?;
//! pool.start()?;
//! pool.sync()?;
//!
//! assert_eq!(pool.return_values()?.len(), 10);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod dynamic_pool;
mod execution;
pub mod lifecycle;
pub mod partition;
pub mod progress;
pub mod queue;
pub mod results;
pub mod static_pool;
pub mod threads;
pub mod work;

// Re-export main types for easier access
pub use self::core::{FailurePolicy, PoolConfig, PoolKind};
pub use dynamic_pool::DynamicWorkerPool;
pub use execution::WorkerFn;
pub use lifecycle::{PoolState, RunOutcome, StopHandle};
pub use partition::partition_round_robin;
pub use progress::{ProgressState, ProgressTracker};
pub use queue::SharedWorkQueue;
pub use results::{ResultRecord, ResultSnapshot, ResultStore, WorkerKey};
pub use static_pool::{ExternalThreads, StaticWorkerPool};
pub use threads::{ThreadCount, resolve_thread_count};
pub use work::{WorkItem, positional_work};
