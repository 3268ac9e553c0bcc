//! # workpool - bounded worker pools for finite workloads
//!
//! workpool runs a caller-supplied callback over every item of a finite work
//! collection using a fixed number of OS threads:
//!
//! - **Static distribution**: items are partitioned round robin up front, one
//!   bucket per worker
//! - **Dynamic distribution**: workers pull from a shared queue until it is
//!   exhausted, so fast workers take more items
//! - **Progress tracking**: completion counts with a naive ETA, optionally
//!   rewritten in place on the terminal
//! - **Result capture**: return values grouped by worker, in processing order
//! - **Cooperative stop**: workers finish their current item and exit
//!
//! ## Quick Start
//!
//! ```
//! use workpool::{DynamicWorkerPool, PoolConfig, RunOutcome, ThreadCount, positional_work};
//!
//! let work = positional_work(1..=20);
//! let config = PoolConfig::with_threads(ThreadCount::fixed(4).unwrap());
//! let mut pool = DynamicWorkerPool::new(work, config).unwrap();
//!
//! pool.bind_worker(|item| Ok(Some(item.value()? * 2))).unwrap();
//! pool.start().unwrap();
//! assert_eq!(pool.sync().unwrap(), RunOutcome::Completed);
//!
//! let mut doubled = pool.return_values().unwrap();
//! doubled.sort();
//! assert_eq!(doubled, (1..=20).map(|n| n * 2).collect::<Vec<_>>());
//! ```
//!
//! ## Command line
//!
//! ```bash
//! workpool run --items 40 --strategy dynamic --threads auto -v
//! workpool config show --format json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parallel;

pub use cli::{Cli, Output};
pub use config::WorkpoolConfig;
pub use error::{ArgumentError, PoolError};
pub use parallel::{
    DynamicWorkerPool, FailurePolicy, PoolConfig, PoolState, ProgressState, ResultRecord,
    ResultSnapshot, RunOutcome, StaticWorkerPool, StopHandle, ThreadCount, WorkItem, WorkerKey,
    positional_work,
};

/// Result type alias for workpool operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
