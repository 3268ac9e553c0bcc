use super::threads::{ThreadCount, resolve_thread_count};
use crate::error::PoolError;
use serde::{Deserialize, Serialize};

/// Construction parameters shared by both pool kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Requested worker count (`"auto"` or a positive integer)
    pub threads: ThreadCount,
    /// Print the progress line after each completed item
    pub verbose: bool,
    /// Capture non-null return values in the result store
    pub cache_results: bool,
    pub failure_policy: FailurePolicy,
    /// Hardware concurrency used by auto resolution (`None` = detect)
    pub hardware_threads: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: ThreadCount::Auto,
            verbose: false,
            cache_results: true,
            failure_policy: FailurePolicy::SkipItem,
            hardware_threads: None,
        }
    }
}

impl PoolConfig {
    pub fn with_threads(threads: ThreadCount) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }

    /// Resolve the worker count for a collection of `item_count` items
    pub fn resolve_threads(&self, item_count: usize) -> Result<usize, PoolError> {
        let hardware_threads = match self.hardware_threads {
            Some(0) => {
                return Err(PoolError::InvalidConfiguration(
                    "hardware_threads must be positive".to_string(),
                ));
            }
            Some(n) => n,
            None => num_cpus::get(),
        };
        Ok(resolve_thread_count(
            self.threads,
            item_count,
            hardware_threads,
        ))
    }
}

/// What a worker does after its callback fails on an item.
///
/// Applies identically to static and dynamic pools. A failure is an `Err`
/// returned by the callback or a panic inside it; failed items are never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure and move on to the worker's next item
    #[default]
    SkipItem,
    /// Log the failure and end the worker thread; its remaining items are
    /// skipped (static) or left for the other workers (dynamic)
    AbortWorker,
}

/// Which distribution strategy a pool uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Static,
    Dynamic,
}

impl PoolKind {
    /// Name shown in the progress line
    pub fn label(self) -> &'static str {
        match self {
            PoolKind::Static => "StaticWorkerPool",
            PoolKind::Dynamic => "DynamicWorkerPool",
        }
    }

    pub(crate) fn thread_prefix(self) -> &'static str {
        match self {
            PoolKind::Static => "static-worker",
            PoolKind::Dynamic => "dynamic-worker",
        }
    }
}
