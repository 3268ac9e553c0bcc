//! Configuration management for workpool
//!
//! Settings are layered with figment: embedded defaults, then user and
//! repository files in TOML, JSON or YAML, then `WORKPOOL_*` environment
//! variables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod core;

pub use self::core::WorkpoolConfig;

/// Work distribution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Round-robin buckets, one per thread
    Static,
    /// Shared queue, first free worker takes the next item
    Dynamic,
}

/// How `run` prints the result store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunFormat {
    Text,
    Json,
}

/// Defaults for the `run` command, from the `[run]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub strategy: Strategy,
    /// Size of the generated `1..=items` workload
    pub items: usize,
    /// Simulated work per item
    pub delay_ms: u64,
    pub format: RunFormat,
}
