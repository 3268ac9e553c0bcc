//! Run command implementation
//!
//! Executes a demonstration workload: positional numbers are doubled, named
//! items yield the product of their numeric arguments. Each item sleeps for
//! `--delay-ms` first to stand in for real work.

use crate::cli::Output;
use crate::config::{RunFormat, Strategy, WorkpoolConfig};
use crate::parallel::{
    DynamicWorkerPool, FailurePolicy, ProgressState, ResultSnapshot, RunOutcome,
    StaticWorkerPool, StopHandle, ThreadCount, WorkItem, positional_work,
};
use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Generate the integers 1..=N as the work collection
    #[arg(short = 'n', long, value_name = "N")]
    pub items: Option<usize>,

    /// Read the work collection from a JSON array (numbers and/or objects)
    #[arg(short, long, value_name = "FILE", conflicts_with = "items")]
    pub input: Option<PathBuf>,

    /// Distribution strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Worker threads: "auto" or a positive integer
    #[arg(short, long)]
    pub threads: Option<ThreadCount>,

    /// Simulated work per item, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Do not capture return values
    #[arg(long)]
    pub no_cache: bool,

    /// End a worker at its first failed item instead of skipping the item
    #[arg(long)]
    pub abort_worker: bool,

    /// Request a cooperative stop after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub stop_after_ms: Option<u64>,

    /// Output format for the results
    #[arg(long, value_enum)]
    pub format: Option<RunFormat>,
}

type DemoSnapshot = ResultSnapshot<Value, Value>;

#[derive(Serialize)]
struct RunReport {
    outcome: RunOutcome,
    threads: usize,
    progress: ProgressState,
    results: Option<DemoSnapshot>,
}

pub fn execute(args: RunArgs, config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = WorkpoolConfig::load_with_custom_config(config_path)?;
    let defaults = config.run_defaults()?;

    let mut pool_config = config.pool_config()?;
    if let Some(threads) = args.threads {
        pool_config.threads = threads;
    }
    if args.no_cache {
        pool_config.cache_results = false;
    }
    if args.abort_worker {
        pool_config.failure_policy = FailurePolicy::AbortWorker;
    }
    let format = args.format.unwrap_or(defaults.format);
    if output.is_verbose() && format == RunFormat::Text {
        pool_config.verbose = true;
    }

    let work = match &args.input {
        Some(path) => load_work(path)?,
        None => {
            let items = args.items.unwrap_or(defaults.items) as u64;
            positional_work((1..=items).map(Value::from))
        }
    };
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(defaults.delay_ms));
    let strategy = args.strategy.unwrap_or(defaults.strategy);
    output.verbose(&format!(
        "Running {} items with the {strategy:?} strategy",
        work.len()
    ));

    let started = Instant::now();
    let report = match strategy {
        Strategy::Static => {
            let mut pool = StaticWorkerPool::new(work, pool_config)?;
            pool.bind_worker(demo_worker(delay))?;
            schedule_stop(args.stop_after_ms, pool.stop_handle());
            pool.start()?;
            let outcome = pool.sync()?;
            RunReport {
                outcome,
                progress: pool.progress(),
                threads: pool.thread_count(),
                results: pool.results().ok(),
            }
        }
        Strategy::Dynamic => {
            let mut pool = DynamicWorkerPool::new(work, pool_config)?;
            pool.bind_worker(demo_worker(delay))?;
            schedule_stop(args.stop_after_ms, pool.stop_handle());
            pool.start()?;
            let outcome = pool.sync()?;
            RunReport {
                outcome,
                progress: pool.progress(),
                threads: pool.thread_count(),
                results: pool.results().ok(),
            }
        }
    };

    match format {
        RunFormat::Json => print_json(&report, output),
        RunFormat::Text => {
            print_text(&report, output);
            output.table_row("Elapsed", &format!("{:.2}s", started.elapsed().as_secs_f64()));
            Ok(())
        }
    }
}

/// The callback bound to the pool
fn demo_worker(
    delay: Duration,
) -> impl Fn(&WorkItem<Value>) -> Result<Option<Value>> + Send + Sync + 'static {
    move |item| {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        match item {
            WorkItem::Positional(Value::Null) => Ok(None),
            WorkItem::Positional(value) => double(value).map(Some),
            WorkItem::Named(params) => product(params).map(Some),
        }
    }
}

fn double(value: &Value) -> Result<Value> {
    if let Some(n) = value.as_i64() {
        match n.checked_mul(2) {
            Some(doubled) => Ok(json!(doubled)),
            None => bail!("Doubling {n} overflows a 64-bit integer"),
        }
    } else if let Some(n) = value.as_f64() {
        Ok(json!(n * 2.0))
    } else {
        bail!("Cannot double non-numeric value {value}")
    }
}

fn product(params: &BTreeMap<String, Value>) -> Result<Value> {
    if params.values().all(Value::is_i64) {
        let mut product: i64 = 1;
        for (name, value) in params {
            let n = value.as_i64().unwrap_or_default();
            product = match product.checked_mul(n) {
                Some(product) => product,
                None => bail!("Product overflows a 64-bit integer at argument `{name}`"),
            };
        }
        return Ok(json!(product));
    }

    let mut product = 1.0;
    for (name, value) in params {
        match value.as_f64() {
            Some(n) => product *= n,
            None => bail!("Argument `{name}` is not numeric: {value}"),
        }
    }
    Ok(json!(product))
}

fn load_work(path: &Path) -> Result<Vec<WorkItem<Value>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read work file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Work file {} is not a JSON array", path.display()))
}

fn schedule_stop(after_ms: Option<u64>, handle: StopHandle) {
    if let Some(after_ms) = after_ms {
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(after_ms));
            handle.stop();
        });
    }
}

fn print_text(report: &RunReport, output: &Output) {
    match &report.results {
        Some(results) => {
            output.header("Results");
            for (worker, records) in results {
                output.category(&worker.to_string());
                for record in records {
                    output.indent(&format!(
                        "#{:<3} {} -> {}",
                        record.sequence_index,
                        param_text(&record.parameter),
                        record.return_value
                    ));
                }
            }
        }
        None => output.info("Result caching disabled"),
    }

    let progress = &report.progress;
    output.header("Summary");
    output.status_indicator(
        &report.outcome.to_string().to_uppercase(),
        &format!("{}/{} items completed", progress.completed, progress.total),
        report.outcome == RunOutcome::Completed && progress.failed == 0,
    );
    output.summary_stats("Threads:", report.threads);
    output.summary_stats("Failed:", progress.failed);
    if progress.failed > 0 {
        output.warning(&format!(
            "{} items failed, see the error log",
            progress.failed
        ));
    }
}

fn print_json(report: &RunReport, output: &Output) -> Result<()> {
    // Serialized directly so worker keys keep their numeric order
    output.raw(&serde_json::to_string_pretty(report)?);
    Ok(())
}

fn param_text(item: &WorkItem<Value>) -> String {
    match item {
        WorkItem::Positional(value) => value.to_string(),
        WorkItem::Named(params) => params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}
