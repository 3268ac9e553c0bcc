//! Command-line interface for workpool
//!
//! clap-based argument parsing, logging setup, and dispatch to the command
//! implementations in [`commands`].

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;
mod output;

pub use output::Output;

#[derive(Parser)]
#[command(
    name = "workpool",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a callback over a work collection on a bounded worker pool",
    long_about = "Run a callback over a work collection on a bounded worker pool.\n\n\
                  workpool distributes a finite work collection over worker threads, either \
                  pre-partitioned round robin (static) or through a shared queue (dynamic), \
                  with progress tracking, result capture and cooperative cancellation."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a demonstration workload on a worker pool
    Run(commands::run::RunArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
    /// Show version information
    Version,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        match self.command {
            Some(Commands::Run(args)) => {
                commands::run::execute(args, self.config.as_deref(), &output)
            }
            Some(Commands::Config(args)) => {
                commands::config::execute(args, self.config.as_deref(), &output)
            }
            Some(Commands::Version) => commands::version::execute(&output),
            None => {
                output.info("Run 'workpool --help' for usage information");
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
