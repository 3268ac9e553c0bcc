use crate::cli::Output;
use crate::config::WorkpoolConfig;
use anyhow::{Result, bail};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Get a configuration value or section, e.g. `pool.threads`
    Get { key: String },
    /// Show the thread count a pool would use for a given workload size
    Threads {
        /// Number of work items
        #[arg(default_value_t = 20)]
        items: usize,
    },
}

pub fn execute(args: ConfigArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = WorkpoolConfig::load_with_custom_config(custom_config)?;

    match args.command {
        ConfigCommand::Show { format } => {
            let merged = config.get_full_config()?;
            let rendered = match format.to_lowercase().as_str() {
                "json" => serde_json::to_string_pretty(&merged)?,
                "toml" => toml::to_string_pretty(&merged)?,
                _ => bail!("Unsupported format: {format}. Use toml or json"),
            };
            output.raw(rendered.trim_end());
        }
        ConfigCommand::Get { key } => {
            let value = config.get_section(&key)?;
            match &value {
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    output.raw(&serde_json::to_string_pretty(&value)?)
                }
                serde_json::Value::String(s) => output.raw(s),
                other => output.raw(&other.to_string()),
            }
        }
        ConfigCommand::Threads { items } => {
            let pool = config.pool_config()?;
            let resolved = pool.resolve_threads(items)?;
            output.table_row("Requested", &pool.threads.to_string());
            output.table_row(
                "Hardware threads",
                &pool.hardware_threads.unwrap_or_else(num_cpus::get).to_string(),
            );
            output.table_row("Items", &items.to_string());
            output.raw(&resolved.to_string());
        }
    }
    Ok(())
}
