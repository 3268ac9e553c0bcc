use anyhow::Result;
use clap::Parser;
use workpool::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
