use crate::cli::Output;
use anyhow::Result;

pub fn execute(output: &Output) -> Result<()> {
    output.raw(&format!("workpool {}", env!("CARGO_PKG_VERSION")));
    if output.is_verbose() {
        output.table_row("Description", env!("CARGO_PKG_DESCRIPTION"));
        output.table_row("License", env!("CARGO_PKG_LICENSE"));
        output.table_row("Hardware threads", &num_cpus::get().to_string());
    }
    Ok(())
}
