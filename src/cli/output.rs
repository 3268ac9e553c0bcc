//! Console output for workpool commands
//!
//! Styled messages, key/value tables and run summaries in a consistent
//! format. Everything except raw output respects `--quiet`.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a category header with consistent styling
    pub fn category(&self, category: &str) {
        if !self.quiet {
            println!("\n{}", style(category).bold().cyan());
        }
    }

    pub fn table_row(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<20} {}", style(key).dim(), value);
        }
    }

    pub fn indent(&self, message: &str) {
        if !self.quiet {
            println!("    {message}");
        }
    }

    /// Print a status indicator with consistent styling
    pub fn status_indicator(&self, status: &str, message: &str, is_success: bool) {
        if !self.quiet {
            let (icon, color) = if is_success {
                ("✓", style(status).green())
            } else {
                ("✗", style(status).red())
            };
            println!("{} {} {}", style(icon).bold(), color.bold(), message);
        }
    }

    /// Print summary statistics with enhanced styling
    pub fn summary_stats(&self, label: &str, value: usize) {
        if !self.quiet {
            println!("  {} {}", style(label).dim(), style(value.to_string()).bold());
        }
    }

    /// Write raw text to stdout; machine-readable output ignores `--quiet`
    pub fn raw(&self, text: &str) {
        println!("{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let output = Output::new(true, false);
        assert!(output.is_verbose());
        assert!(!output.is_quiet());

        let quiet = Output::new(false, true);
        assert!(quiet.is_quiet());
        // Quiet output still accepts every call
        quiet.info("hidden");
        quiet.table_row("key", "value");
    }
}
