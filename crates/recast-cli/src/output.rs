//! Output formatting and reporting

use clap::ValueEnum;
use recast_core::{Color, Console, DiffRenderer, ProcessResult, Result};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored diffs and a summary line
    Human,
    /// The full result as a JSON document
    Json,
}

/// Renders a process result to stdout
pub struct OutputFormatter {
    format: OutputFormat,
    console: Console,
    renderer: DiffRenderer,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        let (console, renderer) = if use_colors {
            (Console::new(), DiffRenderer::new())
        } else {
            (Console::no_colors(), DiffRenderer::no_colors())
        };
        Self {
            format,
            console,
            renderer,
        }
    }

    pub fn print_result(&self, result: &ProcessResult, dry_run: bool) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_human(result, dry_run);
                Ok(())
            }
            OutputFormat::Json => self.print_json(result),
        }
    }

    fn print_human(&self, result: &ProcessResult, dry_run: bool) {
        for file_diff in &result.file_diffs {
            println!(
                "{}",
                self.console
                    .colorize(&file_diff.path.display().to_string(), Color::Bold)
            );
            print!("{}", self.renderer.render_diff(&file_diff.diff));
            println!();
        }

        for warning in &result.warnings {
            println!(
                "{} {}",
                self.console.colorize("warning:", Color::Yellow),
                warning
            );
        }

        for error in &result.errors {
            println!(
                "{} {}: {}",
                self.console.colorize("error:", Color::Red),
                error.path.display(),
                error.message
            );
        }

        let verb = if dry_run { "would change" } else { "changed" };
        let summary = format!(
            "{} file(s) processed, {} {}, {} cache hit(s), {} error(s)",
            result.files_processed,
            result.file_diffs.len(),
            verb,
            result.cache_hits,
            result.errors.len()
        );
        println!("{}", self.console.colorize(&summary, Color::Dim));

        if dry_run && result.has_diffs() {
            println!("run again without --dry-run to apply these changes");
        }
    }

    fn print_json(&self, result: &ProcessResult) -> Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(|e| {
            recast_core::RecastError::internal_error(format!("failed to serialize result: {e}"))
        })?;
        println!("{json}");
        Ok(())
    }
}
