//! Recast CLI
//!
//! Command-line interface for the Recast source transformation engine

mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recast_core::{
    ConfigLoader, Engine, ExitStatus, LanguageLevel, Result, resolve_exit_status,
};
use recast_rules::builtin_registry;
use tracing::error;

use crate::output::{OutputFormat, OutputFormatter};

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Recast: rule-driven source-to-source transformation")]
#[command(version = recast_core::VERSION)]
#[command(
    long_about = "Recast: rule-driven source-to-source transformation\n\
\n\
Recast applies an ordered set of transformation rules to source trees\n\
until they reach a fixed point, then writes the changes back (or previews\n\
them with --dry-run).\n\
\n\
Examples:\n  \
recast process                  # Transform the current directory\n  \
recast process --dry-run src/   # Preview changes without writing\n  \
recast process --clear-cache .  # Drop the change cache first"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (recast.toml/recast.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the configured rules to source files
    Process {
        /// Files or directories to transform
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Report changes without writing them
        #[arg(long, help = "Show diffs without modifying files")]
        dry_run: bool,

        /// Drop the change cache before running
        #[arg(long, help = "Clear the change cache before processing")]
        clear_cache: bool,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format")]
        format: OutputFormat,

        /// Fixed-point pass cap per file
        #[arg(long, help = "Maximum rule passes per file")]
        max_passes: Option<usize>,

        /// Target language feature level
        #[arg(long, help = "Target language level; rules above it are skipped")]
        level: Option<LanguageLevel>,

        /// Include patterns (glob syntax)
        #[arg(
            long,
            help = "Include files matching pattern (can be used multiple times)"
        )]
        include: Vec<String>,

        /// Exclude patterns (glob syntax)
        #[arg(
            long,
            help = "Exclude files matching pattern (can be used multiple times)"
        )]
        exclude: Vec<String>,

        /// Directory for the persistent change cache
        #[arg(long, help = "Cache directory (default: no persistent cache)")]
        cache_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    recast_core::init_tracing(match cli.verbose {
        0 => "recast=warn",
        1 => "recast=info",
        2 => "recast=debug",
        _ => "recast=trace",
    });

    let code = match run(cli) {
        Ok(status) => status.code(),
        Err(err) => {
            error!("{err}");
            ExitStatus::Failure.code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<ExitStatus> {
    let Commands::Process {
        paths,
        dry_run,
        clear_cache,
        format,
        max_passes,
        level,
        include,
        exclude,
        cache_dir,
    } = cli.command;

    let cwd = std::env::current_dir()?;
    let mut config = ConfigLoader::load(cli.config.as_deref(), &cwd)?;

    // CLI flags override the configuration file.
    if !paths.is_empty() {
        config.paths = paths;
    }
    if config.paths.is_empty() {
        config.paths = vec![cwd];
    }
    config.dry_run |= dry_run;
    config.clear_cache |= clear_cache;
    if let Some(max_passes) = max_passes {
        config.max_passes = max_passes;
    }
    if let Some(level) = level {
        config.language_level = level;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if cache_dir.is_some() {
        config.cache_dir = cache_dir;
    }
    config.include.extend(include);
    config.exclude.extend(exclude);

    let registry = builtin_registry(&config)?;
    let dry_run = config.dry_run;
    let result = Engine::new(config, registry).run()?;

    let formatter = OutputFormatter::new(format, !cli.no_color);
    formatter.print_result(&result, dry_run)?;

    Ok(resolve_exit_status(&result, dry_run))
}
