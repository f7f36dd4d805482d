//! Recast Core
//!
//! Core engine for rule-driven source-to-source transformation: a mutable
//! syntax tree, an ordered rule registry, a mutation-aware traversal, a
//! fixed-point pass loop, and a persistent change cache, orchestrated by a
//! parallel executor. Rules and the CLI live in their own crates.

pub mod cache;
pub mod config;
pub mod console; // Terminal console utilities for rich output
pub mod diff;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod lang; // Built-in `.rcs` frontend
pub mod passes;
pub mod report;
pub mod result;
pub mod rule;
pub mod traversal;
pub mod tree;

// Re-export commonly used types
pub use cache::{CacheEntry, ChangeCache, ContentFingerprint};
pub use config::{ConfigLoader, Configuration, RuleOptions};
pub use console::{Color, Console};
pub use diff::{DiffRenderer, unified_diff};
pub use discovery::{FileDiscovery, SOURCE_EXTENSION};
pub use error::{ErrorKind, RecastError};
pub use executor::{Engine, changed_paths};
pub use lang::{ScriptParser, ScriptPrinter, SourceParser, SourcePrinter};
pub use passes::{DEFAULT_MAX_PASSES, PassReport, PassRunner};
pub use report::{
    ExitStatus, FileDiff, FileOutcomeKind, FileReport, ProcessResult, SystemError,
    resolve_exit_status,
};
pub use result::Result;
pub use rule::{
    Directive, LATEST_LEVEL, LanguageLevel, NameResolver, RuleContext, RuleRegistry,
    RuleSetFingerprint, ScopeIndex, TransformRule,
};
pub use traversal::{PassOutcome, RuleFailure, TraversalController};
pub use tree::{NodeId, NodeKind, SyntaxTree};

/// Initialize the tracing subscriber for logging
///
/// `default_filter` applies when `RUST_LOG` is not set. Logs go to stderr so
/// diffs and JSON reports on stdout stay clean.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
