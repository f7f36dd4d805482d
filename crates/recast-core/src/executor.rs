//! Parallel engine driving the whole run
//!
//! Files are independent units of work: each worker owns its file's tree,
//! context, and pass loop outright, so no locking happens on the hot path.
//! The shared surface is the change cache and the report vector, both of
//! which are index-addressed or concurrent.

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::cache::{ChangeCache, ContentFingerprint};
use crate::config::Configuration;
use crate::diff::unified_diff;
use crate::discovery::FileDiscovery;
use crate::lang::{ScriptParser, ScriptPrinter, SourceParser, SourcePrinter};
use crate::passes::PassRunner;
use crate::report::{FileDiff, FileReport, ProcessResult, SystemError};
use crate::rule::{RuleRegistry, RuleSetFingerprint};
use crate::{RecastError, Result};

static THREAD_POOL_INIT: Once = Once::new();

/// Configure the global worker pool once per process
///
/// Later calls with a different thread count are ignored; rayon's global
/// pool cannot be rebuilt.
fn init_thread_pool(threads: Option<usize>) {
    THREAD_POOL_INIT.call_once(|| {
        if let Some(threads) = threads {
            if let Err(err) = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
            {
                tracing::warn!(%err, "failed to configure worker pool; using defaults");
            }
        }
    });
}

/// Orchestrates one full processing run
pub struct Engine {
    config: Configuration,
    registry: RuleRegistry,
    parser: Box<dyn SourceParser>,
    printer: Box<dyn SourcePrinter>,
}

impl Engine {
    /// Engine over the built-in `.rcs` frontend
    pub fn new(config: Configuration, registry: RuleRegistry) -> Self {
        Self {
            config,
            registry,
            parser: Box::new(ScriptParser),
            printer: Box::new(ScriptPrinter),
        }
    }

    /// Engine over a caller-supplied frontend
    pub fn with_frontend(
        config: Configuration,
        registry: RuleRegistry,
        parser: Box<dyn SourceParser>,
        printer: Box<dyn SourcePrinter>,
    ) -> Self {
        Self {
            config,
            registry,
            parser,
            printer,
        }
    }

    /// Discover, transform, and report
    ///
    /// Returns `Err` only for setup problems (bad globs, missing paths); all
    /// per-file failures are folded into the result instead.
    pub fn run(&self) -> Result<ProcessResult> {
        init_thread_pool(self.config.threads);

        let discovery = FileDiscovery::new(&self.config.include, &self.config.exclude)?;
        let files = discovery.discover(&self.config.paths)?;

        let cache = match self.config.cache_store_path() {
            Some(store) => ChangeCache::open(store),
            None => ChangeCache::in_memory(),
        };
        if self.config.clear_cache {
            tracing::info!("clearing change cache on request");
            cache.clear();
        }
        let rule_set = self.registry.fingerprint();

        let deadline = self
            .config
            .timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        tracing::info!(
            files = files.len(),
            rules = self.registry.len(),
            dry_run = self.config.dry_run,
            "starting run"
        );

        // Index-tagged so the fold below restores input order no matter how
        // workers were scheduled.
        let mut indexed: Vec<(usize, FileReport)> = files
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                let report = if deadline.is_some_and(|d| Instant::now() >= d) {
                    let mut skipped = FileReport::unchanged(path.clone(), false);
                    skipped
                        .warnings
                        .push(format!("{}: skipped, run timeout exceeded", path.display()));
                    skipped
                } else {
                    self.process_file(path, &cache, &rule_set)
                };
                (index, report)
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);

        let result =
            ProcessResult::from_reports(indexed.into_iter().map(|(_, report)| report).collect());

        cache.flush();
        tracing::info!(
            changed = result.file_diffs.len(),
            errors = result.errors.len(),
            cache_hits = result.cache_hits,
            "run finished"
        );
        Ok(result)
    }

    fn process_file(
        &self,
        path: &Path,
        cache: &ChangeCache,
        rule_set: &RuleSetFingerprint,
    ) -> FileReport {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                return FileReport::failed(
                    path.to_path_buf(),
                    RecastError::io_error(path, err).to_string(),
                );
            }
        };

        let content = ContentFingerprint::of_str(&source);
        if cache.is_unchanged(path, &content, rule_set) {
            tracing::debug!(path = %path.display(), "cache hit");
            return FileReport::unchanged(path.to_path_buf(), true);
        }

        let mut tree = match self.parser.parse(&source) {
            Ok(tree) => tree,
            Err(err) => return FileReport::failed(path.to_path_buf(), err.to_string()),
        };

        let runner = PassRunner::new(self.config.max_passes);
        let passes = runner.run(
            &mut tree,
            &self.registry,
            self.config.language_level,
            path,
            &source,
        );

        let mut report = FileReport::unchanged(path.to_path_buf(), false);
        for failure in &passes.failures {
            report.errors.push(SystemError {
                path: path.to_path_buf(),
                message: format!(
                    "rule '{}' failed on {:?} node: {}",
                    failure.rule, failure.node_kind, failure.message
                ),
            });
        }
        if let Some(warning) = passes.non_convergence_warning(path) {
            report.warnings.push(warning);
        }
        let cacheable = passes.converged && report.errors.is_empty();

        if passes.mutations == 0 {
            if cacheable {
                cache.mark_unchanged(path, &content, rule_set);
            }
            return report;
        }

        let printed = match self.printer.print(&tree) {
            Ok(printed) => printed,
            Err(err) => {
                report.errors.push(SystemError {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
                return report;
            }
        };

        // Mutations that cancel out (or are formatting-invisible) are not
        // changes; cache them like any other no-op.
        if printed == source {
            if cacheable {
                cache.mark_unchanged(path, &content, rule_set);
            }
            return report;
        }

        report.diff = Some(FileDiff {
            path: path.to_path_buf(),
            diff: unified_diff(&source, &printed),
        });

        if !self.config.dry_run {
            if let Err(err) = std::fs::write(path, &printed) {
                report.errors.push(SystemError {
                    path: path.to_path_buf(),
                    message: RecastError::io_error(path, err).to_string(),
                });
                return report;
            }
            // The file's content just changed under its old cache key.
            cache.invalidate(path);
            tracing::debug!(path = %path.display(), "wrote transformed file");
        }

        report
    }
}

/// Paths that changed (or would change), in input order
pub fn changed_paths(result: &ProcessResult) -> Vec<PathBuf> {
    result.file_diffs.iter().map(|d| d.path.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Directive, RuleContext, TransformRule};
    use crate::tree::{NodeId, NodeKind, SyntaxTree};
    use std::sync::Arc;

    /// StringLit "before" -> "after"
    struct BeforeToAfter;

    impl TransformRule for BeforeToAfter {
        fn name(&self) -> &str {
            "before-to-after"
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &[NodeKind::StringLit]
        }

        fn apply(
            &self,
            tree: &mut SyntaxTree,
            node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            if tree.text(node) == Some("before") {
                let replacement = tree.add_with_text(NodeKind::StringLit, "after");
                return Ok(Directive::Replace(replacement));
            }
            Ok(Directive::Unchanged)
        }
    }

    struct FailOnCall;

    impl TransformRule for FailOnCall {
        fn name(&self) -> &str {
            "fail-on-call"
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &[NodeKind::Call]
        }

        fn apply(
            &self,
            _tree: &mut SyntaxTree,
            _node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            Err(RecastError::rule_error("fail-on-call", "boom"))
        }
    }

    fn registry_with(rule: Arc<dyn TransformRule>) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry.register(rule);
        registry
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config_for(dir: &Path, dry_run: bool) -> Configuration {
        Configuration {
            paths: vec![dir.to_path_buf()],
            dry_run,
            ..Default::default()
        }
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let source = "fn run() {\n    return \"before\";\n}\n";
        let path = write_file(dir.path(), "a.rcs", source);

        let engine = Engine::new(
            config_for(dir.path(), true),
            registry_with(Arc::new(BeforeToAfter)),
        );
        let result = engine.run().unwrap();

        assert_eq!(result.file_diffs.len(), 1);
        assert!(result.file_diffs[0].diff.contains("-    return \"before\";"));
        assert!(result.file_diffs[0].diff.contains("+    return \"after\";"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn apply_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "a.rcs",
            "fn run() {\n    return \"before\";\n}\n",
        );

        let engine = Engine::new(
            config_for(dir.path(), false),
            registry_with(Arc::new(BeforeToAfter)),
        );
        let result = engine.run().unwrap();

        assert_eq!(result.file_diffs.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "fn run() {\n    return \"after\";\n}\n"
        );
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "a.rcs",
            "fn run() {\n    return \"before\";\n}\n",
        );

        let config = config_for(dir.path(), false);
        let first = Engine::new(config.clone(), registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();
        assert_eq!(first.file_diffs.len(), 1);
        let after_first = std::fs::read_to_string(&path).unwrap();

        let second = Engine::new(config, registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();
        assert!(second.file_diffs.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn unchanged_files_hit_the_cache_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.rcs", "fn run() {\n    return 1;\n}\n");

        let mut config = config_for(dir.path(), false);
        config.cache_dir = Some(dir.path().join(".recast"));

        let first = Engine::new(config.clone(), registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();
        assert_eq!(first.cache_hits, 0);

        let second = Engine::new(config, registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();
        assert_eq!(second.cache_hits, 1);
    }

    #[test]
    fn clear_cache_forces_reprocessing() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.rcs", "fn run() {\n    return 1;\n}\n");

        let mut config = config_for(dir.path(), false);
        config.cache_dir = Some(dir.path().join(".recast"));
        Engine::new(config.clone(), registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();

        config.clear_cache = true;
        let result = Engine::new(config, registry_with(Arc::new(BeforeToAfter)))
            .run()
            .unwrap();
        assert_eq!(result.cache_hits, 0);
    }

    #[test]
    fn parse_failure_is_reported_and_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.rcs", "fn run( {");
        let good = write_file(
            dir.path(),
            "good.rcs",
            "fn run() {\n    return \"before\";\n}\n",
        );

        let engine = Engine::new(
            config_for(dir.path(), false),
            registry_with(Arc::new(BeforeToAfter)),
        );
        let result = engine.run().unwrap();

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("Parse error"));
        // The good sibling was still transformed.
        assert!(
            std::fs::read_to_string(&good)
                .unwrap()
                .contains("\"after\"")
        );
    }

    #[test]
    fn rule_failure_does_not_cache_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.rcs", "fn run() {\n    debug_log(1);\n}\n");

        let mut config = config_for(dir.path(), false);
        config.cache_dir = Some(dir.path().join(".recast"));

        let first = Engine::new(config.clone(), registry_with(Arc::new(FailOnCall)))
            .run()
            .unwrap();
        assert_eq!(first.errors.len(), 1);

        // Still a miss: failed files must be retried next run.
        let second = Engine::new(config, registry_with(Arc::new(FailOnCall)))
            .run()
            .unwrap();
        assert_eq!(second.cache_hits, 0);
        assert_eq!(second.errors.len(), 1);
    }

    #[test]
    fn report_order_matches_input_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.rcs", "a.rcs", "b.rcs"] {
            write_file(dir.path(), name, "fn run() {\n    return \"before\";\n}\n");
        }

        let engine = Engine::new(
            config_for(dir.path(), true),
            registry_with(Arc::new(BeforeToAfter)),
        );
        let result = engine.run().unwrap();

        let names: Vec<_> = changed_paths(&result)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.rcs", "b.rcs", "c.rcs"]);
    }

    #[test]
    fn results_are_identical_across_pool_sizes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.rcs", "fn run() {\n    return \"before\";\n}\n");
        write_file(dir.path(), "b.rcs", "fn run() {\n    return 1;\n}\n");
        write_file(
            dir.path(),
            "c.rcs",
            "fn run() {\n    let x = \"before\";\n    return x;\n}\n",
        );

        // Local pools: the global pool is sized once per process and cannot
        // be rebuilt between runs.
        let run_with = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let engine = Engine::new(
                config_for(dir.path(), true),
                registry_with(Arc::new(BeforeToAfter)),
            );
            let result = pool.install(|| engine.run()).unwrap();
            serde_json::to_string(&result).unwrap()
        };

        assert_eq!(run_with(1), run_with(4));
    }

    #[test]
    fn missing_root_path_fails_setup() {
        let config = Configuration {
            paths: vec![PathBuf::from("/definitely/not/here")],
            ..Default::default()
        };
        let engine = Engine::new(config, RuleRegistry::new());
        assert!(engine.run().is_err());
    }
}
