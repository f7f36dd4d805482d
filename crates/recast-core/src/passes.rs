//! Fixed-point pass loop
//!
//! Some rules only become applicable after another rule has already run, so a
//! single traversal is not enough. The loop reruns the traversal controller
//! until a pass produces no mutations, bounded by a hard cap so two rules
//! toggling each other's output cannot spin forever.

use std::path::Path;
use std::sync::Arc;

use crate::rule::{LanguageLevel, RuleContext, RuleRegistry, ScopeIndex};
use crate::traversal::{RuleFailure, TraversalController};
use crate::tree::SyntaxTree;

/// Default pass cap; reaching it is a diagnostic, never a failure
pub const DEFAULT_MAX_PASSES: usize = 20;

/// Result of driving one file's tree to a fixed point (or the cap)
#[derive(Debug)]
pub struct PassReport {
    /// Passes actually run
    pub passes: usize,
    /// Total mutations across all passes
    pub mutations: usize,
    /// Whether the final pass produced zero mutations
    pub converged: bool,
    /// Rule failures accumulated across passes
    pub failures: Vec<RuleFailure>,
}

impl PassReport {
    /// Operator-facing diagnostic for a loop that hit the cap
    pub fn non_convergence_warning(&self, path: &Path) -> Option<String> {
        if self.converged {
            return None;
        }
        Some(format!(
            "{}: rules did not converge after {} passes; check the active rule set for conflicting rewrites",
            path.display(),
            self.passes
        ))
    }
}

/// Drives repeated traversal passes over one file's tree
pub struct PassRunner {
    max_passes: usize,
}

impl PassRunner {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    /// Run passes until convergence or the cap
    ///
    /// The rule context is rebuilt for every pass: the scope index is
    /// recomputed from the current tree (earlier passes may have added or
    /// renamed declarations) and the transient attribute side-table is
    /// cleared.
    pub fn run(
        &self,
        tree: &mut SyntaxTree,
        registry: &RuleRegistry,
        language_level: LanguageLevel,
        path: &Path,
        source: &str,
    ) -> PassReport {
        let controller = TraversalController::new(registry, language_level);
        let mut report = PassReport {
            passes: 0,
            mutations: 0,
            converged: false,
            failures: Vec::new(),
        };

        while report.passes < self.max_passes {
            let resolver = Arc::new(ScopeIndex::from_tree(tree));
            let mut ctx = RuleContext::new(path, source, resolver);

            let outcome = controller.run_pass(tree, &mut ctx);
            report.passes += 1;
            report.mutations += outcome.mutations;
            let clean = outcome.is_clean();
            report.failures.extend(outcome.failures);

            if clean {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            tracing::warn!(
                path = %path.display(),
                passes = report.passes,
                "pass loop hit the cap without converging"
            );
        } else {
            tracing::debug!(
                path = %path.display(),
                passes = report.passes,
                mutations = report.mutations,
                "pass loop converged"
            );
        }

        report
    }
}

impl Default for PassRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PASSES)
    }
}
