//! Depth-first traversal with in-flight mutation
//!
//! Walks a tree pre-order (parent before children) and applies every
//! interested rule in registry order at each node. Mutation directives are
//! applied immediately; child iteration re-reads the live child list after
//! every visit instead of trusting indices captured before mutation.

use crate::rule::{Directive, LanguageLevel, RuleContext, RuleRegistry};
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// A rule failure recorded against one node
///
/// A failing rule aborts the current node only; siblings and other files are
/// unaffected.
#[derive(Debug, Clone)]
pub struct RuleFailure {
    pub rule: String,
    pub node_kind: NodeKind,
    pub message: String,
}

/// Per-pass record of what a traversal did
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Number of replace/remove directives applied
    pub mutations: usize,
    /// Rule errors recorded during the pass
    pub failures: Vec<RuleFailure>,
}

impl PassOutcome {
    /// True when the pass reached a fixed point
    pub fn is_clean(&self) -> bool {
        self.mutations == 0
    }
}

enum NodeFate {
    Kept,
    Removed,
}

/// Dispatches rules over a tree and applies their directives
pub struct TraversalController<'a> {
    registry: &'a RuleRegistry,
    language_level: LanguageLevel,
}

impl<'a> TraversalController<'a> {
    pub fn new(registry: &'a RuleRegistry, language_level: LanguageLevel) -> Self {
        Self {
            registry,
            language_level,
        }
    }

    /// Run one full pass over the tree
    pub fn run_pass(&self, tree: &mut SyntaxTree, ctx: &mut RuleContext) -> PassOutcome {
        let mut outcome = PassOutcome::default();
        if let Some(root) = tree.root() {
            self.visit(tree, ctx, root, &mut outcome);
        }
        outcome
    }

    fn visit(
        &self,
        tree: &mut SyntaxTree,
        ctx: &mut RuleContext,
        node: NodeId,
        outcome: &mut PassOutcome,
    ) -> NodeFate {
        let mut current = node;
        let mut descend = true;

        // Registry-ordered rule dispatch. After a replacement the remaining
        // rules are looked up against the replacement's kind, so later rules
        // always observe the latest shape of the node.
        let mut min_index = 0;
        loop {
            let kind = tree.kind(current);
            let Some(index) = self.registry.next_interested(kind, min_index) else {
                break;
            };
            min_index = index + 1;

            let rule = self.registry.rule(index);
            if rule.min_level() > self.language_level {
                continue;
            }

            match rule.apply(tree, current, ctx) {
                Ok(Directive::Unchanged) => {}
                Ok(Directive::Replace(replacement)) => {
                    if replacement == current {
                        continue;
                    }
                    match tree.replace(current, replacement) {
                        Ok(()) => {
                            outcome.mutations += 1;
                            current = replacement;
                        }
                        Err(err) => {
                            tracing::warn!(rule = rule.name(), %err, "invalid replacement");
                            outcome.failures.push(RuleFailure {
                                rule: rule.name().to_string(),
                                node_kind: kind,
                                message: err.to_string(),
                            });
                            return NodeFate::Kept;
                        }
                    }
                }
                Ok(Directive::Remove) => {
                    match tree.remove(current) {
                        Ok(()) => outcome.mutations += 1,
                        Err(err) => {
                            tracing::warn!(rule = rule.name(), %err, "invalid removal");
                            outcome.failures.push(RuleFailure {
                                rule: rule.name().to_string(),
                                node_kind: kind,
                                message: err.to_string(),
                            });
                            return NodeFate::Kept;
                        }
                    }
                    return NodeFate::Removed;
                }
                Ok(Directive::SkipChildren) => {
                    descend = false;
                }
                Ok(Directive::AbortBranch) => {
                    outcome.failures.push(RuleFailure {
                        rule: rule.name().to_string(),
                        node_kind: kind,
                        message: "rule aborted traversal of this branch".to_string(),
                    });
                    return NodeFate::Kept;
                }
                Err(err) => {
                    // Isolate the failure to this node: skip its remaining
                    // rules and children, continue with siblings.
                    tracing::warn!(rule = rule.name(), %err, "rule failed on node");
                    outcome.failures.push(RuleFailure {
                        rule: rule.name().to_string(),
                        node_kind: kind,
                        message: err.to_string(),
                    });
                    return NodeFate::Kept;
                }
            }
        }

        if descend {
            let mut index = 0;
            while let Some(child) = tree.child_at(current, index) {
                match self.visit(tree, ctx, child, outcome) {
                    // A removed child shifts the list left; stay on the index.
                    NodeFate::Removed => {}
                    NodeFate::Kept => index += 1,
                }
            }
        }

        NodeFate::Kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ScopeIndex, TransformRule};
    use crate::{RecastError, Result};
    use std::path::Path;
    use std::sync::Arc;

    fn ctx<'a>() -> RuleContext<'a> {
        RuleContext::new(Path::new("test.rcs"), "", Arc::new(ScopeIndex::default()))
    }

    /// StringLit("x") -> IntLit("1")
    struct LitToInt;

    impl TransformRule for LitToInt {
        fn name(&self) -> &str {
            "lit-to-int"
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
            let replacement = tree.add_with_text(NodeKind::IntLit, "1");
            Ok(Directive::Replace(replacement))
        }
    }

    /// Sees only IntLit nodes; counts how often it ran
    struct IntObserver(std::sync::atomic::AtomicUsize);

    impl TransformRule for IntObserver {
        fn name(&self) -> &str {
            "int-observer"
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &[NodeKind::IntLit]
        }

        fn apply(
            &self,
            _tree: &mut SyntaxTree,
            _node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Ok(Directive::Unchanged)
        }
    }

    struct AlwaysFails;

    impl TransformRule for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &[NodeKind::StringLit]
        }

        fn apply(
            &self,
            _tree: &mut SyntaxTree,
            _node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            Err(RecastError::rule_error("always-fails", "boom"))
        }
    }

    struct RemoveEmpty;

    impl TransformRule for RemoveEmpty {
        fn name(&self) -> &str {
            "remove-empty"
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &[NodeKind::EmptyStmt]
        }

        fn apply(
            &self,
            _tree: &mut SyntaxTree,
            _node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            Ok(Directive::Remove)
        }
    }

    fn module_with(kinds: &[(NodeKind, &str)]) -> (SyntaxTree, NodeId) {
        let mut tree = SyntaxTree::new();
        let module = tree.add(NodeKind::Module);
        tree.set_root(module);
        for &(kind, text) in kinds {
            let stmt = tree.add(NodeKind::ExprStmt);
            tree.attach(module, stmt).unwrap();
            if text.is_empty() {
                let child = tree.add(kind);
                tree.attach(stmt, child).unwrap();
            } else {
                let child = tree.add_with_text(kind, text);
                tree.attach(stmt, child).unwrap();
            }
        }
        (tree, module)
    }

    #[test]
    fn later_rules_observe_replacement() {
        let observer = Arc::new(IntObserver(std::sync::atomic::AtomicUsize::new(0)));
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(LitToInt));
        registry.register(observer.clone());

        let (mut tree, _) = module_with(&[(NodeKind::StringLit, "x")]);
        let controller = TraversalController::new(&registry, crate::rule::LATEST_LEVEL);
        let outcome = controller.run_pass(&mut tree, &mut ctx());

        assert_eq!(outcome.mutations, 1);
        // The observer is only interested in IntLit, so seeing the node at
        // all proves it ran against the replacement.
        assert_eq!(observer.0.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn rule_failure_is_isolated_to_the_node() {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(AlwaysFails));

        let (mut tree, module) = module_with(&[
            (NodeKind::StringLit, "a"),
            (NodeKind::StringLit, "b"),
        ]);
        let controller = TraversalController::new(&registry, crate::rule::LATEST_LEVEL);
        let outcome = controller.run_pass(&mut tree, &mut ctx());

        // One failure per affected node, siblings still visited.
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.mutations, 0);
        assert_eq!(tree.child_count(module), 2);
    }

    #[test]
    fn removal_skips_to_next_sibling() {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(RemoveEmpty));

        let mut tree = SyntaxTree::new();
        let module = tree.add(NodeKind::Module);
        tree.set_root(module);
        for _ in 0..3 {
            let empty = tree.add(NodeKind::EmptyStmt);
            tree.attach(module, empty).unwrap();
        }
        let keep = tree.add(NodeKind::ExprStmt);
        tree.attach(module, keep).unwrap();
        let lit = tree.add_with_text(NodeKind::IntLit, "7");
        tree.attach(keep, lit).unwrap();

        let controller = TraversalController::new(&registry, crate::rule::LATEST_LEVEL);
        let outcome = controller.run_pass(&mut tree, &mut ctx());

        assert_eq!(outcome.mutations, 3);
        assert_eq!(tree.children(module), &[keep]);
    }

    #[test]
    fn min_level_gates_rule_application() {
        struct Leveled;

        impl TransformRule for Leveled {
            fn name(&self) -> &str {
                "leveled"
            }

            fn interested_kinds(&self) -> &[NodeKind] {
                &[NodeKind::StringLit]
            }

            fn min_level(&self) -> LanguageLevel {
                55
            }

            fn apply(
                &self,
                tree: &mut SyntaxTree,
                _node: NodeId,
                _ctx: &mut RuleContext,
            ) -> Result<Directive> {
                let replacement = tree.add_with_text(NodeKind::IntLit, "0");
                Ok(Directive::Replace(replacement))
            }
        }

        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(Leveled));
        let (mut tree, _) = module_with(&[(NodeKind::StringLit, "x")]);

        let old_target = TraversalController::new(&registry, 54);
        assert!(old_target.run_pass(&mut tree, &mut ctx()).is_clean());

        let new_target = TraversalController::new(&registry, 55);
        assert_eq!(new_target.run_pass(&mut tree, &mut ctx()).mutations, 1);
    }
}
