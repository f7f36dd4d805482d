//! Fold `concat(...)` calls with all-literal arguments into one literal
//!
//! Nested calls fold from the inside out: the innermost call collapses on
//! the first pass, which makes its parent all-literal for the next one.
//! This is the canonical multi-pass rule.

use recast_core::{
    Directive, NodeId, NodeKind, Result, RuleContext, SyntaxTree, TransformRule,
};

pub struct FoldStringConcat;

impl FoldStringConcat {
    pub const NAME: &str = "fold-string-concat";
}

impl TransformRule for FoldStringConcat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::Call]
    }

    fn apply(
        &self,
        tree: &mut SyntaxTree,
        node: NodeId,
        _ctx: &mut RuleContext,
    ) -> Result<Directive> {
        if tree.text(node) != Some("concat") || tree.child_count(node) == 0 {
            return Ok(Directive::Unchanged);
        }

        let args = tree.children(node).to_vec();
        if args.iter().any(|&arg| tree.kind(arg) != NodeKind::StringLit) {
            return Ok(Directive::Unchanged);
        }

        let mut folded = String::new();
        for arg in args {
            if let Some(text) = tree.text(arg) {
                folded.push_str(text);
            }
        }

        let replacement = tree.add_with_text(NodeKind::StringLit, folded);
        Ok(Directive::Replace(replacement))
    }
}
