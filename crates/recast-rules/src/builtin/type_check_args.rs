//! Fence off type-check call arguments from rewriting
//!
//! `is_a("AnotherClass", value)` compares against a class name at runtime;
//! rewriting the literal into `AnotherClass::class` would be fine, but
//! rewriting it into anything else would change behavior. The rule keeps the
//! whole argument list out of reach of later rules by not descending into
//! the call.

use std::collections::BTreeSet;

use recast_core::{
    Directive, NodeId, NodeKind, Result, RuleContext, RuleOptions, SyntaxTree, TransformRule,
};

use super::string_set_param;

pub struct SkipTypeCheckArgs {
    functions: BTreeSet<String>,
}

impl SkipTypeCheckArgs {
    pub const NAME: &str = "skip-type-check-args";

    pub fn new(functions: BTreeSet<String>) -> Self {
        Self { functions }
    }

    pub fn from_options(options: &RuleOptions) -> Result<Self> {
        let functions = string_set_param(options, Self::NAME, "functions")?
            .unwrap_or_else(Self::default_functions);
        Ok(Self::new(functions))
    }

    fn default_functions() -> BTreeSet<String> {
        ["is_a".to_string(), "is_subclass_of".to_string()].into()
    }
}

impl Default for SkipTypeCheckArgs {
    fn default() -> Self {
        Self::new(Self::default_functions())
    }
}

impl TransformRule for SkipTypeCheckArgs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::Call]
    }

    fn fingerprint_seed(&self) -> String {
        format!("{}:functions={:?}", Self::NAME, self.functions)
    }

    fn apply(
        &self,
        tree: &mut SyntaxTree,
        node: NodeId,
        _ctx: &mut RuleContext,
    ) -> Result<Directive> {
        let is_guarded = tree
            .text(node)
            .is_some_and(|callee| self.functions.contains(callee));
        if is_guarded {
            return Ok(Directive::SkipChildren);
        }
        Ok(Directive::Unchanged)
    }
}
