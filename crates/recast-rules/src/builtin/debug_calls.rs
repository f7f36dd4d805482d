//! Remove statements that only call a debug helper

use std::collections::BTreeSet;

use recast_core::{
    Directive, NodeId, NodeKind, Result, RuleContext, RuleOptions, SyntaxTree, TransformRule,
};

use super::string_set_param;

pub struct RemoveDebugCalls {
    functions: BTreeSet<String>,
}

impl RemoveDebugCalls {
    pub const NAME: &str = "remove-debug-calls";

    pub fn new(functions: BTreeSet<String>) -> Self {
        Self { functions }
    }

    pub fn from_options(options: &RuleOptions) -> Result<Self> {
        let functions = string_set_param(options, Self::NAME, "functions")?
            .unwrap_or_else(Self::default_functions);
        Ok(Self::new(functions))
    }

    fn default_functions() -> BTreeSet<String> {
        ["debug_log".to_string(), "dump".to_string()].into()
    }
}

impl Default for RemoveDebugCalls {
    fn default() -> Self {
        Self::new(Self::default_functions())
    }
}

impl TransformRule for RemoveDebugCalls {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ExprStmt]
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
        // Only a bare `debug_log(...);` statement goes; a debug call nested
        // in a larger expression stays because its value is used.
        let [expr] = tree.children(node) else {
            return Ok(Directive::Unchanged);
        };
        let is_debug_call = tree.kind(*expr) == NodeKind::Call
            && tree
                .text(*expr)
                .is_some_and(|callee| self.functions.contains(callee));
        if is_debug_call {
            return Ok(Directive::Remove);
        }
        Ok(Directive::Unchanged)
    }
}
