//! Remove bare `;` statements

use recast_core::{
    Directive, NodeId, NodeKind, Result, RuleContext, SyntaxTree, TransformRule,
};

pub struct RemoveEmptyStatements;

impl RemoveEmptyStatements {
    pub const NAME: &str = "remove-empty-statements";
}

impl TransformRule for RemoveEmptyStatements {
    fn name(&self) -> &str {
        Self::NAME
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
