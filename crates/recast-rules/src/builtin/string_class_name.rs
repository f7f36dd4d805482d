//! Replace string literals naming a known class with `Class::class`
//!
//! `"AnotherClass"` only becomes `AnotherClass::class` when the name
//! resolver confirms a class of that name is in scope; arbitrary strings
//! that merely look like class names are left alone. Literals that are the
//! value of a `const` declaration are also left alone: renaming a class
//! must not silently change stored constant data.

use std::collections::BTreeSet;

use recast_core::{
    Directive, LanguageLevel, NodeId, NodeKind, Result, RuleContext, RuleOptions, SyntaxTree,
    TransformRule,
};

use super::string_set_param;

/// Side-table marker for literals under a `const` declaration
const ATTR_CONST_VALUE: &str = "const-value";

pub struct StringClassNameToConst {
    skip: BTreeSet<String>,
}

impl StringClassNameToConst {
    pub const NAME: &str = "string-class-name-to-const";

    /// Class names that must never be rewritten
    pub fn new(skip: BTreeSet<String>) -> Self {
        Self { skip }
    }

    pub fn from_options(options: &RuleOptions) -> Result<Self> {
        let skip = string_set_param(options, Self::NAME, "skip")?.unwrap_or_default();
        Ok(Self::new(skip))
    }

    fn looks_like_class_name(value: &str) -> bool {
        let name = value.trim_start_matches('\\');
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_uppercase() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl Default for StringClassNameToConst {
    fn default() -> Self {
        Self::new(BTreeSet::new())
    }
}

impl TransformRule for StringClassNameToConst {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ConstDecl, NodeKind::StringLit]
    }

    fn min_level(&self) -> LanguageLevel {
        55
    }

    fn fingerprint_seed(&self) -> String {
        format!("{}:skip={:?}", Self::NAME, self.skip)
    }

    fn apply(
        &self,
        tree: &mut SyntaxTree,
        node: NodeId,
        ctx: &mut RuleContext,
    ) -> Result<Directive> {
        match tree.kind(node) {
            NodeKind::ConstDecl => {
                // Pre-order guarantees this runs before the literals below it
                // are visited.
                for descendant in tree.descendants(node) {
                    if tree.kind(descendant) == NodeKind::StringLit {
                        ctx.set_attr(descendant, ATTR_CONST_VALUE, "1");
                    }
                }
                Ok(Directive::Unchanged)
            }
            NodeKind::StringLit => {
                if ctx.has_attr(node, ATTR_CONST_VALUE) {
                    return Ok(Directive::Unchanged);
                }
                let Some(value) = tree.text(node).map(str::to_string) else {
                    return Ok(Directive::Unchanged);
                };
                if !Self::looks_like_class_name(&value) {
                    return Ok(Directive::Unchanged);
                }
                if self.skip.contains(value.trim_start_matches('\\')) {
                    return Ok(Directive::Unchanged);
                }
                let Some(class) = ctx.resolver().resolve_class(&value) else {
                    return Ok(Directive::Unchanged);
                };

                let fetch = tree.add(NodeKind::ClassConstFetch);
                let class_ident = tree.add_with_text(NodeKind::Ident, class);
                let member = tree.add_with_text(NodeKind::Ident, "class");
                tree.attach(fetch, class_ident)?;
                tree.attach(fetch, member)?;
                Ok(Directive::Replace(fetch))
            }
            _ => Ok(Directive::Unchanged),
        }
    }
}
