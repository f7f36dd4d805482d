//! Rename class constants per a configured per-class map
//!
//! Driven entirely by configuration: a `renames` parameter of the shape
//! `{ "Config": { "OLD": "NEW" } }` rewrites `Config::OLD` to `Config::NEW`.
//! Classes and constants not in the map are left alone, so an empty
//! configuration makes the rule a no-op.

use std::collections::BTreeMap;

use recast_core::{
    Directive, NodeId, NodeKind, RecastError, Result, RuleContext, RuleOptions, SyntaxTree,
    TransformRule,
};

pub struct RenameClassConstants {
    renames: BTreeMap<String, BTreeMap<String, String>>,
}

impl RenameClassConstants {
    pub const NAME: &str = "rename-class-constants";

    /// Per-class map of old constant name to new constant name
    pub fn new(renames: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { renames }
    }

    pub fn from_options(options: &RuleOptions) -> Result<Self> {
        let Some(value) = options.params.get("renames") else {
            return Ok(Self::default());
        };
        let classes = value.as_object().ok_or_else(|| {
            RecastError::config_error(format!(
                "rule '{}': parameter 'renames' must be an object mapping classes to rename maps",
                Self::NAME
            ))
        })?;

        let mut renames = BTreeMap::new();
        for (class, entry) in classes {
            let pairs = entry.as_object().ok_or_else(|| {
                RecastError::config_error(format!(
                    "rule '{}': renames for '{class}' must be an object",
                    Self::NAME
                ))
            })?;
            let mut by_constant = BTreeMap::new();
            for (old, new) in pairs {
                let new = new.as_str().ok_or_else(|| {
                    RecastError::config_error(format!(
                        "rule '{}': replacement for '{class}::{old}' must be a string",
                        Self::NAME
                    ))
                })?;
                by_constant.insert(old.clone(), new.to_string());
            }
            renames.insert(class.trim_start_matches('\\').to_string(), by_constant);
        }
        Ok(Self::new(renames))
    }
}

impl Default for RenameClassConstants {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl TransformRule for RenameClassConstants {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ClassConstFetch]
    }

    fn fingerprint_seed(&self) -> String {
        format!("{}:renames={:?}", Self::NAME, self.renames)
    }

    fn apply(
        &self,
        tree: &mut SyntaxTree,
        node: NodeId,
        _ctx: &mut RuleContext,
    ) -> Result<Directive> {
        let &[class_node, member_node] = tree.children(node) else {
            return Ok(Directive::Unchanged);
        };
        let Some(class) = tree
            .text(class_node)
            .map(|t| t.trim_start_matches('\\').to_string())
        else {
            return Ok(Directive::Unchanged);
        };
        let Some(member) = tree.text(member_node).map(str::to_string) else {
            return Ok(Directive::Unchanged);
        };
        let Some(renamed) = self.renames.get(&class).and_then(|map| map.get(&member)) else {
            return Ok(Directive::Unchanged);
        };
        if *renamed == member {
            return Ok(Directive::Unchanged);
        }

        let fetch = tree.add(NodeKind::ClassConstFetch);
        let class_ident = tree.add_with_text(NodeKind::Ident, class);
        let member_ident = tree.add_with_text(NodeKind::Ident, renamed.clone());
        tree.attach(fetch, class_ident)?;
        tree.attach(fetch, member_ident)?;
        Ok(Directive::Replace(fetch))
    }
}
