//! Built-in transformation rules
//!
//! Each rule is a self-contained [`TransformRule`] implementation; the
//! [`builtin_registry`] constructor assembles the default ordered registry
//! from a run configuration, honoring per-rule enablement and parameters.

pub mod builtin;

pub use builtin::concat_fold::FoldStringConcat;
pub use builtin::constant_rename::RenameClassConstants;
pub use builtin::debug_calls::RemoveDebugCalls;
pub use builtin::empty_statements::RemoveEmptyStatements;
pub use builtin::string_class_name::StringClassNameToConst;
pub use builtin::type_check_args::SkipTypeCheckArgs;

use std::sync::Arc;

use recast_core::{Configuration, Result, RuleRegistry, TransformRule};

/// Build the default rule registry from a configuration
///
/// Registration order is fixed: guard rules that fence off subtrees come
/// first so rewrite rules never see the nodes they protect.
pub fn builtin_registry(config: &Configuration) -> Result<RuleRegistry> {
    let mut registry = RuleRegistry::new();

    let rules: Vec<Arc<dyn TransformRule>> = vec![
        Arc::new(SkipTypeCheckArgs::from_options(
            &config.rule_options(SkipTypeCheckArgs::NAME),
        )?),
        Arc::new(StringClassNameToConst::from_options(
            &config.rule_options(StringClassNameToConst::NAME),
        )?),
        Arc::new(RenameClassConstants::from_options(
            &config.rule_options(RenameClassConstants::NAME),
        )?),
        Arc::new(FoldStringConcat),
        Arc::new(RemoveDebugCalls::from_options(
            &config.rule_options(RemoveDebugCalls::NAME),
        )?),
        Arc::new(RemoveEmptyStatements),
    ];

    for rule in rules {
        if config.rule_enabled(rule.name()) {
            registry.register(rule);
        } else {
            tracing::debug!(rule = rule.name(), "rule disabled by configuration");
        }
    }

    Ok(registry)
}
