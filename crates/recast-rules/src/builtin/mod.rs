//! The built-in rule implementations

pub mod concat_fold;
pub mod constant_rename;
pub mod debug_calls;
pub mod empty_statements;
pub mod string_class_name;
pub mod type_check_args;

use std::collections::BTreeSet;

use recast_core::{RecastError, Result, RuleOptions};

/// Read a rule parameter that must be an array of strings
///
/// Returns `None` when the parameter is absent so callers can apply their
/// default; a present-but-malformed value is a configuration error.
pub(crate) fn string_set_param(
    options: &RuleOptions,
    rule: &str,
    key: &str,
) -> Result<Option<BTreeSet<String>>> {
    let Some(value) = options.params.get(key) else {
        return Ok(None);
    };
    let items = value.as_array().ok_or_else(|| {
        RecastError::config_error(format!("rule '{rule}': parameter '{key}' must be an array"))
    })?;

    let mut set = BTreeSet::new();
    for item in items {
        let text = item.as_str().ok_or_else(|| {
            RecastError::config_error(format!(
                "rule '{rule}': parameter '{key}' must contain only strings"
            ))
        })?;
        set.insert(text.to_string());
    }
    Ok(Some(set))
}
