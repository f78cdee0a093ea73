//! `${name}` placeholder substitution for step arguments.
//!
//! Only a string that is exactly one placeholder is substituted, and the
//! whole value is replaced (so a variable may carry a number or an object).
//! Placeholders embedded in longer strings are literals.

use serde_json::Value;

use webpilot_types::workflow::{StepArgs, Variables};

/// The identifier of `value` if it is exactly `${identifier}`.
pub fn placeholder_name(value: &str) -> Option<&str> {
    let name = value.strip_prefix("${")?.strip_suffix('}')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    valid.then_some(name)
}

/// Substitute top-level argument values. Missing variables leave the
/// placeholder string in place.
pub fn substitute_args(args: &StepArgs, variables: &Variables) -> StepArgs {
    args.iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(s) => placeholder_name(s)
                    .and_then(|name| variables.get(name))
                    .cloned()
                    .unwrap_or_else(|| value.clone()),
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}
