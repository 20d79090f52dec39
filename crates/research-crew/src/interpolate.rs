//! `{placeholder}` substitution for role and task text

use serde_json::Value;

use crate::error::{CrewError, Result};
use crate::CrewInputs;

/// Replace every `{identifier}` in `template` with the matching input.
///
/// Strings are inserted verbatim, other values as JSON. Braces that do not
/// wrap an identifier (`{}`, `{ x }`, `{"a": 1}`) are copied through.
pub fn interpolate(template: &str, inputs: &CrewInputs) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                let key = &after[..close];
                let value = inputs
                    .get(key)
                    .ok_or_else(|| CrewError::MissingInput(key.to_string()))?;
                out.push_str(&render_value(value));
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strings verbatim, everything else as JSON
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
