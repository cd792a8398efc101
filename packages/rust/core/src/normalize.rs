//! Answer value normalization.
//!
//! Raw guide answers arrive as either scalar values or indexed mappings
//! (`{"0": "A", "1": "B"}`) representing multi-select choices. Multi-select
//! values are flattened to one comma-separated string so the record and the
//! contact-flow response stay flat key-value pairs.

use guidevault_shared::{GuideVaultError, Result};
use serde_json::Value;

/// Delimiter joining multi-select choices.
const MULTI_SELECT_DELIMITER: &str = ", ";

/// Normalize one raw answer value into a flat string.
///
/// - Scalar strings pass through unchanged; numbers and booleans are
///   rendered in their canonical form.
/// - An object whose keys are all numeric-string indices is a multi-select
///   answer: values are joined in ascending index order.
/// - A JSON array is joined in element order.
/// - Anything else is malformed for that key; the caller omits the key and
///   reports the omission without failing the record.
pub fn normalize_answer(raw: &Value) -> Result<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => Ok(items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(MULTI_SELECT_DELIMITER)),
        Value::Object(map) => {
            let mut indexed: Vec<(u64, &Value)> = Vec::with_capacity(map.len());
            for (key, value) in map {
                let index = key.parse::<u64>().map_err(|_| {
                    GuideVaultError::malformed(
                        "answer value",
                        format!("non-numeric index key {key:?} in multi-select map"),
                    )
                })?;
                indexed.push((index, value));
            }
            indexed.sort_by_key(|(index, _)| *index);
            Ok(indexed
                .iter()
                .map(|(_, value)| scalar_text(value))
                .collect::<Vec<_>>()
                .join(MULTI_SELECT_DELIMITER))
        }
        Value::Null => Err(GuideVaultError::malformed("answer value", "null answer")),
    }
}

/// Render a choice value as text (choices are usually strings already).
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
