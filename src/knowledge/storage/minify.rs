//! Payload minification applied during store maintenance.

use serde_json::Value;

/// Shrink a payload without changing its meaning for readers.
///
/// Strings are trimmed, `null` elements are dropped from arrays, and `null`
/// fields are dropped from objects, recursing into the remaining object
/// values. Array elements are kept as-is apart from the `null` filter.
#[must_use]
pub fn minify(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(text.trim().to_string()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .cloned()
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(_, field)| !field.is_null())
                .map(|(key, field)| (key.clone(), minify(field)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}
