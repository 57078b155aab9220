//! Metadata sanitization for indexed passages.

use serde_json::{Map, Value};

/// Reduce metadata to scalar-or-null values.
///
/// Strings, numbers, bools and nulls pass through; arrays and objects are
/// replaced by their compact JSON rendering so equality filters stay plain
/// value comparisons.
pub fn sanitize(metadata: Map<String, Value>) -> Map<String, Value> {
  metadata
    .into_iter()
    .map(|(key, value)| {
      let value = match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value,
        other => Value::String(other.to_string()),
      };
      (key, value)
    })
    .collect()
}
