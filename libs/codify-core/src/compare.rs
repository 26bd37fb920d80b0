/// Result Comparator - Structural Output Equality
///
/// **Core Responsibility:**
/// Decide whether a submission's actual output matches the expected output.
///
/// **Critical Properties:**
/// - Knows nothing about submissions or test cases
/// - Knows nothing about how code executes
/// - Pure function: (actual, expected) → bool
///
/// **Comparison Rules:**
/// - Differing JSON types: never equal
/// - Arrays: equal length required, then element-wise recursion (order matters)
/// - Objects: equal key-set size required, then every key present on both
///   sides with recursively equal values (key order irrelevant)
/// - Scalars: exact equality (no numeric coercion, `1` != `1.0`)
///
/// `serde_json::Value` trees are acyclic by construction, so the recursion
/// always terminates.

use serde_json::Value;

/// Structural equality over untyped JSON values.
pub fn compare(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| compare(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| compare(value, other)))
        }
        _ => false,
    }
}
