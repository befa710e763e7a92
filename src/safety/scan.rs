//! Recursive structural scanning of request bodies.
//!
//! Payloads arrive as arbitrary nested JSON. The evaluator needs two views:
//! every string field flattened into one text blob, and numeric fields
//! selected by a key predicate. Both are simple folds over the
//! `serde_json::Value` tree.

use serde_json::Value;

/// Collect every string leaf, depth-first.
fn collect_strings<'a>(value: &'a Value, acc: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => acc.push(s),
        Value::Array(items) => {
            for item in items {
                collect_strings(item, acc);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, acc);
            }
        }
        _ => {}
    }
}

/// All string leaves joined into one space-separated blob.
pub fn joined_text(value: &Value) -> String {
    let mut acc = Vec::new();
    collect_strings(value, &mut acc);
    acc.join(" ")
}

/// Collect finite numeric values whose key satisfies the predicate.
/// Keys are matched case-insensitively; nested containers are searched
/// regardless of whether their own key matched.
pub fn numbers_by_key(value: &Value, predicate: impl Fn(&str) -> bool) -> Vec<f64> {
    let mut acc = Vec::new();
    collect_numbers(value, &predicate, &mut acc);
    acc
}

fn collect_numbers(value: &Value, predicate: &impl Fn(&str) -> bool, acc: &mut Vec<f64>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_numbers(item, predicate, acc);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if predicate(&key.to_lowercase()) {
                    if let Some(n) = item.as_f64() {
                        if n.is_finite() {
                            acc.push(n);
                        }
                    }
                }
                collect_numbers(item, predicate, acc);
            }
        }
        _ => {}
    }
}

/// First finite number stored under any of the given key aliases.
pub fn first_number_by_keys(value: &Value, keys: &[&str]) -> Option<f64> {
    let normalized: Vec<String> = keys.iter().map(|k| k.to_lowercase()).collect();
    numbers_by_key(value, |key| normalized.iter().any(|k| k == key))
        .first()
        .copied()
}

/// Normalize a ratio-or-percentage value to a fraction. Values above 1 are
/// treated as percentages.
pub fn normalize_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}
