use serde_json::Value;

use super::scalar_text;

/// Headline figures in priority order; the first non-null one is printed.
const PRIORITY_KEYS: [&str; 9] = [
    "verdict",
    "npv",
    "irr",
    "real_rate",
    "baseline_npv",
    "mean",
    "project_risk",
    "headline",
    "cache_key",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

fn minimal_text(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return scalar_text(result_obj);
    };

    for key in PRIORITY_KEYS {
        match map.get(key) {
            // project risk is an object; its level is the answer
            Some(Value::Object(inner)) => {
                if let Some(level) = inner.get("level") {
                    return scalar_text(level);
                }
            }
            Some(val) if !val.is_null() => return scalar_text(val),
            _ => {}
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{key}: {}", scalar_text(val)),
        None => String::new(),
    }
}
