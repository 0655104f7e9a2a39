pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Scalar rendering shared by the flat formatters.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Flatten nested objects into dotted `(key, value)` rows.
///
/// Arrays of objects (histograms, CDFs, per-item scores) are summarised as
/// an entry count; arrays of scalars are joined.
pub fn flatten(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into("", map, &mut rows);
    rows
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&path, inner, rows),
            Value::Array(items) if items.iter().any(|v| v.is_object() || v.is_array()) => {
                rows.push((path, format!("[{} entries]", items.len())));
            }
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_text).collect();
                rows.push((path, joined.join(", ")));
            }
            _ => rows.push((path, scalar_text(val))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_summary() {
        let value = json!({
            "baseline_npv": "197.8",
            "summary": { "mean": 196.5, "percentiles": { "p50": 198.0 } },
            "histogram": [{ "count": 3 }, { "count": 1 }],
            "names": ["a", "b"],
        });
        let rows = flatten(value.as_object().unwrap());
        assert!(rows.contains(&("baseline_npv".into(), "197.8".into())));
        assert!(rows.contains(&("summary.mean".into(), "196.5".into())));
        assert!(rows.contains(&("summary.percentiles.p50".into(), "198.0".into())));
        assert!(rows.contains(&("histogram".into(), "[2 entries]".into())));
        assert!(rows.contains(&("names".into(), "a, b".into())));
    }
}
