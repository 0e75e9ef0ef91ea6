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

/// Row-shaped fields of a result, in the order they should be rendered.
const ROW_FIELDS: [&str; 3] = ["schedule", "steps", "loans"];

/// The `result` object of a computation envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// The first non-empty row-shaped array in a result object.
pub(crate) fn primary_rows(result: &Map<String, Value>) -> Option<(&'static str, &Vec<Value>)> {
    ROW_FIELDS.iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(rows)) if !rows.is_empty() => Some((*key, rows)),
        _ => None,
    })
}

pub(crate) fn is_row_field(key: &str) -> bool {
    ROW_FIELDS.contains(&key)
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_of_unwraps_envelope() {
        let envelope = json!({ "result": { "outstanding": "10" }, "warnings": [] });
        assert_eq!(result_of(&envelope), &json!({ "outstanding": "10" }));
        let bare = json!({ "outstanding": "10" });
        assert_eq!(result_of(&bare), &bare);
    }

    #[test]
    fn test_primary_rows_skips_empty_arrays() {
        let result = json!({ "steps": [], "loans": [{ "id": 1 }] });
        let (key, rows) = primary_rows(result.as_object().unwrap()).unwrap();
        assert_eq!(key, "loans");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(&json!("12.50")), "12.50");
        assert_eq!(format_scalar(&json!(true)), "true");
        assert_eq!(format_scalar(&Value::Null), "");
    }
}
