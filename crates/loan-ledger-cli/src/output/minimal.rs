use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the key answer from the output.
///
/// Looks for well-known ledger fields in priority order, then falls back to
/// the first scalar field of the result.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    let priority_keys = ["weekly_installment", "outstanding", "rejected", "total_repayable"];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array() && !v.is_object()) {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}
