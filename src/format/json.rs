//! JSON result formatting.
//!
//! Rows become an array of objects whose keys follow the column order
//! (serde_json is built with `preserve_order`). Numeric columns render as
//! JSON numbers; DECIMAL columns keep their full stored precision through
//! serde_json's `arbitrary_precision` numbers rather than being narrowed to
//! f64.

use serde_json::{Map, Number};

use crate::db::{ResultSet, Value};
use crate::error::{RelayError, Result};

/// Serializes a result set as a 2-space-indented JSON document.
/// An empty result set renders as `[]`.
pub fn write_json(rows: &ResultSet) -> Result<String> {
    serde_json::to_string_pretty(&rows_to_json(rows))
        .map_err(|e| RelayError::format(e.to_string()))
}

/// Converts a result set into a JSON array of row objects, for callers that
/// want the structured token rather than a rendered document.
pub fn rows_to_json(rows: &ResultSet) -> serde_json::Value {
    let array = rows
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::with_capacity(rows.columns.len());
            for (column, value) in rows.columns.iter().zip(row.iter()) {
                object.insert(column.name.clone(), value_to_json(value));
            }
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(array)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
        Value::UInt(u) => serde_json::Value::Number(Number::from(*u)),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Decimal(d) => {
            // Full precision; parse never fails for Decimal's rendering, but
            // fall back to a string rather than lose digits.
            let text = d.to_string();
            text.parse::<Number>()
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::String(text))
        }
        other => serde_json::Value::String(other.to_display_string()),
    }
}
