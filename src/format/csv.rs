//! Delimited-text result formatting.
//!
//! Fields are joined with the configured separator and rows are terminated
//! with CRLF. There is no quoting or escaping: a value containing the
//! separator shifts the following columns. That limitation is carried over
//! from the reference behavior on purpose; callers needing safe CSV should
//! pick a separator that cannot occur in their data.

use serde::{Deserialize, Serialize};

use crate::db::{ResultSet, Value};

/// Delimiter and header settings for the CSV writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field separator, typically `;` or `,`.
    pub separator: String,

    /// When true, the first line holds the column names.
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: ";".to_string(),
            include_headers: true,
        }
    }
}

/// Serializes a result set as delimited text, every line CRLF-terminated.
pub fn write_csv(rows: &ResultSet, options: &CsvOptions) -> String {
    let mut out = String::new();

    if options.include_headers {
        let header: Vec<&str> = rows.column_names().collect();
        out.push_str(&header.join(&options.separator));
        out.push_str("\r\n");
    }

    for row in &rows.rows {
        let fields: Vec<String> = row.iter().map(csv_field).collect();
        out.push_str(&fields.join(&options.separator));
        out.push_str("\r\n");
    }

    out
}

/// NULL renders as an empty field; everything else uses its display text.
fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_display_string(),
    }
}
