//! XML result formatting.
//!
//! Rows are wrapped in a caller-named root element; each row becomes a child
//! element whose own children are one element per column, the tag equal to
//! the column name exactly as the driver reported it (unaliased columns may
//! therefore render upper-case). Text content is XML-escaped; tag names are
//! used verbatim.

use serde::{Deserialize, Serialize};

use crate::db::{ResultSet, Value};

/// Element naming for the XML writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlOptions {
    /// Name of the document root element.
    pub root_element_name: String,

    /// Name of the per-row element.
    pub row_element_name: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_element_name: "resultset".to_string(),
            row_element_name: "row".to_string(),
        }
    }
}

/// Serializes a result set as a pretty-printed XML document with a
/// declaration, 2-space indentation per nesting level.
pub fn write_xml(rows: &ResultSet, options: &XmlOptions) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");

    if rows.is_empty() {
        out.push_str(&format!("<{}/>", options.root_element_name));
        return out;
    }

    out.push_str(&format!("<{}>\n", options.root_element_name));
    for row in &rows.rows {
        out.push_str(&format!("  <{}>\n", options.row_element_name));
        for (column, value) in rows.columns.iter().zip(row.iter()) {
            match value {
                Value::Null => out.push_str(&format!("    <{}/>\n", column.name)),
                other => out.push_str(&format!(
                    "    <{name}>{text}</{name}>\n",
                    name = column.name,
                    text = escape_text(&other.to_display_string())
                )),
            }
        }
        out.push_str(&format!("  </{}>\n", options.row_element_name));
    }
    out.push_str(&format!("</{}>", options.root_element_name));
    out
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
