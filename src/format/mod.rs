//! Output formats for db-relay.
//!
//! Converts an in-memory result set into a JSON, XML, or delimited-text
//! document under caller-supplied options. Formatting is deterministic given
//! identical input; the exact textual shapes are part of the connector's
//! contract and asserted byte-for-byte in tests.

pub mod csv;
pub mod json;
pub mod xml;

pub use csv::CsvOptions;
pub use xml::XmlOptions;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::db::ResultSet;
use crate::error::{RelayError, Result};

/// The output document shape for the legacy query operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of row objects, 2-space indented.
    Json,
    /// Pretty-printed XML document.
    Xml(XmlOptions),
    /// Delimited text with CRLF row terminators.
    Csv(CsvOptions),
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Json
    }
}

/// Where and how the formatted document is delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Selected document format.
    pub format: OutputFormat,

    /// When true, the document is written to `file_path` and the path is
    /// returned as the payload instead of the inline string.
    #[serde(default)]
    pub write_to_file: bool,

    /// Target path for `write_to_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl OutputOptions {
    /// JSON output, returned inline.
    pub fn json() -> Self {
        Self {
            format: OutputFormat::Json,
            ..Default::default()
        }
    }

    /// XML output with the given root and row element names.
    pub fn xml(root_element_name: impl Into<String>, row_element_name: impl Into<String>) -> Self {
        Self {
            format: OutputFormat::Xml(XmlOptions {
                root_element_name: root_element_name.into(),
                row_element_name: row_element_name.into(),
            }),
            ..Default::default()
        }
    }

    /// CSV output with the given separator.
    pub fn csv(separator: impl Into<String>, include_headers: bool) -> Self {
        Self {
            format: OutputFormat::Csv(CsvOptions {
                separator: separator.into(),
                include_headers,
            }),
            ..Default::default()
        }
    }

    /// Redirects the document to a file.
    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_to_file = true;
        self.file_path = Some(path.into());
        self
    }

    /// Returns the target path, failing when file output was requested
    /// without one.
    pub fn target_path(&self) -> Result<&PathBuf> {
        self.file_path
            .as_ref()
            .ok_or_else(|| RelayError::format("file output requested without a file path"))
    }
}

/// Formats a result set per the selected output format.
pub fn format(rows: &ResultSet, options: &OutputOptions) -> Result<String> {
    match &options.format {
        OutputFormat::Json => json::write_json(rows),
        OutputFormat::Xml(opts) => Ok(xml::write_xml(rows, opts)),
        OutputFormat::Csv(opts) => Ok(csv::write_csv(rows, opts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, Value};

    fn hodor_rows() -> ResultSet {
        ResultSet::with_data(
            vec![
                ColumnInfo::new("name", "VARCHAR"),
                ColumnInfo::new("value", "INT"),
            ],
            vec![
                vec![Value::from("hodor"), Value::Int(123)],
                vec![Value::from("jon"), Value::Int(321)],
            ],
        )
    }

    #[test]
    fn test_dispatch_json() {
        let doc = format(&hodor_rows(), &OutputOptions::json()).unwrap();
        assert!(doc.starts_with('['));
    }

    #[test]
    fn test_dispatch_xml() {
        let doc = format(&hodor_rows(), &OutputOptions::xml("resultset", "row")).unwrap();
        assert!(doc.starts_with("<?xml"));
    }

    #[test]
    fn test_dispatch_csv() {
        let doc = format(&hodor_rows(), &OutputOptions::csv(";", true)).unwrap();
        assert!(doc.starts_with("name;value"));
    }

    #[test]
    fn test_target_path_missing_is_format_error() {
        let mut options = OutputOptions::json();
        options.write_to_file = true;
        let err = options.target_path().unwrap_err();
        assert_eq!(err.category(), "Format Error");
    }
}
