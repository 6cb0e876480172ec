//! Statement classification module.
//!
//! Picks the execution path for a command: row-returning, scalar
//! (affected-row count), or stored-procedure call. Classification is a
//! leading-keyword heuristic, not a SQL parse: a statement whose meaningful
//! keyword is not the very first token (wrapped in comments, or a CTE) will
//! be misclassified. That limitation is accepted and documented.

use std::fmt;

use crate::query::CommandKind;

/// Keywords whose statements yield an affected-row count rather than rows.
const SCALAR_KEYWORDS: [&str; 6] = ["update", "insert", "drop", "truncate", "create", "alter"];

/// The execution path selected for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    /// Row-returning statement; the result is a materialized result set.
    Rows,
    /// Mutating/DDL statement; the result is an affected-row count.
    Scalar,
    /// Stored-procedure call; materialized like a row-returning statement.
    Procedure,
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Scalar => write!(f, "scalar"),
            Self::Procedure => write!(f, "procedure"),
        }
    }
}

/// Classifies a command into its execution path.
///
/// An explicit `StoredProcedure` kind wins regardless of the text. Otherwise
/// the trimmed, case-insensitive first token decides: a mutating/DDL keyword
/// selects the scalar path, anything else the row path. A bare procedure
/// name submitted as `Text` lands on the row path, which still works if the
/// driver accepts it — the classification is advisory.
pub fn classify(command_text: &str, kind: CommandKind) -> ExecutionPath {
    if kind == CommandKind::StoredProcedure {
        return ExecutionPath::Procedure;
    }

    let leading: String = command_text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();

    if SCALAR_KEYWORDS.contains(&leading.as_str()) {
        ExecutionPath::Scalar
    } else {
        ExecutionPath::Rows
    }
}
