//! db-relay - transactional SQL execution for workflow hosts.
//!
//! Runs one SQL statement or stored procedure per invocation inside a single
//! transaction and shapes the result as structured rows, an affected-row
//! count, or a rendered JSON/XML/CSV document.

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod query;
