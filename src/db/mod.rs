//! Database abstraction layer for db-relay.
//!
//! Provides a trait-based interface over the driver so the transactional
//! executor can be tested against mock backends. Each client owns exactly one
//! connection for the lifetime of one invocation; there is no pooling.

mod mock;
mod mysql;
mod params;
mod types;

pub use mock::{FailingConnector, MockConnector, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use params::{ParamType, Parameter, Statement};
pub use types::{ColumnInfo, ResultSet, Row, Value};

use crate::error::{RelayError, Result};
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    MySql,
    // Future: Postgres, SQL Server, etc.
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
        }
    }

    /// Parses a backend from a connection-string scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }
}

/// The concurrency-consistency guarantee requested for the invocation's
/// transaction. `DriverDefault` leaves the session setting alone (REPEATABLE
/// READ on MySQL-family drivers, but that is the driver's call, not ours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    #[default]
    DriverDefault,
}

impl IsolationLevel {
    /// Returns the SQL spelling for `SET TRANSACTION ISOLATION LEVEL`, or
    /// `None` for the driver default.
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            Self::ReadUncommitted => Some("READ UNCOMMITTED"),
            Self::ReadCommitted => Some("READ COMMITTED"),
            Self::RepeatableRead => Some("REPEATABLE READ"),
            Self::Serializable => Some("SERIALIZABLE"),
            Self::DriverDefault => None,
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql().unwrap_or("DRIVER DEFAULT"))
    }
}

/// Opens connections for the executor. The default implementation talks to
/// MySQL; tests substitute mock connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a dedicated connection for one invocation.
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn DatabaseClient>>;
}

/// A single dedicated database connection with manual transaction control.
///
/// All operations are async and return Results with RelayError. The executor
/// drives the calls in a fixed order: `begin`, one execute, then `commit` or
/// `rollback`, then `close`.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Begins a transaction at the given isolation level.
    async fn begin(&mut self, isolation: IsolationLevel) -> Result<()>;

    /// Executes a row-returning statement and materializes the result set.
    async fn fetch_rows(&mut self, stmt: &Statement) -> Result<ResultSet>;

    /// Executes a mutating statement and returns the affected-row count.
    async fn execute_count(&mut self, stmt: &Statement) -> Result<u64>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Closes the connection. Always called, on success and failure paths.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Default connector backed by the MySQL driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn DatabaseClient>> {
        let client = MySqlClient::connect(connection_string).await?;
        Ok(Box::new(client))
    }
}

/// Validates that a connection string is well-formed for a known backend.
///
/// The driver performs its own, stricter parse on connect; this is an early
/// shape check so plainly malformed input fails as a connection error
/// carrying the parse diagnostic, without a network round trip.
pub fn validate_connection_string(conn_str: &str) -> Result<DatabaseBackend> {
    let url = url::Url::parse(conn_str)
        .map_err(|e| RelayError::connection(format!("Invalid connection string: {e}")))?;
    DatabaseBackend::parse(url.scheme()).ok_or_else(|| {
        RelayError::connection(format!(
            "Unsupported scheme '{}'. Expected 'mysql' or 'mariadb'",
            url.scheme()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(
            IsolationLevel::ReadCommitted.as_sql(),
            Some("READ COMMITTED")
        );
        assert_eq!(
            IsolationLevel::RepeatableRead.as_sql(),
            Some("REPEATABLE READ")
        );
        assert_eq!(IsolationLevel::Serializable.as_sql(), Some("SERIALIZABLE"));
        assert_eq!(IsolationLevel::DriverDefault.as_sql(), None);
    }

    #[test]
    fn test_isolation_level_default_is_driver_default() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::DriverDefault);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(DatabaseBackend::parse("mysql"), Some(DatabaseBackend::MySql));
        assert_eq!(
            DatabaseBackend::parse("MariaDB"),
            Some(DatabaseBackend::MySql)
        );
        assert_eq!(DatabaseBackend::parse("postgres"), None);
    }

    #[test]
    fn test_validate_connection_string() {
        assert_eq!(
            validate_connection_string("mysql://root:pw@localhost:3306/test").unwrap(),
            DatabaseBackend::MySql
        );
        assert!(validate_connection_string("not a url").is_err());
        assert!(validate_connection_string("postgres://localhost/db").is_err());
    }

    #[test]
    fn test_validation_failures_are_connection_errors() {
        let err = validate_connection_string("not a url").unwrap_err();
        assert_eq!(err.category(), "Connection Error");
        assert!(err.to_string().contains("Invalid connection string"));

        let err = validate_connection_string("postgres://localhost/db").unwrap_err();
        assert_eq!(err.category(), "Connection Error");
    }
}
