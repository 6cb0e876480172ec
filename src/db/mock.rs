//! Mock database clients for testing.
//!
//! `MockConnector` hands out in-memory clients with canned results and keeps
//! a journal of the transaction calls made against them, so tests can assert
//! on commit/rollback ordering. `FailingConnector` records whether a connect
//! was ever attempted, which is how the pre-cancellation contract is checked.

use super::{DatabaseClient, Connector, IsolationLevel, ResultSet, Statement};
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Canned behavior for a mock client's execute calls.
#[derive(Debug, Clone)]
enum MockBehavior {
    Rows(ResultSet),
    Affected(u64),
    FailExecution(String),
}

/// A mock connector that returns predefined results.
#[derive(Debug, Clone)]
pub struct MockConnector {
    behavior: MockBehavior,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    /// Creates a connector whose clients return the given rows.
    pub fn with_rows(rows: ResultSet) -> Self {
        Self::new(MockBehavior::Rows(rows))
    }

    /// Creates a connector whose clients report the given affected-row count.
    pub fn with_affected(count: u64) -> Self {
        Self::new(MockBehavior::Affected(count))
    }

    /// Creates a connector whose clients fail every execute call.
    pub fn failing_execution(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailExecution(message.into()))
    }

    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the calls made against clients of this connector, in order.
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _connection_string: &str) -> Result<Box<dyn DatabaseClient>> {
        self.record("connect");
        Ok(Box::new(MockDatabaseClient {
            behavior: self.behavior.clone(),
            journal: Arc::clone(&self.journal),
        }))
    }
}

/// A mock database client backing [`MockConnector`].
#[derive(Debug)]
pub struct MockDatabaseClient {
    behavior: MockBehavior,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockDatabaseClient {
    fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn begin(&mut self, isolation: IsolationLevel) -> Result<()> {
        self.record(format!("begin {isolation}"));
        Ok(())
    }

    async fn fetch_rows(&mut self, stmt: &Statement) -> Result<ResultSet> {
        self.record(format!("fetch {}", stmt.sql));
        match &self.behavior {
            MockBehavior::Rows(rows) => Ok(rows.clone()),
            MockBehavior::Affected(_) => Ok(ResultSet::new()),
            MockBehavior::FailExecution(msg) => Err(RelayError::execution(msg.clone())),
        }
    }

    async fn execute_count(&mut self, stmt: &Statement) -> Result<u64> {
        self.record(format!("execute {}", stmt.sql));
        match &self.behavior {
            MockBehavior::Rows(_) => Ok(0),
            MockBehavior::Affected(count) => Ok(*count),
            MockBehavior::FailExecution(msg) => Err(RelayError::execution(msg.clone())),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.record("commit");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record("rollback");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

/// A connector that must never be reached.
///
/// Connect attempts fail and are recorded; a pre-cancelled invocation is
/// required to short-circuit before ever calling it.
#[derive(Debug, Clone, Default)]
pub struct FailingConnector {
    attempted: Arc<AtomicBool>,
}

impl FailingConnector {
    /// Creates a new failing connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a connect was ever attempted.
    pub fn was_attempted(&self) -> bool {
        self.attempted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, _connection_string: &str) -> Result<Box<dyn DatabaseClient>> {
        self.attempted.store(true, Ordering::SeqCst);
        Err(RelayError::connection(
            "connect attempted against FailingConnector",
        ))
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

    #[tokio::test]
    async fn test_mock_returns_canned_rows() {
        let connector = MockConnector::with_rows(hodor_rows());
        let mut client = connector.connect("mysql://test").await.unwrap();

        let stmt = Statement::text("select * from hodortest", &[], None).unwrap();
        let rows = client.fetch_rows(&stmt).await.unwrap();
        assert_eq!(rows.row_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_journal_records_calls() {
        let connector = MockConnector::with_affected(3);
        let mut client = connector.connect("mysql://test").await.unwrap();

        client.begin(IsolationLevel::Serializable).await.unwrap();
        let stmt = Statement::text("update t set x = 1", &[], None).unwrap();
        client.execute_count(&stmt).await.unwrap();
        client.commit().await.unwrap();

        assert_eq!(
            connector.journal(),
            vec![
                "connect",
                "begin SERIALIZABLE",
                "execute update t set x = 1",
                "commit"
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_connector_records_attempt() {
        let connector = FailingConnector::new();
        assert!(!connector.was_attempted());
        assert!(connector.connect("mysql://test").await.is_err());
        assert!(connector.was_attempted());
    }
}
