//! MySQL database client implementation.
//!
//! Wraps a single dedicated `sqlx` connection with manual transaction
//! control. Transactions are driven with plain `START TRANSACTION` /
//! `COMMIT` / `ROLLBACK` statements so the connection and transaction share
//! one lifetime, matching the one-connection-per-invocation model.

use crate::db::{ColumnInfo, DatabaseClient, IsolationLevel, ResultSet, Row, Statement, Value};
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as SqlxColumn, Connection as SqlxConnection, Executor, Row as SqlxRow, TypeInfo};
use tracing::{debug, warn};

/// MySQL client owning one connection for one invocation.
#[derive(Debug)]
pub struct MySqlClient {
    conn: MySqlConnection,
}

impl MySqlClient {
    /// Opens a new dedicated connection.
    ///
    /// The driver's diagnostic (malformed connection string, refused
    /// connection, failed auth) is surfaced verbatim in the error message.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let conn = MySqlConnection::connect(connection_string)
            .await
            .map_err(|e| RelayError::connection(e.to_string()))?;
        debug!("connected to database");
        Ok(Self { conn })
    }

    fn bind_statement(stmt: &Statement) -> Query<'_, MySql, MySqlArguments> {
        let mut query = sqlx::query(&stmt.sql);
        for value in &stmt.values {
            query = bind_value(query, value);
        }
        query
    }

    /// Best-effort column metadata for a statement that returned zero rows.
    async fn describe_columns(&mut self, sql: &str) -> Result<Vec<ColumnInfo>> {
        let describe = self
            .conn
            .describe(sql)
            .await
            .map_err(map_execution_error)?;
        Ok(describe
            .columns
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect())
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn begin(&mut self, isolation: IsolationLevel) -> Result<()> {
        if let Some(level) = isolation.as_sql() {
            let set = format!("SET TRANSACTION ISOLATION LEVEL {level}");
            self.conn
                .execute(set.as_str())
                .await
                .map_err(map_execution_error)?;
        }
        self.conn
            .execute("START TRANSACTION")
            .await
            .map_err(map_execution_error)?;
        debug!(%isolation, "transaction started");
        Ok(())
    }

    async fn fetch_rows(&mut self, stmt: &Statement) -> Result<ResultSet> {
        let fetch = Self::bind_statement(stmt).fetch_all(&mut self.conn);
        let rows: Vec<MySqlRow> = match stmt.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| timeout_error(limit))?
                .map_err(map_execution_error)?,
            None => fetch.await.map_err(map_execution_error)?,
        };

        let columns: Vec<ColumnInfo> = if let Some(first_row) = rows.first() {
            first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        } else {
            // Zero rows: fall back to the driver's reported schema.
            self.describe_columns(&stmt.sql).await.unwrap_or_default()
        };

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();
        debug!(rows = rows.len(), "fetched result set");
        Ok(ResultSet::with_data(columns, rows))
    }

    async fn execute_count(&mut self, stmt: &Statement) -> Result<u64> {
        let execute = Self::bind_statement(stmt).execute(&mut self.conn);
        let result = match stmt.timeout {
            Some(limit) => tokio::time::timeout(limit, execute)
                .await
                .map_err(|_| timeout_error(limit))?
                .map_err(map_execution_error)?,
            None => execute.await.map_err(map_execution_error)?,
        };
        debug!(affected = result.rows_affected(), "statement executed");
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<()> {
        self.conn
            .execute("COMMIT")
            .await
            .map_err(map_execution_error)?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute("ROLLBACK")
            .await
            .map_err(map_execution_error)?;
        warn!("transaction rolled back");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| RelayError::connection(e.to_string()))
    }
}

fn timeout_error(limit: std::time::Duration) -> RelayError {
    RelayError::execution(format!(
        "statement timed out after {} seconds",
        limit.as_secs()
    ))
}

/// Maps sqlx execution errors, preferring the server's own message text.
fn map_execution_error(error: sqlx::Error) -> RelayError {
    match error.as_database_error() {
        Some(db_error) => RelayError::execution(db_error.message().to_string()),
        None => RelayError::execution(error.to_string()),
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::UInt(u) => query.bind(*u),
        Value::Float(f) => query.bind(*f),
        Value::Decimal(d) => query.bind(*d),
        Value::String(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::DateTime(dt) => query.bind(*dt),
        Value::DateTimeTz(dt) => query.bind(*dt),
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Decoding is driven by the driver-reported type name; DECIMAL goes through
/// `rust_decimal` so the full stored precision survives into the output.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let name = type_name.to_uppercase();

    if name.contains("UNSIGNED") {
        return row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::UInt)
            .unwrap_or(Value::Null);
    }

    match name.as_str() {
        "BOOLEAN" | "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" => row
            .try_get::<Option<i8>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "MEDIUMINT" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(Value::Decimal)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(Value::Time)
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(Value::DateTime)
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(Value::DateTimeTz)
            .unwrap_or(Value::Null),

        "YEAR" => row
            .try_get::<Option<u16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::UInt(v as u64))
            .unwrap_or(Value::Null),

        "BIT" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::UInt)
            .unwrap_or(Value::Null),

        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // CHAR, VARCHAR, TEXT, ENUM, SET, JSON and anything else: string.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
