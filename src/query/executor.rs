//! Transactional statement execution.
//!
//! Runs one classified statement against a dedicated connection inside one
//! transaction: connect, begin at the requested isolation level, execute
//! with the configured timeout, commit on success, roll back on any failure.
//! Cancellation is observed synchronously before connecting, again after the
//! connection opens, and raced against the execute call itself.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::ExecutionPath;
use crate::db::{Connector, DatabaseClient, ResultSet, Statement};
use crate::error::{RelayError, Result};
use crate::query::{CommandKind, QueryInput, QueryOptions};

/// Raw result of a transactional execution, before the façade shapes it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecPayload {
    /// Affected-row count from the scalar path.
    Affected(u64),
    /// Materialized rows from the row or procedure path.
    Rows(ResultSet),
}

/// Executes one statement transactionally.
///
/// Exactly one attempt: every error is surfaced once, never retried. The
/// connection is acquired for this call alone and released on all paths.
pub async fn run(
    connector: &dyn Connector,
    input: &QueryInput,
    opts: &QueryOptions,
    path: ExecutionPath,
    cancel: &CancellationToken,
) -> Result<ExecPayload> {
    // Pre-cancelled invocations must never touch the network.
    if cancel.is_cancelled() {
        return Err(RelayError::Cancelled);
    }

    crate::db::validate_connection_string(&input.connection_string)?;

    debug!(%path, timeout = opts.timeout_seconds, "executing statement");
    let mut client = connector.connect(&input.connection_string).await?;

    if cancel.is_cancelled() {
        let _ = client.close().await;
        return Err(RelayError::Cancelled);
    }

    let result = run_in_transaction(client.as_mut(), input, opts, path, cancel).await;

    match result {
        Ok(payload) => {
            let _ = client.close().await;
            Ok(payload)
        }
        Err(e) => {
            // No partial commit is ever observable: roll back before
            // surfacing the failure, then release the connection.
            if let Err(rb) = client.rollback().await {
                warn!("rollback after failure also failed: {rb}");
            }
            let _ = client.close().await;
            Err(e)
        }
    }
}

async fn run_in_transaction(
    client: &mut dyn DatabaseClient,
    input: &QueryInput,
    opts: &QueryOptions,
    path: ExecutionPath,
    cancel: &CancellationToken,
) -> Result<ExecPayload> {
    let stmt = prepare_statement(input, opts)?;

    client.begin(opts.isolation_level).await?;
    let payload = dispatch(client, &stmt, path, cancel).await?;
    client.commit().await?;

    Ok(payload)
}

fn prepare_statement(input: &QueryInput, opts: &QueryOptions) -> Result<Statement> {
    let timeout = (opts.timeout_seconds > 0)
        .then(|| std::time::Duration::from_secs(opts.timeout_seconds));

    match input.command_kind {
        CommandKind::Text => Statement::text(&input.command_text, &input.parameters, timeout),
        CommandKind::StoredProcedure => {
            Statement::procedure(&input.command_text, &input.parameters, timeout)
        }
    }
}

async fn dispatch(
    client: &mut dyn DatabaseClient,
    stmt: &Statement,
    path: ExecutionPath,
    cancel: &CancellationToken,
) -> Result<ExecPayload> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        result = async {
            match path {
                ExecutionPath::Scalar => {
                    client.execute_count(stmt).await.map(ExecPayload::Affected)
                }
                ExecutionPath::Rows | ExecutionPath::Procedure => {
                    client.fetch_rows(stmt).await.map(ExecPayload::Rows)
                }
            }
        } => result,
    }
}
