//! db-relay - transactional SQL execution for workflow hosts.

mod cli;

use cli::{Cli, Command};
use db_relay::config::RelayConfig;
use db_relay::error::{RelayError, Result};
use db_relay::logging;
use db_relay::query::{ExecutionOutcome, QueryInput, QueryTask};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = RelayConfig::load(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let connection_string = cli.connection_string()?.to_string();
    let task = QueryTask::new();

    let outcome = match &cli.command {
        Command::Exec { sql, common } => {
            let input = QueryInput::new(&connection_string, sql)
                .with_parameters(common.parameters()?);
            let options = common.apply(config.query_options());
            task.execute_query(&input, &options, &cancel).await?
        }
        Command::Proc { name, common } => {
            let input = QueryInput::new(&connection_string, name)
                .with_parameters(common.parameters()?);
            let options = common.apply(config.query_options());
            task.execute_procedure(&input, &options, &cancel).await?
        }
        Command::Query {
            sql,
            common,
            format,
            separator,
            no_headers,
            root,
            row,
            out,
        } => {
            let input = QueryInput::new(&connection_string, sql)
                .with_parameters(common.parameters()?);
            let options = common.apply(config.query_options());
            let output = cli::output_options(*format, separator, *no_headers, root, row, out.as_ref());
            task.query(&input, &output, &options, &cancel).await?
        }
    };

    print_outcome(&outcome)
}

/// Cancels the token on the first Ctrl-C so an in-flight statement rolls
/// back instead of committing half-done work.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

fn print_outcome(outcome: &ExecutionOutcome) -> Result<()> {
    let rendered = serde_json::to_string_pretty(outcome)
        .map_err(|e| RelayError::format(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
