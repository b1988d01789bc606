//! CLI command implementations
//!
//! Each command resolves configuration, acquires one store, performs one
//! unit of work and releases the store on every exit path before reporting.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::applier::{reconcile, ReconcileReport};
use crate::config::Config;
use crate::seed::{seed as run_seed, SeedOptions, SeedReport};
use crate::store::{DocumentStore, MongoStore};

use super::args::{Cli, Command};
use super::errors::CliResult;

/// Parses arguments and runs the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = Config::from_env()?;
    run_command(cli.command, &config).await
}

/// Connects with `config` and runs `command`, printing its summary
pub async fn run_command(command: Command, config: &Config) -> CliResult<()> {
    info!(url = %config.redacted_url(), database = %config.database, "connecting");
    let store = MongoStore::connect(config).await?;
    let summary = execute(store, command).await?;
    println!("{}", summary);
    Ok(())
}

/// Runs `command` against `store`, then closes it whatever the outcome.
///
/// Returns the human-readable summary.
pub async fn execute<S: DocumentStore>(store: S, command: Command) -> CliResult<String> {
    let result = match command {
        Command::Init => init(&store).await.map(|report| report.to_string()),
        Command::Seed { drop } => seed(&store, drop).await.map(|report| report.to_string()),
    };
    store.close().await;
    result
}

/// Reconciles validators and indexes
pub async fn init<S: DocumentStore>(store: &S) -> CliResult<ReconcileReport> {
    info!(database = store.database_name(), "initializing database");
    Ok(reconcile(store).await?)
}

/// Inserts sample data, optionally clearing existing documents first
pub async fn seed<S: DocumentStore>(store: &S, drop: bool) -> CliResult<SeedReport> {
    let mut rng = StdRng::from_entropy();
    Ok(run_seed(store, SeedOptions { drop }, &mut rng).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;
    use crate::store::{MemoryStore, Operation, StoreError};

    #[tokio::test]
    async fn test_init_reports_and_releases_store() {
        let server = MemoryStore::new("triage");
        let summary = execute(server.connect(), Command::Init).await.unwrap();

        assert!(summary.contains("created collection: patients"));
        assert_eq!(server.open_connections(), 1);
    }

    #[tokio::test]
    async fn test_failure_still_releases_store() {
        let server = MemoryStore::new("triage");
        server.fail_next(
            Operation::ListCollections,
            None,
            StoreError::Connection("connection reset".into()),
        );

        let err = execute(server.connect(), Command::Init).await.unwrap_err();

        assert_eq!(err.code(), CliErrorCode::ConnectionError);
        assert_eq!(server.open_connections(), 1);
    }

    #[tokio::test]
    async fn test_seed_summary() {
        let server = MemoryStore::new("triage");
        execute(server.connect(), Command::Init).await.unwrap();

        let summary = execute(server.connect(), Command::Seed { drop: true })
            .await
            .unwrap();
        assert!(summary.starts_with("Dropped existing data"));
        assert!(summary.contains("Seed complete: 3 patients"));
    }
}
