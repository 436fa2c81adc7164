use std::sync::Arc;

use anyhow::Context;

use bank_ledger::config::{AppConfig, CliArgs, StoreBackend};
use bank_ledger::db::Database;
use bank_ledger::gateway::{self, state::AppState};
use bank_ledger::logging::init_logging;
use bank_ledger::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse(std::env::args())?;
    let app_config = AppConfig::from_cli(&cli)
        .with_context(|| format!("loading config for env '{}'", cli.env))?;
    let _log_guard = init_logging(&app_config);

    tracing::info!(env = %cli.env, backend = ?app_config.database.backend, "Starting bank ledger");
    let addr = app_config.server_addr();

    match app_config.database.backend {
        StoreBackend::Postgres => {
            let db = Database::connect(&app_config.database)
                .await
                .context("connecting to PostgreSQL")?;
            db.health_check()
                .await
                .context("PostgreSQL health check")?;
            db.migrate().await.context("applying ledger schema")?;

            let store = Arc::new(PgStore::new(db.pool().clone()));
            gateway::run_server(&addr, Arc::new(AppState::new(store))).await?;
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; ledger state is lost on exit");
            let store = Arc::new(MemoryStore::new());
            gateway::run_server(&addr, Arc::new(AppState::new(store))).await?;
        }
    }

    Ok(())
}
