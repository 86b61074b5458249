//! # Kontor API Main Entry Point

use migration::MigratorTrait;

use kontor::{config::ConfigLoader, db, seeds, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "effective configuration");
    }

    let db = db::init_pool(&config).await?;
    migration::Migrator::up(&db, None).await?;

    if config.seed_on_start {
        seeds::seed_rbac(&db).await?;
        seeds::seed_admin(&db, &config).await?;
    }

    run_server(config, db).await
}
