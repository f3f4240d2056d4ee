mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use sweeper_cleaner::{CheckoutArtifacts, StaleBuildCleaner, TracingEvents};
use sweeper_store::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = cli::Cli::parse();
    let settings = config::load_settings(&cli).await?;

    let db = Database::connect(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    if cli.migrate {
        migration::Migrator::up(&db, None).await?;
        tracing::info!("Database migrations complete");
    }

    let store = Arc::new(Store::new(db));
    let cleaner = StaleBuildCleaner::new(
        store,
        Arc::new(CheckoutArtifacts::new(settings.docroot.clone())),
        Arc::new(TracingEvents),
    );

    cleaner.run(settings.days, cli.dryrun).await?;

    Ok(())
}
