use anyhow::Context;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use federation_roster::config::Config;
use federation_roster::database::{self, schema};
use federation_roster::services::legacy_migration_service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let pool = database::connect(&config.database_url)
        .await
        .with_context(|| format!("cannot open database {}", config.database_url))?;
    schema::initialize(&pool).await?;

    let report = legacy_migration_service::migrate_legacy(&pool)
        .await
        .context("legacy migration failed")?;

    if !report.legacy_present {
        println!("legacy migration: no legacy tables found");
    } else if report.already_migrated {
        println!("legacy migration: already done");
    } else {
        println!(
            "legacy migration: candidates={}, migrated={}, skipped={}, achievements={}, orphaned={}, logs={}",
            report.candidates,
            report.migrated,
            report.skipped,
            report.achievements,
            report.orphaned_achievements,
            report.activity_logs
        );
    }
    Ok(())
}
