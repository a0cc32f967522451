use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use federation_roster::config::Config;
use federation_roster::database::{self, schema};
use federation_roster::services::{legacy_migration_service, seed_service};
use federation_roster::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    info!(
        "Starting federation-roster build {}",
        option_env!("ROSTER_BUILD_ID").unwrap_or("dev")
    );

    let config = Config::from_env().context("invalid configuration")?;
    config.warn_if_insecure();

    info!("Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url)
        .await
        .with_context(|| format!("cannot open database {}", config.database_url))?;
    schema::initialize(&pool)
        .await
        .context("schema initialization failed")?;

    legacy_migration_service::migrate_legacy(&pool)
        .await
        .context("legacy migration failed")?;

    tokio::fs::create_dir_all(&config.qr_dir)
        .await
        .with_context(|| format!("cannot create QR directory {}", config.qr_dir.display()))?;

    let host = config.host.clone();
    let port = config.port;
    let seed = config.seed_demo_data;
    let state = AppState::new(pool, config);

    if seed {
        for row in seed_service::seed_demo_pilots(&state.pool).await? {
            state.qr.ensure_logged(&row).await;
        }
    }

    let app = web::router(state);

    // Fall back to the next port when the configured one is taken.
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("cannot parse listen address {}:{}", host, port))?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback_port = port.checked_add(1).context("no fallback port above 65535")?;
            warn!(
                "⚠️  Could not bind {}: {}. Trying fallback {}:{}",
                addr, e, host, fallback_port
            );
            let fallback: SocketAddr = format!("{}:{}", host, fallback_port)
                .parse()
                .context("cannot parse fallback address")?;
            tokio::net::TcpListener::bind(fallback)
                .await
                .with_context(|| format!("cannot bind fallback {}", fallback))?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("🚀 Server running on http://{}", bound_addr);
    info!("📍 Admin panel at http://{}/admin", bound_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
