pub mod achievements_repo;
pub mod activity_log_repo;
pub mod legacy_repo;
pub mod participants_repo;
pub mod schema;
pub mod sessions_repo;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens the pool, creating the database file when it does not exist yet.
pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
}

/// Single-connection in-memory pool; every connection to `:memory:` is its own database.
pub async fn connect_in_memory() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Opens a transaction that takes the write lock up front.
///
/// A deferred `BEGIN` that reads first fails with `SQLITE_BUSY` when it later
/// tries to write after another writer committed; the busy timeout does not
/// cover that upgrade. `BEGIN IMMEDIATE` makes writers queue on the timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}
