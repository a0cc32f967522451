//! Schema bootstrap and the `schema_meta` key/value table.

use sqlx::{Sqlite, SqlitePool};
use tracing::info;

use crate::database::begin_write;

pub const CURRENT_VERSION: i64 = 1;

const VERSION_KEY: &str = "schema_version";

pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    participant_id TEXT NOT NULL UNIQUE,
    callsign TEXT NOT NULL UNIQUE,
    photo_url TEXT NOT NULL DEFAULT 'default-pilot.svg',
    category TEXT NOT NULL,
    subcategory TEXT,
    join_date TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0,
    qr_code TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_participants_points ON participants(points DESC)",
    r#"
CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    points INTEGER NOT NULL,
    date_awarded TEXT NOT NULL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_achievements_participant ON achievements(participant_id, date_awarded)",
    r#"
CREATE TABLE IF NOT EXISTS activity_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action_type TEXT NOT NULL,
    participant_id INTEGER REFERENCES participants(id) ON DELETE SET NULL,
    participant_name TEXT,
    description TEXT NOT NULL,
    points_awarded INTEGER,
    timestamp TEXT NOT NULL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_activity_logs_timestamp ON activity_logs(timestamp DESC)",
    r#"
CREATE TABLE IF NOT EXISTS admin_sessions (
    token TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
)
"#,
];

/// Creates all tables and indexes if they don't exist and records the schema version.
pub async fn initialize(pool: &SqlitePool) -> sqlx::Result<()> {
    let mut tx = begin_write(pool).await?;
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    let version = get_meta(&mut *tx, VERSION_KEY)
        .await?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    if version < CURRENT_VERSION {
        set_meta(&mut *tx, VERSION_KEY, &CURRENT_VERSION.to_string()).await?;
        info!("🗄️  Schema initialized at version {}", CURRENT_VERSION);
    }

    tx.commit().await
}

const SQL_GET_META: &str = "SELECT value FROM schema_meta WHERE key = ?1";

pub async fn get_meta<'e, E>(executor: E, key: &str) -> sqlx::Result<Option<String>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(SQL_GET_META)
        .bind(key)
        .fetch_optional(executor)
        .await
}

const SQL_SET_META: &str = "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)";

pub async fn set_meta<'e, E>(executor: E, key: &str, value: &str) -> sqlx::Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(SQL_SET_META)
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;

    #[tokio::test]
    async fn initialize_creates_tables_and_version() {
        let pool = connect_in_memory().await.unwrap();
        initialize(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec![
                "achievements",
                "activity_logs",
                "admin_sessions",
                "participants",
                "schema_meta"
            ]
        );

        let version = get_meta(&pool, VERSION_KEY).await.unwrap();
        assert_eq!(version.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        initialize(&pool).await.unwrap();
        initialize(&pool).await.unwrap();
    }
}
