//! Read access to the pilot-era tables (`pilot`, `achievement`, `admin_activity_log`).

use sqlx::{FromRow, Sqlite};

pub const LEGACY_PILOT_TABLE: &str = "pilot";
pub const LEGACY_ACHIEVEMENT_TABLE: &str = "achievement";
pub const LEGACY_ACTIVITY_LOG_TABLE: &str = "admin_activity_log";

#[derive(Debug, Clone, FromRow)]
pub struct LegacyPilotRow {
    pub id: i64,
    pub pilot_id: Option<String>,
    pub callsign: String,
    pub photo_url: Option<String>,
    pub category: Option<String>,
    pub join_date: Option<String>,
    pub points: Option<i64>,
    pub qr_code: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LegacyAchievementRow {
    pub pilot_id: i64,
    pub description: String,
    pub points: i64,
    pub date_awarded: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LegacyActivityLogRow {
    pub action_type: String,
    pub pilot_id: Option<i64>,
    pub pilot_name: Option<String>,
    pub description: String,
    pub points_awarded: Option<i64>,
    pub timestamp: Option<String>,
}

const SQL_TABLE_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";

pub async fn table_exists<'e, E>(executor: E, table: &str) -> sqlx::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, bool>(SQL_TABLE_EXISTS)
        .bind(table)
        .fetch_one(executor)
        .await
}

const SQL_LIST_PILOTS: &str = r#"
SELECT
    id,
    pilot_id,
    callsign,
    photo_url,
    category,
    CAST(join_date AS TEXT) AS join_date,
    points,
    qr_code
FROM pilot
ORDER BY id ASC
"#;

pub async fn list_pilots<'e, E>(executor: E) -> sqlx::Result<Vec<LegacyPilotRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LegacyPilotRow>(SQL_LIST_PILOTS)
        .fetch_all(executor)
        .await
}

const SQL_LIST_PILOT_IDS: &str = "SELECT pilot_id FROM pilot WHERE pilot_id IS NOT NULL";

pub async fn list_pilot_ids<'e, E>(executor: E) -> sqlx::Result<Vec<String>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(SQL_LIST_PILOT_IDS)
        .fetch_all(executor)
        .await
}

const SQL_LIST_ACHIEVEMENTS: &str = r#"
SELECT
    pilot_id,
    description,
    points,
    CAST(date_awarded AS TEXT) AS date_awarded
FROM achievement
ORDER BY id ASC
"#;

pub async fn list_achievements<'e, E>(executor: E) -> sqlx::Result<Vec<LegacyAchievementRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LegacyAchievementRow>(SQL_LIST_ACHIEVEMENTS)
        .fetch_all(executor)
        .await
}

const SQL_LIST_ACTIVITY_LOGS: &str = r#"
SELECT
    action_type,
    pilot_id,
    pilot_name,
    description,
    points_awarded,
    CAST(timestamp AS TEXT) AS timestamp
FROM admin_activity_log
ORDER BY id ASC
"#;

pub async fn list_activity_logs<'e, E>(executor: E) -> sqlx::Result<Vec<LegacyActivityLogRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LegacyActivityLogRow>(SQL_LIST_ACTIVITY_LOGS)
        .fetch_all(executor)
        .await
}
