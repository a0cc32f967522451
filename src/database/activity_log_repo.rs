use chrono::NaiveDateTime;
use sqlx::Sqlite;

use crate::models::{ActionType, ActivityLogRow};

pub struct NewActivityLog<'a> {
    pub action_type: ActionType,
    pub participant_id: Option<i64>,
    pub participant_name: Option<&'a str>,
    pub description: &'a str,
    pub points_awarded: Option<i64>,
    pub timestamp: NaiveDateTime,
}

const SQL_INSERT_ACTIVITY_LOG: &str = r#"
INSERT INTO activity_logs (
    action_type,
    participant_id,
    participant_name,
    description,
    points_awarded,
    timestamp
) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub async fn insert_activity_log<'e, E>(executor: E, log: NewActivityLog<'_>) -> sqlx::Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_INSERT_ACTIVITY_LOG)
        .bind(log.action_type.as_str())
        .bind(log.participant_id)
        .bind(log.participant_name)
        .bind(log.description)
        .bind(log.points_awarded)
        .bind(log.timestamp)
        .execute(executor)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_LIST_RECENT: &str = r#"
SELECT id, action_type, participant_id, participant_name, description, points_awarded, timestamp
FROM activity_logs
ORDER BY timestamp DESC, id DESC
LIMIT ?1
"#;

pub async fn list_recent<'e, E>(executor: E, limit: i64) -> sqlx::Result<Vec<ActivityLogRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ActivityLogRow>(SQL_LIST_RECENT)
        .bind(limit)
        .fetch_all(executor)
        .await
}
