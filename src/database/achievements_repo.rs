use chrono::NaiveDateTime;
use sqlx::Sqlite;

use crate::models::AchievementRow;

pub struct NewAchievement<'a> {
    pub participant_id: i64,
    pub description: &'a str,
    pub points: i64,
    pub date_awarded: NaiveDateTime,
}

const SQL_INSERT_ACHIEVEMENT: &str = r#"
INSERT INTO achievements (
    participant_id,
    description,
    points,
    date_awarded
) VALUES (?1, ?2, ?3, ?4)
"#;

pub async fn insert_achievement<'e, E>(executor: E, a: NewAchievement<'_>) -> sqlx::Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_INSERT_ACHIEVEMENT)
        .bind(a.participant_id)
        .bind(a.description)
        .bind(a.points)
        .bind(a.date_awarded)
        .execute(executor)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_LIST_FOR_PARTICIPANT: &str = r#"
SELECT id, participant_id, description, points, date_awarded
FROM achievements
WHERE participant_id = ?1
ORDER BY date_awarded DESC, id DESC
"#;

pub async fn list_for_participant<'e, E>(
    executor: E,
    participant_id: i64,
) -> sqlx::Result<Vec<AchievementRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AchievementRow>(SQL_LIST_FOR_PARTICIPANT)
        .bind(participant_id)
        .fetch_all(executor)
        .await
}

const SQL_LIST_ALL: &str = r#"
SELECT id, participant_id, description, points, date_awarded
FROM achievements
ORDER BY participant_id ASC, date_awarded DESC, id DESC
"#;

pub async fn list_all<'e, E>(executor: E) -> sqlx::Result<Vec<AchievementRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AchievementRow>(SQL_LIST_ALL)
        .fetch_all(executor)
        .await
}

const SQL_DELETE_FOR_PARTICIPANT: &str = "DELETE FROM achievements WHERE participant_id = ?1";

pub async fn delete_for_participant<'e, E>(executor: E, participant_id: i64) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_FOR_PARTICIPANT)
        .bind(participant_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
