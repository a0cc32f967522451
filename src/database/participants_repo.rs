use chrono::NaiveDateTime;
use sqlx::{FromRow, Sqlite};

use crate::models::ParticipantRow;

const SELECT_PARTICIPANT: &str = r#"
SELECT
    id,
    participant_id,
    callsign,
    photo_url,
    category,
    subcategory,
    join_date,
    points,
    qr_code,
    is_active
FROM participants
"#;

pub struct NewParticipant<'a> {
    pub participant_id: &'a str,
    pub callsign: &'a str,
    pub photo_url: &'a str,
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub join_date: NaiveDateTime,
    pub points: i64,
    pub qr_code: &'a str,
    pub is_active: bool,
}

const SQL_INSERT_PARTICIPANT: &str = r#"
INSERT INTO participants (
    participant_id,
    callsign,
    photo_url,
    category,
    subcategory,
    join_date,
    points,
    qr_code,
    is_active
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub async fn insert_participant<'e, E>(executor: E, p: NewParticipant<'_>) -> sqlx::Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_INSERT_PARTICIPANT)
        .bind(p.participant_id)
        .bind(p.callsign)
        .bind(p.photo_url)
        .bind(p.category)
        .bind(p.subcategory)
        .bind(p.join_date)
        .bind(p.points)
        .bind(p.qr_code)
        .bind(p.is_active)
        .execute(executor)
        .await?;
    Ok(res.last_insert_rowid())
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<ParticipantRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?1 LIMIT 1", SELECT_PARTICIPANT);
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_qr_code<'e, E>(
    executor: E,
    qr_code: &str,
) -> sqlx::Result<Option<ParticipantRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE qr_code = ?1 LIMIT 1", SELECT_PARTICIPANT);
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(qr_code)
        .fetch_optional(executor)
        .await
}

/// Active pilots, highest total first. Ties keep registration order.
pub async fn list_active_pilots<'e, E>(executor: E) -> sqlx::Result<Vec<ParticipantRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{} WHERE category = 'pilot' AND is_active = 1 ORDER BY points DESC, id ASC",
        SELECT_PARTICIPANT
    );
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .fetch_all(executor)
        .await
}

/// All participants, highest total first.
pub async fn list_participants<'e, E>(executor: E) -> sqlx::Result<Vec<ParticipantRow>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} ORDER BY points DESC, id ASC", SELECT_PARTICIPANT);
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .fetch_all(executor)
        .await
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct ParticipantCountsRow {
    pub total: i64,
    pub active: i64,
    pub pilots: i64,
    pub strike: i64,
    pub reconnaissance: i64,
    pub instructors: i64,
    pub technicians: i64,
}

const SQL_COUNT_PARTICIPANTS: &str = r#"
SELECT
    COUNT(*) AS total,
    COALESCE(SUM(is_active = 1), 0) AS active,
    COALESCE(SUM(category = 'pilot'), 0) AS pilots,
    COALESCE(SUM(category = 'pilot' AND subcategory = 'strike'), 0) AS strike,
    COALESCE(SUM(category = 'pilot' AND subcategory = 'reconnaissance'), 0) AS reconnaissance,
    COALESCE(SUM(category = 'instructor'), 0) AS instructors,
    COALESCE(SUM(category = 'technician'), 0) AS technicians
FROM participants
"#;

pub async fn count_participants<'e, E>(executor: E) -> sqlx::Result<ParticipantCountsRow>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ParticipantCountsRow>(SQL_COUNT_PARTICIPANTS)
        .fetch_one(executor)
        .await
}

const SQL_LIST_PARTICIPANT_IDS: &str = "SELECT participant_id FROM participants";

pub async fn list_participant_ids<'e, E>(executor: E) -> sqlx::Result<Vec<String>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(SQL_LIST_PARTICIPANT_IDS)
        .fetch_all(executor)
        .await
}

const SQL_UPDATE_DETAILS: &str = r#"
UPDATE participants
SET callsign = ?2,
    category = ?3,
    subcategory = ?4,
    photo_url = ?5
WHERE id = ?1
"#;

pub struct ParticipantDetails<'a> {
    pub callsign: &'a str,
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub photo_url: &'a str,
}

pub async fn update_details<'e, E>(
    executor: E,
    id: i64,
    details: ParticipantDetails<'_>,
) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_UPDATE_DETAILS)
        .bind(id)
        .bind(details.callsign)
        .bind(details.category)
        .bind(details.subcategory)
        .bind(details.photo_url)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_ADD_POINTS: &str = "UPDATE participants SET points = points + ?2 WHERE id = ?1";

pub async fn add_points<'e, E>(executor: E, id: i64, delta: i64) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_ADD_POINTS)
        .bind(id)
        .bind(delta)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SET_ACTIVE: &str = "UPDATE participants SET is_active = ?2 WHERE id = ?1";

pub async fn set_active<'e, E>(executor: E, id: i64, is_active: bool) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_SET_ACTIVE)
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_PARTICIPANT: &str = "DELETE FROM participants WHERE id = ?1";

pub async fn delete_participant<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_PARTICIPANT)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_IDENTITY_TAKEN: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM participants
    WHERE participant_id = ?1 OR callsign = ?2 OR qr_code = ?3
)
"#;

/// True when any of the unique identity columns is already in use.
pub async fn identity_taken<'e, E>(
    executor: E,
    participant_id: &str,
    callsign: &str,
    qr_code: &str,
) -> sqlx::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, bool>(SQL_IDENTITY_TAKEN)
        .bind(participant_id)
        .bind(callsign)
        .bind(qr_code)
        .fetch_one(executor)
        .await
}
