use chrono::NaiveDateTime;
use sqlx::Sqlite;

const SQL_INSERT_SESSION: &str = r#"
INSERT INTO admin_sessions (token, created_at, expires_at) VALUES (?1, ?2, ?3)
"#;

pub async fn insert_session<'e, E>(
    executor: E,
    token: &str,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
) -> sqlx::Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(created_at)
        .bind(expires_at)
        .execute(executor)
        .await?;
    Ok(())
}

const SQL_SESSION_VALID: &str = r#"
SELECT EXISTS (SELECT 1 FROM admin_sessions WHERE token = ?1 AND expires_at > ?2)
"#;

pub async fn session_valid<'e, E>(executor: E, token: &str, now: NaiveDateTime) -> sqlx::Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, bool>(SQL_SESSION_VALID)
        .bind(token)
        .bind(now)
        .fetch_one(executor)
        .await
}

const SQL_DELETE_SESSION: &str = "DELETE FROM admin_sessions WHERE token = ?1";

pub async fn delete_session<'e, E>(executor: E, token: &str) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_EXPIRED: &str = "DELETE FROM admin_sessions WHERE expires_at <= ?1";

pub async fn delete_expired<'e, E>(executor: E, now: NaiveDateTime) -> sqlx::Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_EXPIRED)
        .bind(now)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
