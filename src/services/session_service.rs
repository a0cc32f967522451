use chrono::Duration;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::Config;
use crate::database::sessions_repo;
use crate::services::now;

/// Constant-time comparison. Both sides are padded to the same length so the
/// comparison does not leak the expected length.
fn secure_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let max_len = provided.len().max(expected.len());

    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let same_len = (provided.len() as u64).ct_eq(&(expected.len() as u64));
    let same_bytes = padded_provided.ct_eq(&padded_expected);
    (same_len & same_bytes).into()
}

pub fn verify_credentials(config: &Config, username: &str, password: &str) -> bool {
    let user_ok = secure_eq(username, &config.admin_username);
    let pass_ok = secure_eq(password, &config.admin_password);
    user_ok & pass_ok
}

/// Stores a fresh session token valid for `ttl_secs` and prunes expired ones.
pub async fn create_session(pool: &SqlitePool, ttl_secs: i64) -> sqlx::Result<String> {
    let created_at = now();
    let expires_at = created_at + Duration::seconds(ttl_secs);
    let token = Uuid::new_v4().simple().to_string();

    sessions_repo::delete_expired(pool, created_at).await?;
    sessions_repo::insert_session(pool, &token, created_at, expires_at).await?;
    Ok(token)
}

pub async fn validate_session(pool: &SqlitePool, token: &str) -> sqlx::Result<bool> {
    if token.is_empty() {
        return Ok(false);
    }
    sessions_repo::session_valid(pool, token, now()).await
}

pub async fn revoke_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sessions_repo::delete_session(pool, token).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::fresh_pool;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "ADMIN_USERNAME" => Some("chief".to_string()),
            "ADMIN_PASSWORD" => Some("s3cret-pass".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn credentials_must_match_exactly() {
        let config = config();
        assert!(verify_credentials(&config, "chief", "s3cret-pass"));
        assert!(!verify_credentials(&config, "chief", "s3cret-pas"));
        assert!(!verify_credentials(&config, "chief", "s3cret-pass\0"));
        assert!(!verify_credentials(&config, "Chief", "s3cret-pass"));
        assert!(!verify_credentials(&config, "", ""));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = fresh_pool().await;
        let token = create_session(&pool, 3600).await.unwrap();
        assert!(validate_session(&pool, &token).await.unwrap());
        assert!(!validate_session(&pool, "forged").await.unwrap());
        assert!(!validate_session(&pool, "").await.unwrap());

        revoke_session(&pool, &token).await.unwrap();
        assert!(!validate_session(&pool, &token).await.unwrap());
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_pruned() {
        let pool = fresh_pool().await;
        let past = now() - Duration::hours(2);
        sessions_repo::insert_session(&pool, "old", past, past + Duration::hours(1))
            .await
            .unwrap();
        assert!(!validate_session(&pool, "old").await.unwrap());

        create_session(&pool, 3600).await.unwrap();
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
