//! Sequential `UAV-NNNN` identifiers, allocated across the current and the pilot-era table.

use sqlx::SqliteConnection;

use crate::database::{legacy_repo, participants_repo};
use crate::models::participant::PARTICIPANT_ID_PREFIX;

pub fn format_participant_id(number: u64) -> String {
    format!("{}-{:04}", PARTICIPANT_ID_PREFIX, number)
}

/// Numeric part after the last `-`, e.g. `UAV-0042` → 42.
pub fn parse_suffix(participant_id: &str) -> Option<u64> {
    let (_, digits) = participant_id.trim().rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next ID after the highest parseable suffix; values that do not parse are ignored.
pub fn next_after<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing.into_iter().filter_map(parse_suffix).max().unwrap_or(0);
    format_participant_id(max + 1)
}

pub async fn next_participant_id(conn: &mut SqliteConnection) -> sqlx::Result<String> {
    let mut ids = participants_repo::list_participant_ids(&mut *conn).await?;
    if legacy_repo::table_exists(&mut *conn, legacy_repo::LEGACY_PILOT_TABLE).await? {
        ids.extend(legacy_repo::list_pilot_ids(&mut *conn).await?);
    }
    Ok(next_after(ids.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::fresh_pool;

    #[test]
    fn parse_suffix_reads_trailing_number() {
        assert_eq!(parse_suffix("UAV-0042"), Some(42));
        assert_eq!(parse_suffix("UAV-10000"), Some(10000));
        assert_eq!(parse_suffix("UAV-"), None);
        assert_eq!(parse_suffix("UAV-12a"), None);
        assert_eq!(parse_suffix("pilot"), None);
    }

    #[test]
    fn next_after_uses_maximum_not_last() {
        assert_eq!(next_after(["UAV-0003", "UAV-0010", "UAV-0007"]), "UAV-0011");
        assert_eq!(next_after(["garbage", "UAV-0002"]), "UAV-0003");
        assert_eq!(next_after(Vec::<&str>::new()), "UAV-0001");
        assert_eq!(next_after(["UAV-9999"]), "UAV-10000");
    }

    #[tokio::test]
    async fn empty_store_starts_at_one() {
        let pool = fresh_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(next_participant_id(&mut conn).await.unwrap(), "UAV-0001");
    }

    #[tokio::test]
    async fn legacy_table_ids_are_reserved() {
        let pool = fresh_pool().await;
        sqlx::query("CREATE TABLE pilot (id INTEGER PRIMARY KEY, pilot_id TEXT, callsign TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO pilot (pilot_id, callsign) VALUES ('UAV-0008', 'Орел'), (NULL, 'Сокол')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO participants (participant_id, callsign, category, join_date, qr_code) \
             VALUES ('UAV-0005', 'Беркут', 'pilot', '2024-01-01 00:00:00', 'qr-1')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(next_participant_id(&mut conn).await.unwrap(), "UAV-0009");
    }
}
