pub mod admin_service;
pub mod dashboard_service;
pub mod id_allocator;
pub mod leaderboard_service;
pub mod legacy_migration_service;
pub mod qr_service;
pub mod seed_service;
pub mod session_service;

use chrono::{NaiveDateTime, Utc};

/// Current time as stored in the database (UTC, no offset).
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// `default-pilot.svg` lives under `/static/images`; absolute paths and URLs pass through.
pub fn photo_src(photo_url: &str) -> String {
    let photo = photo_url.trim();
    if photo.is_empty() {
        return format!("/static/images/{}", crate::models::participant::DEFAULT_PHOTO);
    }
    if photo.starts_with('/') || photo.starts_with("http://") || photo.starts_with("https://") {
        return photo.to_string();
    }
    format!("/static/images/{}", photo)
}

pub fn date_label(at: NaiveDateTime) -> String {
    at.format("%d.%m.%Y").to_string()
}

pub fn datetime_label(at: NaiveDateTime) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;

    use crate::database::{connect_in_memory, schema};

    pub async fn fresh_pool() -> SqlitePool {
        let pool = connect_in_memory().await.unwrap();
        schema::initialize(&pool).await.unwrap();
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_src_resolves_bare_file_names() {
        assert_eq!(photo_src("default-pilot.svg"), "/static/images/default-pilot.svg");
        assert_eq!(photo_src(""), "/static/images/default-pilot.svg");
        assert_eq!(photo_src("/uploads/orel.jpg"), "/uploads/orel.jpg");
        assert_eq!(photo_src("https://cdn.example.org/a.png"), "https://cdn.example.org/a.png");
    }
}
