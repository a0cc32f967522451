use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AchievementRow {
    pub id: i64,
    pub participant_id: i64,
    pub description: String,
    pub points: i64,
    pub date_awarded: NaiveDateTime,
}
