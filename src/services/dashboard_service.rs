use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::database::participants_repo::ParticipantCountsRow;
use crate::database::{achievements_repo, activity_log_repo, participants_repo};
use crate::models::participant::role_label;
use crate::models::{AchievementRow, ActionType, ActivityLogRow, ParticipantRow};
use crate::services::qr_service::QrCache;
use crate::services::{date_label, datetime_label, photo_src};

pub const RECENT_ACTIVITY_LIMIT: i64 = 20;

pub struct AchievementSummary {
    pub description: String,
    pub points: i64,
}

pub struct ParticipantAdminView {
    pub id: i64,
    pub participant_id: String,
    pub callsign: String,
    pub photo_src: String,
    pub role_label: String,
    pub is_pilot: bool,
    pub points: i64,
    pub is_active: bool,
    pub join_date_label: String,
    pub profile_path: String,
    pub qr_src: String,
    pub achievements: Vec<AchievementSummary>,
}

pub struct ActivityLogView {
    pub action_type: String,
    pub action_label: String,
    pub participant_name: String,
    pub description: String,
    pub points_label: String,
    pub timestamp_label: String,
}

pub struct DashboardData {
    pub counts: ParticipantCountsRow,
    pub participants: Vec<ParticipantAdminView>,
    pub activity_logs: Vec<ActivityLogView>,
    pub search: String,
}

/// Case-insensitive match on callsign or formatted ID. Works for Cyrillic, unlike SQLite `lower()`.
pub fn matches_search(row: &ParticipantRow, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.callsign.to_lowercase().contains(&needle)
        || row.participant_id.to_lowercase().contains(&needle)
}

fn participant_view(
    row: ParticipantRow,
    achievements: Vec<AchievementSummary>,
) -> ParticipantAdminView {
    ParticipantAdminView {
        id: row.id,
        photo_src: photo_src(&row.photo_url),
        role_label: role_label(&row.category, row.subcategory.as_deref()),
        is_pilot: row.is_pilot(),
        points: row.points,
        is_active: row.is_active,
        join_date_label: date_label(row.join_date),
        profile_path: format!("/pilot/{}", row.qr_code),
        qr_src: QrCache::public_src(&row.participant_id),
        achievements,
        participant_id: row.participant_id,
        callsign: row.callsign,
    }
}

fn log_view(row: ActivityLogRow) -> ActivityLogView {
    let action_label = ActionType::parse(&row.action_type)
        .map(|a| a.label().to_string())
        .unwrap_or_else(|| row.action_type.clone());
    ActivityLogView {
        action_label,
        action_type: row.action_type,
        participant_name: row.participant_name.unwrap_or_default(),
        description: row.description,
        points_label: row
            .points_awarded
            .map(|p| format!("{:+}", p))
            .unwrap_or_default(),
        timestamp_label: datetime_label(row.timestamp),
    }
}

fn group_achievements(rows: Vec<AchievementRow>) -> HashMap<i64, Vec<AchievementSummary>> {
    let mut grouped: HashMap<i64, Vec<AchievementSummary>> = HashMap::new();
    for a in rows {
        grouped
            .entry(a.participant_id)
            .or_default()
            .push(AchievementSummary {
                description: a.description,
                points: a.points,
            });
    }
    grouped
}

pub async fn load_dashboard(pool: &SqlitePool, search: Option<&str>) -> sqlx::Result<DashboardData> {
    let search = search.map(str::trim).unwrap_or("").to_string();
    let counts = participants_repo::count_participants(pool).await?;
    let mut achievements = group_achievements(achievements_repo::list_all(pool).await?);

    let participants = participants_repo::list_participants(pool)
        .await?
        .into_iter()
        .filter(|row| matches_search(row, &search))
        .map(|row| {
            let list = achievements.remove(&row.id).unwrap_or_default();
            participant_view(row, list)
        })
        .collect();

    let activity_logs = activity_log_repo::list_recent(pool, RECENT_ACTIVITY_LIMIT)
        .await?
        .into_iter()
        .map(log_view)
        .collect();

    Ok(DashboardData {
        counts,
        participants,
        activity_logs,
        search,
    })
}
