use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::{achievements_repo, participants_repo};
use crate::models::participant::role_label;
use crate::models::{ParticipantRow, Subcategory};
use crate::services::qr_service::QrCache;
use crate::services::{date_label, now, photo_src};

const INDEX_TOP_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct PilotCardView {
    pub rank: usize,
    pub participant_id: String,
    pub callsign: String,
    pub photo_src: String,
    pub subcategory: String,
    pub subcategory_label: String,
    pub points: i64,
    pub profile_path: String,
}

impl PilotCardView {
    fn from_row(rank: usize, row: &ParticipantRow) -> Self {
        let sub = row.subcategory();
        Self {
            rank,
            participant_id: row.participant_id.clone(),
            callsign: row.callsign.clone(),
            photo_src: photo_src(&row.photo_url),
            subcategory: sub.map(|s| s.as_str().to_string()).unwrap_or_default(),
            subcategory_label: sub.map(|s| s.label().to_string()).unwrap_or_default(),
            points: row.points,
            profile_path: format!("/pilot/{}", row.qr_code),
        }
    }
}

fn ranked<'a, I>(rows: I) -> Vec<PilotCardView>
where
    I: IntoIterator<Item = &'a ParticipantRow>,
{
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| PilotCardView::from_row(i + 1, row))
        .collect()
}

pub struct RatingPageData {
    pub all: Vec<PilotCardView>,
    pub strike: Vec<PilotCardView>,
    pub reconnaissance: Vec<PilotCardView>,
}

pub fn build_rating(pilots: &[ParticipantRow]) -> RatingPageData {
    let in_subcategory = |sub: Subcategory| {
        ranked(pilots.iter().filter(move |p| p.subcategory() == Some(sub)))
    };
    RatingPageData {
        all: ranked(pilots),
        strike: in_subcategory(Subcategory::Strike),
        reconnaissance: in_subcategory(Subcategory::Reconnaissance),
    }
}

pub async fn load_rating_page(pool: &SqlitePool) -> sqlx::Result<RatingPageData> {
    let pilots = participants_repo::list_active_pilots(pool).await?;
    Ok(build_rating(&pilots))
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingEntry {
    pub rank: usize,
    pub participant_id: String,
    pub callsign: String,
    pub subcategory: Option<String>,
    pub points: i64,
    pub profile_url: String,
}

pub async fn load_rating_entries(
    pool: &SqlitePool,
    qr: &QrCache,
) -> sqlx::Result<Vec<RatingEntry>> {
    let pilots = participants_repo::list_active_pilots(pool).await?;
    Ok(pilots
        .iter()
        .enumerate()
        .map(|(i, p)| RatingEntry {
            rank: i + 1,
            participant_id: p.participant_id.clone(),
            callsign: p.callsign.clone(),
            subcategory: p.subcategory().map(|s| s.as_str().to_string()),
            points: p.points,
            profile_url: qr.profile_url(&p.qr_code),
        })
        .collect())
}

pub struct IndexPageData {
    pub active_members: i64,
    pub pilots: i64,
    pub top_pilots: Vec<PilotCardView>,
}

pub async fn load_index_page(pool: &SqlitePool) -> sqlx::Result<IndexPageData> {
    let counts = participants_repo::count_participants(pool).await?;
    let pilots = participants_repo::list_active_pilots(pool).await?;
    Ok(IndexPageData {
        active_members: counts.active,
        pilots: pilots.len() as i64,
        top_pilots: ranked(pilots.iter().take(INDEX_TOP_COUNT)),
    })
}

pub struct AchievementView {
    pub description: String,
    pub points: i64,
    pub date_label: String,
}

pub struct ProfileView {
    pub participant_id: String,
    pub callsign: String,
    pub photo_src: String,
    pub role_label: String,
    pub subcategory_label: String,
    pub is_pilot: bool,
    pub points: i64,
    pub join_date_label: String,
    pub days_in_federation: i64,
    /// 0 when the member is not ranked (non-pilots).
    pub overall_rank: usize,
    pub pilots_total: usize,
    pub subcategory_rank: usize,
    pub subcategory_total: usize,
    pub achievements: Vec<AchievementView>,
    pub qr_data_uri: String,
    pub profile_url: String,
}

pub async fn load_profile(
    pool: &SqlitePool,
    qr: &QrCache,
    qr_code: &str,
) -> sqlx::Result<Option<ProfileView>> {
    let Some(row) = participants_repo::find_by_qr_code(pool, qr_code).await? else {
        return Ok(None);
    };
    if !row.is_active {
        return Ok(None);
    }

    let achievements = achievements_repo::list_for_participant(pool, row.id)
        .await?
        .into_iter()
        .map(|a| AchievementView {
            description: a.description,
            points: a.points,
            date_label: date_label(a.date_awarded),
        })
        .collect();

    let pilots = participants_repo::list_active_pilots(pool).await?;
    let position_in = |list: &[&ParticipantRow]| {
        list.iter()
            .position(|p| p.id == row.id)
            .map(|i| i + 1)
            .unwrap_or(0)
    };
    let all: Vec<&ParticipantRow> = pilots.iter().collect();
    let same_sub: Vec<&ParticipantRow> = match row.subcategory() {
        Some(sub) => pilots.iter().filter(|p| p.subcategory() == Some(sub)).collect(),
        None => Vec::new(),
    };

    let qr_data_uri = match qr.data_uri(&row).await {
        Ok(uri) => uri,
        Err(e) => {
            warn!("QR image unavailable for {}: {}", row.participant_id, e);
            String::new()
        }
    };

    let days_in_federation = (now() - row.join_date).num_days().max(0);

    Ok(Some(ProfileView {
        participant_id: row.participant_id.clone(),
        callsign: row.callsign.clone(),
        photo_src: photo_src(&row.photo_url),
        role_label: role_label(&row.category, row.subcategory.as_deref()),
        subcategory_label: row
            .subcategory()
            .map(|s| s.label().to_string())
            .unwrap_or_default(),
        is_pilot: row.is_pilot(),
        points: row.points,
        join_date_label: date_label(row.join_date),
        days_in_federation,
        overall_rank: position_in(&all),
        pilots_total: all.len(),
        subcategory_rank: position_in(&same_sub),
        subcategory_total: same_sub.len(),
        achievements,
        qr_data_uri,
        profile_url: qr.profile_url(&row.qr_code),
    }))
}
