use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::begin_write;
use crate::database::participants_repo::{self, NewParticipant};
use crate::models::participant::DEFAULT_PHOTO;
use crate::models::{Category, ParticipantRow, Subcategory};
use crate::services::legacy_migration_service::legacy_pending;
use crate::services::{id_allocator, now};

const DEMO_PILOTS: &[(&str, Subcategory, i64)] = &[
    ("Орел", Subcategory::Strike, 1250),
    ("Сокол", Subcategory::Reconnaissance, 980),
    ("Беркут", Subcategory::Strike, 1400),
    ("Ястреб", Subcategory::Reconnaissance, 1120),
    ("Кондор", Subcategory::Strike, 750),
];

/// Inserts the demo pilots into an empty store. Returns the inserted rows.
pub async fn seed_demo_pilots(pool: &SqlitePool) -> sqlx::Result<Vec<ParticipantRow>> {
    let counts = participants_repo::count_participants(pool).await?;
    if counts.total > 0 || legacy_pending(pool).await? {
        return Ok(Vec::new());
    }

    let mut tx = begin_write(pool).await?;
    let mut ids = Vec::with_capacity(DEMO_PILOTS.len());
    for (callsign, subcategory, points) in DEMO_PILOTS {
        let participant_id = id_allocator::next_participant_id(&mut tx).await?;
        let qr_code = Uuid::new_v4().to_string();
        let id = participants_repo::insert_participant(
            &mut *tx,
            NewParticipant {
                participant_id: &participant_id,
                callsign,
                photo_url: DEFAULT_PHOTO,
                category: Category::Pilot.as_str(),
                subcategory: Some(subcategory.as_str()),
                join_date: now(),
                points: *points,
                qr_code: &qr_code,
                is_active: true,
            },
        )
        .await?;
        ids.push(id);
    }

    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(row) = participants_repo::find_by_id(&mut *tx, id).await? {
            rows.push(row);
        }
    }
    tx.commit().await?;

    info!("🌱 Seeded {} demo pilots", rows.len());
    Ok(rows)
}
