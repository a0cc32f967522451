use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::achievements_repo::{self, NewAchievement};
use crate::database::begin_write;
use crate::database::activity_log_repo::{self, NewActivityLog};
use crate::database::participants_repo::{self, NewParticipant, ParticipantDetails};
use crate::error::{AppError, ConflictField, InvalidInput, Result};
use crate::models::participant::{role_label, DEFAULT_PHOTO};
use crate::models::{ActionType, Category, ParticipantRow, Subcategory};
use crate::services::{id_allocator, now};

const MAX_CALLSIGN_LEN: usize = 100;
const MAX_PHOTO_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 200;
const MAX_LOG_DESCRIPTION_LEN: usize = 300;
const MAX_POINTS: i64 = 1_000_000;
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ParticipantForm {
    pub callsign: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AchievementForm {
    pub description: String,
    pub points: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidParticipant {
    pub callsign: String,
    pub category: Category,
    pub subcategory: Option<Subcategory>,
    /// `None` when the form left the field blank.
    pub photo_url: Option<String>,
}

pub fn validate_participant(form: &ParticipantForm) -> Result<ValidParticipant, InvalidInput> {
    let callsign = form.callsign.trim();
    if callsign.is_empty() || callsign.chars().count() > MAX_CALLSIGN_LEN {
        return Err(InvalidInput::Callsign);
    }

    let category = Category::parse(&form.category).ok_or(InvalidInput::Category)?;

    let subcategory_raw = form.subcategory.as_deref().map(str::trim).unwrap_or("");
    let subcategory = match category {
        Category::Pilot => {
            Some(Subcategory::parse(subcategory_raw).ok_or(InvalidInput::Subcategory)?)
        }
        // Subcategories only classify pilots.
        _ => None,
    };

    let photo_url = form
        .photo_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if photo_url
        .as_deref()
        .is_some_and(|p| p.chars().count() > MAX_PHOTO_LEN)
    {
        return Err(InvalidInput::PhotoUrl);
    }

    Ok(ValidParticipant {
        callsign: callsign.to_string(),
        category,
        subcategory,
        photo_url,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAchievement {
    pub description: String,
    pub points: i64,
}

pub fn validate_achievement(form: &AchievementForm) -> Result<ValidAchievement, InvalidInput> {
    let description = form.description.trim();
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(InvalidInput::Description);
    }
    let points: i64 = form.points.trim().parse().map_err(|_| InvalidInput::Points)?;
    if points.abs() > MAX_POINTS {
        return Err(InvalidInput::Points);
    }
    Ok(ValidAchievement {
        description: description.to_string(),
        points,
    })
}

fn clip(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut clipped: String = text.chars().take(max - 1).collect();
    clipped.push('…');
    clipped
}

pub async fn add_participant(pool: &SqlitePool, form: &ParticipantForm) -> Result<ParticipantRow> {
    let input = validate_participant(form)?;
    let category = input.category.as_str();
    let subcategory = input.subcategory.map(Subcategory::as_str);
    let photo_url = input.photo_url.as_deref().unwrap_or(DEFAULT_PHOTO);

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let mut tx = begin_write(pool).await?;
        let participant_id = id_allocator::next_participant_id(&mut tx).await?;
        let qr_code = Uuid::new_v4().to_string();
        let joined_at = now();

        let inserted = participants_repo::insert_participant(
            &mut *tx,
            NewParticipant {
                participant_id: &participant_id,
                callsign: &input.callsign,
                photo_url,
                category,
                subcategory,
                join_date: joined_at,
                points: 0,
                qr_code: &qr_code,
                is_active: true,
            },
        )
        .await;

        let id = match inserted.map_err(AppError::from_db) {
            Ok(id) => id,
            Err(AppError::Conflict(ConflictField::ParticipantId)) if attempt < MAX_ID_ATTEMPTS => {
                warn!(
                    "Participant id {} was taken concurrently, retrying (attempt {})",
                    participant_id, attempt
                );
                continue;
            }
            Err(e) => return Err(e),
        };

        let description = clip(
            format!(
                "Added {} ({}) as {}",
                input.callsign,
                participant_id,
                role_label(category, subcategory)
            ),
            MAX_LOG_DESCRIPTION_LEN,
        );
        activity_log_repo::insert_activity_log(
            &mut *tx,
            NewActivityLog {
                action_type: ActionType::AddParticipant,
                participant_id: Some(id),
                participant_name: Some(&input.callsign),
                description: &description,
                points_awarded: None,
                timestamp: joined_at,
            },
        )
        .await?;

        let row = participants_repo::find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound)?;
        tx.commit().await?;

        info!("👤 Added participant {} ({})", row.callsign, row.participant_id);
        return Ok(row);
    }

    Err(AppError::Conflict(ConflictField::ParticipantId))
}

pub async fn edit_participant(
    pool: &SqlitePool,
    id: i64,
    form: &ParticipantForm,
) -> Result<ParticipantRow> {
    let mut tx = begin_write(pool).await?;
    let existing = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let input = validate_participant(form)?;

    let category = input.category.as_str();
    let subcategory = input.subcategory.map(Subcategory::as_str);
    let photo_url = input.photo_url.as_deref().unwrap_or(&existing.photo_url);

    participants_repo::update_details(
        &mut *tx,
        id,
        ParticipantDetails {
            callsign: &input.callsign,
            category,
            subcategory,
            photo_url,
        },
    )
    .await
    .map_err(AppError::from_db)?;

    let mut changes = Vec::new();
    if existing.callsign != input.callsign {
        changes.push(format!("callsign: {} → {}", existing.callsign, input.callsign));
    }
    if existing.category != category || existing.subcategory.as_deref() != subcategory {
        changes.push(format!(
            "category: {} → {}",
            role_label(&existing.category, existing.subcategory.as_deref()),
            role_label(category, subcategory)
        ));
    }

    if !changes.is_empty() {
        let description = clip(
            format!("Edited {}: {}", input.callsign, changes.join(", ")),
            MAX_LOG_DESCRIPTION_LEN,
        );
        activity_log_repo::insert_activity_log(
            &mut *tx,
            NewActivityLog {
                action_type: ActionType::EditParticipant,
                participant_id: Some(id),
                participant_name: Some(&input.callsign),
                description: &description,
                points_awarded: None,
                timestamp: now(),
            },
        )
        .await?;
    }

    let row = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;
    Ok(row)
}

/// Removes the participant and their achievements. The audit row keeps the name.
pub async fn delete_participant(pool: &SqlitePool, id: i64) -> Result<ParticipantRow> {
    let mut tx = begin_write(pool).await?;
    let existing = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let description = format!("Deleted {} ({})", existing.callsign, existing.participant_id);
    activity_log_repo::insert_activity_log(
        &mut *tx,
        NewActivityLog {
            action_type: ActionType::DeleteParticipant,
            participant_id: Some(id),
            participant_name: Some(&existing.callsign),
            description: &description,
            points_awarded: None,
            timestamp: now(),
        },
    )
    .await?;

    achievements_repo::delete_for_participant(&mut *tx, id).await?;
    participants_repo::delete_participant(&mut *tx, id).await?;
    tx.commit().await?;

    info!(
        "🗑️  Deleted participant {} ({})",
        existing.callsign, existing.participant_id
    );
    Ok(existing)
}

#[derive(Debug, Clone)]
pub struct AwardOutcome {
    pub participant: ParticipantRow,
    pub points: i64,
    /// False when the member is not a pilot and the total stayed unchanged.
    pub counted: bool,
}

pub async fn award_achievement(
    pool: &SqlitePool,
    id: i64,
    form: &AchievementForm,
) -> Result<AwardOutcome> {
    let mut tx = begin_write(pool).await?;
    let existing = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let input = validate_achievement(form)?;
    let awarded_at = now();

    achievements_repo::insert_achievement(
        &mut *tx,
        NewAchievement {
            participant_id: id,
            description: &input.description,
            points: input.points,
            date_awarded: awarded_at,
        },
    )
    .await?;

    let counted = existing.is_pilot();
    if counted {
        participants_repo::add_points(&mut *tx, id, input.points).await?;
    }

    let mut description = format!(
        "Awarded \"{}\" to {}",
        input.description, existing.callsign
    );
    if !counted {
        description.push_str(" (not added to total: not a pilot)");
    }
    let description = clip(description, MAX_LOG_DESCRIPTION_LEN);
    activity_log_repo::insert_activity_log(
        &mut *tx,
        NewActivityLog {
            action_type: ActionType::AddAchievement,
            participant_id: Some(id),
            participant_name: Some(&existing.callsign),
            description: &description,
            points_awarded: Some(input.points),
            timestamp: awarded_at,
        },
    )
    .await?;

    let participant = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    Ok(AwardOutcome {
        participant,
        points: input.points,
        counted,
    })
}

pub async fn toggle_active(pool: &SqlitePool, id: i64) -> Result<ParticipantRow> {
    let mut tx = begin_write(pool).await?;
    let existing = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_active = !existing.is_active;
    participants_repo::set_active(&mut *tx, id, is_active).await?;

    let verb = if is_active { "Activated" } else { "Deactivated" };
    let description = format!("{} {} ({})", verb, existing.callsign, existing.participant_id);
    activity_log_repo::insert_activity_log(
        &mut *tx,
        NewActivityLog {
            action_type: ActionType::ToggleActive,
            participant_id: Some(id),
            participant_name: Some(&existing.callsign),
            description: &description,
            points_awarded: None,
            timestamp: now(),
        },
    )
    .await?;

    let row = participants_repo::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::activity_log_repo;
    use crate::services::test_support::fresh_pool;

    fn pilot(callsign: &str, subcategory: &str) -> ParticipantForm {
        ParticipantForm {
            callsign: callsign.to_string(),
            category: "pilot".to_string(),
            subcategory: Some(subcategory.to_string()),
            photo_url: None,
        }
    }

    fn achievement(description: &str, points: &str) -> AchievementForm {
        AchievementForm {
            description: description.to_string(),
            points: points.to_string(),
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn validation_rejects_bad_participant_forms() {
        assert_eq!(
            validate_participant(&pilot("   ", "strike")),
            Err(InvalidInput::Callsign)
        );
        assert_eq!(
            validate_participant(&pilot("Орел", "")),
            Err(InvalidInput::Subcategory)
        );
        let mut form = pilot("Орел", "strike");
        form.category = "general".to_string();
        assert_eq!(validate_participant(&form), Err(InvalidInput::Category));
        let mut form = pilot("Орел", "strike");
        form.photo_url = Some("x".repeat(201));
        assert_eq!(validate_participant(&form), Err(InvalidInput::PhotoUrl));
    }

    #[test]
    fn validation_drops_subcategory_for_non_pilots() {
        let form = ParticipantForm {
            callsign: " Майстер ".to_string(),
            category: "technician".to_string(),
            subcategory: Some("strike".to_string()),
            photo_url: Some("  ".to_string()),
        };
        let valid = validate_participant(&form).unwrap();
        assert_eq!(valid.callsign, "Майстер");
        assert_eq!(valid.category, Category::Technician);
        assert_eq!(valid.subcategory, None);
        assert_eq!(valid.photo_url, None);
    }

    #[test]
    fn validation_requires_integer_points() {
        assert_eq!(
            validate_achievement(&achievement("Night flight", "12.5")),
            Err(InvalidInput::Points)
        );
        assert_eq!(
            validate_achievement(&achievement("Night flight", "abc")),
            Err(InvalidInput::Points)
        );
        assert_eq!(
            validate_achievement(&achievement("", "10")),
            Err(InvalidInput::Description)
        );
        assert_eq!(
            validate_achievement(&achievement("Night flight", " 150 ")).unwrap().points,
            150
        );
    }

    #[tokio::test]
    async fn add_assigns_sequential_ids_and_logs() {
        let pool = fresh_pool().await;
        let first = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        let second = add_participant(&pool, &pilot("Сокол", "reconnaissance"))
            .await
            .unwrap();

        assert_eq!(first.participant_id, "UAV-0001");
        assert_eq!(second.participant_id, "UAV-0002");
        assert_eq!(first.photo_url, DEFAULT_PHOTO);
        assert_ne!(first.qr_code, second.qr_code);
        assert!(first.is_active);

        let logs = activity_log_repo::list_recent(&pool, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.action_type == "add_participant"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_on_a_file_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("roster.db").display());
        let pool = crate::database::connect(&url).await.unwrap();
        crate::database::schema::initialize(&pool).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    add_participant(&pool, &pilot(&format!("Pilot{}", i), "strike")).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let row = handle.await.unwrap().unwrap();
            ids.push(row.participant_id);
        }
        ids.sort();
        let expected: Vec<String> = (1..=16).map(|n| format!("UAV-{:04}", n)).collect();
        assert_eq!(ids, expected);
        assert_eq!(count(&pool, "activity_logs").await, 16);
    }

    #[tokio::test]
    async fn duplicate_callsign_rolls_back() {
        let pool = fresh_pool().await;
        add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();

        let err = add_participant(&pool, &pilot("Орел", "reconnaissance"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ConflictField::Callsign)));
        assert_eq!(count(&pool, "participants").await, 1);
        assert_eq!(count(&pool, "activity_logs").await, 1);
    }

    #[tokio::test]
    async fn achievements_count_towards_pilot_totals_only() {
        let pool = fresh_pool().await;
        let orel = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        let instructor = add_participant(
            &pool,
            &ParticipantForm {
                callsign: "Вчитель".to_string(),
                category: "instructor".to_string(),
                subcategory: None,
                photo_url: None,
            },
        )
        .await
        .unwrap();

        let outcome = award_achievement(&pool, orel.id, &achievement("Night flight", "150"))
            .await
            .unwrap();
        assert!(outcome.counted);
        assert_eq!(outcome.participant.points, 150);

        let outcome = award_achievement(&pool, orel.id, &achievement("Penalty", "-20"))
            .await
            .unwrap();
        assert_eq!(outcome.participant.points, 130);

        let outcome = award_achievement(&pool, instructor.id, &achievement("Course", "50"))
            .await
            .unwrap();
        assert!(!outcome.counted);
        assert_eq!(outcome.participant.points, 0);
        assert_eq!(count(&pool, "achievements").await, 3);

        let latest = activity_log_repo::list_recent(&pool, 1).await.unwrap();
        assert_eq!(latest[0].points_awarded, Some(50));
    }

    #[tokio::test]
    async fn invalid_points_persist_nothing() {
        let pool = fresh_pool().await;
        let orel = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        let err = award_achievement(&pool, orel.id, &achievement("Night flight", "lots"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(InvalidInput::Points)));
        assert_eq!(count(&pool, "achievements").await, 0);
    }

    #[tokio::test]
    async fn missing_participant_is_not_found() {
        let pool = fresh_pool().await;
        assert!(matches!(
            delete_participant(&pool, 42).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            award_achievement(&pool, 42, &achievement("x", "1")).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            edit_participant(&pool, 42, &pilot("Орел", "strike")).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn edit_logs_only_meaningful_changes() {
        let pool = fresh_pool().await;
        let orel = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();

        let mut same = pilot("Орел", "strike");
        same.photo_url = Some("orel.jpg".to_string());
        let updated = edit_participant(&pool, orel.id, &same).await.unwrap();
        assert_eq!(updated.photo_url, "orel.jpg");
        assert_eq!(count(&pool, "activity_logs").await, 1);

        let renamed = edit_participant(&pool, orel.id, &pilot("Орел-2", "reconnaissance"))
            .await
            .unwrap();
        assert_eq!(renamed.callsign, "Орел-2");
        assert_eq!(renamed.photo_url, "orel.jpg");
        assert_eq!(renamed.subcategory.as_deref(), Some("reconnaissance"));

        let latest = activity_log_repo::list_recent(&pool, 1).await.unwrap();
        assert_eq!(latest[0].action_type, "edit_participant");
        assert!(latest[0].description.contains("Орел → Орел-2"));
        assert!(latest[0].description.contains("Pilot · Strike → Pilot · Reconnaissance"));
    }

    #[tokio::test]
    async fn edit_to_taken_callsign_conflicts() {
        let pool = fresh_pool().await;
        add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        let sokol = add_participant(&pool, &pilot("Сокол", "strike")).await.unwrap();
        let err = edit_participant(&pool, sokol.id, &pilot("Орел", "strike"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ConflictField::Callsign)));
    }

    #[tokio::test]
    async fn delete_cascades_achievements_and_keeps_log_name() {
        let pool = fresh_pool().await;
        let orel = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        award_achievement(&pool, orel.id, &achievement("Night flight", "150"))
            .await
            .unwrap();

        let deleted = delete_participant(&pool, orel.id).await.unwrap();
        assert_eq!(deleted.participant_id, "UAV-0001");
        assert_eq!(count(&pool, "participants").await, 0);
        assert_eq!(count(&pool, "achievements").await, 0);

        let logs = activity_log_repo::list_recent(&pool, 10).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].action_type, "delete_participant");
        assert!(logs.iter().all(|l| l.participant_id.is_none()));
        assert!(logs
            .iter()
            .all(|l| l.participant_name.as_deref() == Some("Орел")));
    }

    #[tokio::test]
    async fn toggle_flips_active_flag() {
        let pool = fresh_pool().await;
        let orel = add_participant(&pool, &pilot("Орел", "strike")).await.unwrap();
        assert!(!toggle_active(&pool, orel.id).await.unwrap().is_active);
        assert!(toggle_active(&pool, orel.id).await.unwrap().is_active);
    }
}
