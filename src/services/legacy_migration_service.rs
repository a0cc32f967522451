//! One-time import of the pilot-era tables into `participants`/`achievements`/`activity_logs`.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::achievements_repo::{self, NewAchievement};
use crate::database::activity_log_repo::{self, NewActivityLog};
use crate::database::legacy_repo::{
    self, LEGACY_ACHIEVEMENT_TABLE, LEGACY_ACTIVITY_LOG_TABLE, LEGACY_PILOT_TABLE,
};
use crate::database::participants_repo::{self, NewParticipant};
use crate::database::{begin_write, schema};
use crate::models::participant::DEFAULT_PHOTO;
use crate::models::{ActionType, Category, Subcategory};
use crate::services::{id_allocator, now};

pub const LEGACY_MIGRATED_KEY: &str = "legacy_migrated";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LegacyMigrationReport {
    pub legacy_present: bool,
    pub already_migrated: bool,
    pub candidates: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub achievements: usize,
    pub orphaned_achievements: usize,
    pub activity_logs: usize,
}

impl LegacyMigrationReport {
    pub fn ran(&self) -> bool {
        self.legacy_present && !self.already_migrated
    }
}

/// True when the pilot-era table exists and has not been imported yet.
pub async fn legacy_pending(pool: &SqlitePool) -> sqlx::Result<bool> {
    if !legacy_repo::table_exists(pool, LEGACY_PILOT_TABLE).await? {
        return Ok(false);
    }
    Ok(schema::get_meta(pool, LEGACY_MIGRATED_KEY).await?.is_none())
}

/// Parses the timestamp formats written by the pilot-era app; falls back to `fallback`.
pub fn parse_legacy_timestamp(raw: Option<&str>, fallback: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed;
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(fallback)
}

/// Runs the import in one transaction; nothing is written if any step fails.
pub async fn migrate_legacy(pool: &SqlitePool) -> sqlx::Result<LegacyMigrationReport> {
    let mut tx = begin_write(pool).await?;
    let report = migrate_in(&mut tx).await?;
    tx.commit().await?;

    if report.ran() {
        info!(
            "📦 Legacy migration done: candidates={}, migrated={}, skipped={}, achievements={}, orphaned={}, logs={}",
            report.candidates,
            report.migrated,
            report.skipped,
            report.achievements,
            report.orphaned_achievements,
            report.activity_logs
        );
    }
    Ok(report)
}

async fn migrate_in(conn: &mut SqliteConnection) -> sqlx::Result<LegacyMigrationReport> {
    let mut report = LegacyMigrationReport::default();
    if !legacy_repo::table_exists(&mut *conn, LEGACY_PILOT_TABLE).await? {
        return Ok(report);
    }
    report.legacy_present = true;

    if schema::get_meta(&mut *conn, LEGACY_MIGRATED_KEY).await?.is_some() {
        report.already_migrated = true;
        return Ok(report);
    }

    let started = now();
    let pilots = legacy_repo::list_pilots(&mut *conn).await?;
    report.candidates = pilots.len();

    let mut id_map: HashMap<i64, i64> = HashMap::new();
    for pilot in pilots {
        let participant_id = match pilot
            .pilot_id
            .as_deref()
            .map(str::trim)
            .filter(|id| id_allocator::parse_suffix(id).is_some())
        {
            Some(id) => id.to_string(),
            None => id_allocator::next_participant_id(&mut *conn).await?,
        };
        let qr_code = pilot
            .qr_code
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let callsign = pilot.callsign.trim();

        if callsign.is_empty()
            || participants_repo::identity_taken(&mut *conn, &participant_id, callsign, &qr_code)
                .await?
        {
            warn!(
                "Legacy pilot {} ({}) skipped: identity already present",
                pilot.id, participant_id
            );
            report.skipped += 1;
            continue;
        }

        let subcategory = pilot
            .category
            .as_deref()
            .and_then(Subcategory::parse)
            .map(Subcategory::as_str);
        let photo_url = pilot
            .photo_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PHOTO);

        let new_id = participants_repo::insert_participant(
            &mut *conn,
            NewParticipant {
                participant_id: &participant_id,
                callsign,
                photo_url,
                category: Category::Pilot.as_str(),
                subcategory,
                join_date: parse_legacy_timestamp(pilot.join_date.as_deref(), started),
                points: pilot.points.unwrap_or(0),
                qr_code: &qr_code,
                is_active: true,
            },
        )
        .await?;
        id_map.insert(pilot.id, new_id);
        report.migrated += 1;
    }

    if legacy_repo::table_exists(&mut *conn, LEGACY_ACHIEVEMENT_TABLE).await? {
        for achievement in legacy_repo::list_achievements(&mut *conn).await? {
            let Some(&participant_id) = id_map.get(&achievement.pilot_id) else {
                report.orphaned_achievements += 1;
                continue;
            };
            achievements_repo::insert_achievement(
                &mut *conn,
                NewAchievement {
                    participant_id,
                    description: &achievement.description,
                    points: achievement.points,
                    date_awarded: parse_legacy_timestamp(
                        achievement.date_awarded.as_deref(),
                        started,
                    ),
                },
            )
            .await?;
            report.achievements += 1;
        }
    }

    if legacy_repo::table_exists(&mut *conn, LEGACY_ACTIVITY_LOG_TABLE).await? {
        for log in legacy_repo::list_activity_logs(&mut *conn).await? {
            let Some(action_type) = ActionType::parse(&log.action_type) else {
                warn!("Legacy log action '{}' not recognized, skipped", log.action_type);
                continue;
            };
            activity_log_repo::insert_activity_log(
                &mut *conn,
                NewActivityLog {
                    action_type,
                    participant_id: log.pilot_id.and_then(|old| id_map.get(&old).copied()),
                    participant_name: log.pilot_name.as_deref(),
                    description: &log.description,
                    points_awarded: log.points_awarded,
                    timestamp: parse_legacy_timestamp(log.timestamp.as_deref(), started),
                },
            )
            .await?;
            report.activity_logs += 1;
        }
    }

    let summary = format!(
        "Imported {} of {} legacy pilots ({} skipped), {} achievements, {} log entries",
        report.migrated, report.candidates, report.skipped, report.achievements, report.activity_logs
    );
    activity_log_repo::insert_activity_log(
        &mut *conn,
        NewActivityLog {
            action_type: ActionType::LegacyMigration,
            participant_id: None,
            participant_name: None,
            description: &summary,
            points_awarded: None,
            timestamp: now(),
        },
    )
    .await?;

    schema::set_meta(&mut *conn, LEGACY_MIGRATED_KEY, &started.to_string()).await?;
    Ok(report)
}
