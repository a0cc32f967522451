use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::database::participants_repo;
use crate::error::{AppError, Result};
use crate::models::{Category, ParticipantRow, Subcategory};
use crate::services::admin_service::{self, AchievementForm, ParticipantForm};
use crate::services::dashboard_service::{self, DashboardData};
use crate::services::photo_src;
use crate::web::notice::{redirect_with_notice, Notice, NoticeQuery, NoticeView};
use crate::web::{render, AppState};

const DASHBOARD_PATH: &str = "/admin";
const ADD_PATH: &str = "/admin/participant/add";

fn edit_path(id: i64) -> String {
    format!("/admin/participant/{}/edit", id)
}

/// Form errors go back to `path` as a notice; anything else becomes an error page.
fn form_failure(path: &str, err: AppError) -> Response {
    match err {
        AppError::Validation(invalid) => redirect_with_notice(path, Notice::Invalid(invalid), None),
        AppError::Conflict(field) => redirect_with_notice(path, Notice::from_conflict(field), None),
        other => other.into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct DashboardTemplate {
    pub notice: NoticeView,
    pub data: DashboardData,
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Result<Html<String>> {
    let data = dashboard_service::load_dashboard(&state.pool, search.q.as_deref()).await?;
    render(&DashboardTemplate {
        notice: NoticeView::from_query(&notice),
        data,
    })
}

pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "admin_participant_form.html")]
pub struct ParticipantFormTemplate {
    pub notice: NoticeView,
    pub heading: String,
    pub action: String,
    pub submit_label: &'static str,
    /// Empty for a new member.
    pub participant_id: String,
    pub callsign: String,
    pub photo_url: String,
    pub photo_src: String,
    pub categories: Vec<OptionView>,
    pub subcategories: Vec<OptionView>,
}

impl ParticipantFormTemplate {
    fn new_member(notice: NoticeView) -> Self {
        Self {
            notice,
            heading: "Add member".to_string(),
            action: ADD_PATH.to_string(),
            submit_label: "Add",
            participant_id: String::new(),
            callsign: String::new(),
            photo_url: String::new(),
            photo_src: String::new(),
            categories: category_options(Some(Category::Pilot)),
            subcategories: subcategory_options(None),
        }
    }

    fn existing(notice: NoticeView, row: ParticipantRow) -> Self {
        Self {
            notice,
            heading: format!("Edit {}", row.callsign),
            action: edit_path(row.id),
            submit_label: "Save",
            categories: category_options(row.category()),
            subcategories: subcategory_options(row.subcategory()),
            photo_src: photo_src(&row.photo_url),
            photo_url: row.photo_url,
            participant_id: row.participant_id,
            callsign: row.callsign,
        }
    }
}

fn category_options(selected: Option<Category>) -> Vec<OptionView> {
    Category::ALL
        .iter()
        .map(|c| OptionView {
            value: c.as_str(),
            label: c.label(),
            selected: Some(*c) == selected,
        })
        .collect()
}

fn subcategory_options(selected: Option<Subcategory>) -> Vec<OptionView> {
    Subcategory::ALL
        .iter()
        .map(|s| OptionView {
            value: s.as_str(),
            label: s.label(),
            selected: Some(*s) == selected,
        })
        .collect()
}

pub async fn add_participant_page(Query(notice): Query<NoticeQuery>) -> Result<Html<String>> {
    render(&ParticipantFormTemplate::new_member(NoticeView::from_query(
        &notice,
    )))
}

pub async fn add_participant_handler(
    State(state): State<AppState>,
    Form(form): Form<ParticipantForm>,
) -> Response {
    match admin_service::add_participant(&state.pool, &form).await {
        Ok(row) => {
            state.qr.ensure_logged(&row).await;
            redirect_with_notice(
                DASHBOARD_PATH,
                Notice::ParticipantAdded,
                Some(&row.participant_id),
            )
        }
        Err(e) => form_failure(ADD_PATH, e),
    }
}

pub async fn edit_participant_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeQuery>,
) -> Result<Html<String>> {
    let row = participants_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    render(&ParticipantFormTemplate::existing(
        NoticeView::from_query(&notice),
        row,
    ))
}

pub async fn edit_participant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ParticipantForm>,
) -> Response {
    match admin_service::edit_participant(&state.pool, id, &form).await {
        Ok(row) => redirect_with_notice(
            DASHBOARD_PATH,
            Notice::ParticipantUpdated,
            Some(&row.participant_id),
        ),
        Err(e) => form_failure(&edit_path(id), e),
    }
}

pub async fn delete_participant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let row = admin_service::delete_participant(&state.pool, id).await?;
    if let Err(e) = state.qr.remove(&row.participant_id).await {
        warn!("QR image for {} not removed: {}", row.participant_id, e);
    }
    Ok(redirect_with_notice(
        DASHBOARD_PATH,
        Notice::ParticipantDeleted,
        Some(&row.participant_id),
    ))
}

pub async fn add_achievement_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<AchievementForm>,
) -> Response {
    match admin_service::award_achievement(&state.pool, id, &form).await {
        Ok(outcome) => {
            info!(
                "🏅 {} points for {} ({})",
                outcome.points, outcome.participant.callsign, outcome.participant.participant_id
            );
            let notice = if outcome.counted {
                Notice::AchievementAdded
            } else {
                Notice::AchievementRecorded
            };
            redirect_with_notice(
                DASHBOARD_PATH,
                notice,
                Some(&outcome.participant.participant_id),
            )
        }
        Err(e) => form_failure(DASHBOARD_PATH, e),
    }
}

pub async fn toggle_active_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let row = admin_service::toggle_active(&state.pool, id).await?;
    Ok(redirect_with_notice(
        DASHBOARD_PATH,
        Notice::StatusChanged,
        Some(&row.participant_id),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_mark_only_the_selected_value() {
        let options = category_options(Some(Category::Instructor));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).map(|o| o.value).collect();
        assert_eq!(selected, vec!["instructor"]);

        assert!(subcategory_options(None).iter().all(|o| !o.selected));
    }

    #[test]
    fn validation_failures_redirect_back_to_the_form() {
        let response = form_failure(
            ADD_PATH,
            AppError::Validation(crate::error::InvalidInput::Callsign),
        );
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/admin/participant/add?notice=invalid_callsign");
    }
}
