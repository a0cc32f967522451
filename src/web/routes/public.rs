use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};

use crate::error::{AppError, Result};
use crate::services::leaderboard_service::{
    self, IndexPageData, PilotCardView, ProfileView, RatingEntry,
};
use crate::web::notice::{NoticeQuery, NoticeView};
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub notice: NoticeView,
    pub page: IndexPageData,
}

pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>> {
    let page = leaderboard_service::load_index_page(&state.pool).await?;
    render(&IndexTemplate {
        notice: NoticeView::from_query(&query),
        page,
    })
}

pub struct RatingSection {
    pub key: &'static str,
    pub title: &'static str,
    pub pilots: Vec<PilotCardView>,
}

#[derive(Template)]
#[template(path = "rating.html")]
pub struct RatingTemplate {
    pub sections: Vec<RatingSection>,
}

pub async fn rating_handler(State(state): State<AppState>) -> Result<Html<String>> {
    let rating = leaderboard_service::load_rating_page(&state.pool).await?;
    let sections = vec![
        RatingSection {
            key: "all",
            title: "All pilots",
            pilots: rating.all,
        },
        RatingSection {
            key: "strike",
            title: "Strike",
            pilots: rating.strike,
        },
        RatingSection {
            key: "reconnaissance",
            title: "Reconnaissance",
            pilots: rating.reconnaissance,
        },
    ];
    render(&RatingTemplate { sections })
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub profile: ProfileView,
}

pub async fn profile_handler(
    State(state): State<AppState>,
    Path(qr_code): Path<String>,
) -> Result<Html<String>> {
    let profile = leaderboard_service::load_profile(&state.pool, &state.qr, &qr_code)
        .await?
        .ok_or(AppError::NotFound)?;
    render(&ProfileTemplate { profile })
}

pub async fn rating_api_handler(State(state): State<AppState>) -> Result<Json<Vec<RatingEntry>>> {
    let entries = leaderboard_service::load_rating_entries(&state.pool, &state.qr).await?;
    Ok(Json(entries))
}
