use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::database::participants_repo;
use crate::error::{AppError, Result};
use crate::services::qr_service::QrCache;
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "qr_snippet.html")]
pub struct QrSnippetTemplate {
    pub src: String,
    pub callsign: String,
}

/// Bare `<img>` fragment for embedding the cached QR image.
pub async fn qr_snippet_handler(
    State(state): State<AppState>,
    Path(qr_code): Path<String>,
) -> Result<Html<String>> {
    let participant = participants_repo::find_by_qr_code(&state.pool, &qr_code)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;
    state.qr.ensure(&participant).await?;

    render(&QrSnippetTemplate {
        src: QrCache::public_src(&participant.participant_id),
        callsign: participant.callsign,
    })
}
