use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Which unique column a conflicting insert or update hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Callsign,
    ParticipantId,
    QrCode,
    Other,
}

/// Form field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("callsign must be 1 to 100 characters")]
    Callsign,
    #[error("unknown category")]
    Category,
    #[error("pilots need a strike or reconnaissance subcategory")]
    Subcategory,
    #[error("photo reference must be at most 200 characters")]
    PhotoUrl,
    #[error("achievement description must be 1 to 200 characters")]
    Description,
    #[error("points must be a whole number between -1000000 and 1000000")]
    Points,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(#[from] InvalidInput),

    #[error("already exists: {0:?}")]
    Conflict(ConflictField),

    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    /// Classifies unique-constraint violations; other database errors pass through.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = db_err.message();
                let field = if message.contains(".callsign") {
                    ConflictField::Callsign
                } else if message.contains(".participant_id") {
                    ConflictField::ParticipantId
                } else if message.contains(".qr_code") {
                    ConflictField::QrCode
                } else {
                    ConflictField::Other
                };
                return AppError::Conflict(field);
            }
        }
        AppError::Database(err)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status_code: u16,
    title: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, message) = match &self {
            AppError::NotFound => (
                "Not found".to_string(),
                "The page or member you are looking for does not exist.".to_string(),
            ),
            AppError::Validation(invalid) => ("Invalid input".to_string(), invalid.to_string()),
            AppError::Conflict(_) => (
                "Conflict".to_string(),
                "A record with the same value already exists.".to_string(),
            ),
            other => {
                error!("Request failed: {}", other);
                (
                    "Server error".to_string(),
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
        };

        let page = ErrorTemplate {
            status_code: status.as_u16(),
            title,
            message,
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                error!("Error page render failed: {}", e);
                (status, status.canonical_reason().unwrap_or("error")).into_response()
            }
        }
    }
}
