pub mod middleware;
pub mod notice;
pub mod routes;
pub mod state;

use askama::Template;
use axum::{
    middleware as axum_middleware,
    response::Html,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{admin, auth, public, qr};

pub use state::AppState;

pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    Ok(Html(template.render()?))
}

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard_handler))
        .route(
            "/admin/participant/add",
            get(admin::add_participant_page).post(admin::add_participant_handler),
        )
        .route(
            "/admin/participant/{id}/edit",
            get(admin::edit_participant_page).post(admin::edit_participant_handler),
        )
        .route(
            "/admin/participant/{id}/delete",
            post(admin::delete_participant_handler),
        )
        .route(
            "/admin/participant/{id}/add_achievement",
            post(admin::add_achievement_handler),
        )
        .route(
            "/admin/participant/{id}/toggle_active",
            post(admin::toggle_active_handler),
        )
        .route("/admin/logout", post(auth::logout_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_admin,
        ));

    let static_dir = state.config.static_dir.clone();
    let qr_dir = state.qr.dir().to_path_buf();

    Router::new()
        .route("/", get(public::index_handler))
        .route("/rating", get(public::rating_handler))
        .route("/pilot/{qr_code}", get(public::profile_handler))
        .route("/api/rating", get(public::rating_api_handler))
        .route("/qr/{qr_code}", get(qr::qr_snippet_handler))
        .route("/admin/login", get(auth::login_page).post(auth::login_handler))
        .merge(admin_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/qr_codes", ServeDir::new(qr_dir))
        .fallback(|| async { AppError::NotFound })
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
