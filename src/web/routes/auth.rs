use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::services::session_service;
use crate::web::middleware::auth::{removal_cookie, session_cookie, with_cookie, AdminSession};
use crate::web::notice::{redirect_with_notice, Notice, NoticeQuery, NoticeView};
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "admin_login.html")]
pub struct LoginTemplate {
    pub notice: NoticeView,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn login_page(Query(query): Query<NoticeQuery>) -> Result<Html<String>> {
    render(&LoginTemplate {
        notice: NoticeView::from_query(&query),
    })
}

pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if !session_service::verify_credentials(&state.config, &form.username, &form.password) {
        warn!("🔒 Failed admin login for user {:?}", form.username);
        return Ok(redirect_with_notice("/admin/login", Notice::LoginFailed, None));
    }

    let token = session_service::create_session(&state.pool, state.config.session_ttl_secs).await?;
    info!("🔓 Admin signed in");

    let response = redirect_with_notice("/admin", Notice::LoggedIn, None);
    Ok(with_cookie(response, session_cookie(&state.config, token)))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Response> {
    session_service::revoke_session(&state.pool, &session.token).await?;
    info!("Admin signed out");

    let response = redirect_with_notice("/", Notice::LoggedOut, None);
    Ok(with_cookie(response, removal_cookie(&state.config)))
}
