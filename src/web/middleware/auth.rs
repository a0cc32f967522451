use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use tracing::warn;

use crate::config::Config;
use crate::services::session_service;
use crate::web::notice::{redirect_with_notice, Notice};
use crate::web::AppState;

pub const SESSION_COOKIE: &str = "admin_session";

/// Inserted into request extensions for authenticated admin requests.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub token: String,
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(cookie::time::Duration::seconds(config.session_ttl_secs))
        .build()
}

pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .build();
    cookie.make_removal();
    cookie
}

/// Appends a `Set-Cookie` header. A cookie that cannot be encoded is dropped with a warning.
pub fn with_cookie(mut response: Response, cookie: Cookie<'_>) -> Response {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Cookie {} not set: {}", cookie.name(), e),
    }
    response
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers()) {
        match session_service::validate_session(&state.pool, &token).await {
            Ok(true) => {
                request.extensions_mut().insert(AdminSession { token });
                return next.run(request).await;
            }
            Ok(false) => {}
            Err(e) => warn!("Session lookup failed: {}", e),
        }
    }

    redirect_with_notice("/admin/login", Notice::AuthRequired, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_read_from_any_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("lang=uk; admin_session=abc123"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn session_cookie_attributes_follow_config() {
        let config = Config::from_lookup(|key| match key {
            "APP_ENV" => Some("production".to_string()),
            "SESSION_TTL_SECS" => Some("600".to_string()),
            _ => None,
        })
        .unwrap();
        let rendered = session_cookie(&config, "tok".to_string()).to_string();
        assert!(rendered.starts_with("admin_session=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=600"));
    }
}
