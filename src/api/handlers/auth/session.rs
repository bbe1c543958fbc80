//! Session transport: where each token class travels.
//!
//! Access tokens ride the `Authorization` header; the refresh token lives
//! exclusively in an `HttpOnly` cookie that client-side script cannot read.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{state::AuthConfig, state::AuthState, types::OkResponse};

pub(crate) const REFRESH_COOKIE_NAME: &str = "parley_refresh";

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = OkResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Always clear the cookie; logout is idempotent and has no error path.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_refresh_cookie(auth_state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::OK, headers, Json(OkResponse { success: true }))
}

/// Build the `HttpOnly` refresh cookie for a freshly issued token.
pub(super) fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_ttl_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if config.refresh_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_refresh_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.refresh_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secure_config() -> AuthConfig {
        AuthConfig::new("https://parley.dev".to_string())
    }

    fn local_config() -> AuthConfig {
        AuthConfig::new("http://localhost:3000".to_string())
    }

    #[test]
    fn refresh_cookie_carries_required_attributes() {
        let cookie = refresh_cookie(&secure_config(), "token").expect("cookie");
        let cookie = cookie.to_str().expect("ascii");

        assert!(cookie.starts_with("parley_refresh=token"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn local_development_skips_secure() {
        let cookie = refresh_cookie(&local_config(), "token").expect("cookie");
        assert!(!cookie.to_str().expect("ascii").contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie(&secure_config()).expect("cookie");
        let cookie = cookie.to_str().expect("ascii");
        assert!(cookie.starts_with("parley_refresh="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn extract_refresh_token_finds_the_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; parley_refresh=abc123; lang=en"),
        );
        assert_eq!(extract_refresh_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_refresh_token_absent_when_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(extract_refresh_token(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("parley_refresh="));
        assert!(extract_refresh_token(&headers).is_none());
    }

    #[test]
    fn extract_bearer_token_accepts_both_prefixes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
