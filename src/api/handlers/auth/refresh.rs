use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::store::UserStore;

use super::{
    issue_pair,
    session::extract_refresh_token,
    state::AuthState,
    types::RefreshResponse,
};

type RefreshResult = Result<(StatusCode, HeaderMap, Json<RefreshResponse>), ApiError>;

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair; rotated refresh cookie", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, or expired refresh cookie"),
        (status = 404, description = "User no longer exists"),
        (status = 500, description = "Unexpected error")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    headers: HeaderMap,
    store: Extension<Arc<dyn UserStore>>,
    auth_state: Extension<Arc<AuthState>>,
) -> RefreshResult {
    // Missing, expired, tampered, and wrong-class tokens all collapse into
    // the same generic rejection.
    let token = extract_refresh_token(&headers)
        .ok_or_else(|| ApiError::authentication("Invalid refresh token"))?;
    let claims = auth_state
        .verify_refresh(&token)
        .ok_or_else(|| ApiError::authentication("Invalid refresh token"))?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication("Invalid refresh token"))?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // Rotation: a brand-new pair every time. The previous refresh token is
    // not revoked server-side; the client discards it for the new one.
    let (access_token, cookie) = issue_pair(&auth_state, &user)?;
    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(RefreshResponse {
            success: true,
            access_token,
        }),
    ))
}
