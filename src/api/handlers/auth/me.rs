use axum::{extract::Extension, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::store::UserStore;

use super::{session::extract_bearer_token, state::AuthState, types::MeResponse};

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing, invalid, or expired access token"),
        (status = 404, description = "User no longer exists"),
        (status = 500, description = "Unexpected error")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn me(
    headers: HeaderMap,
    store: Extension<Arc<dyn UserStore>>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<MeResponse>, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::authentication("Invalid access token"))?;
    let claims = auth_state
        .verify_access(&token)
        .ok_or_else(|| ApiError::authentication("Invalid access token"))?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication("Invalid access token"))?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}
