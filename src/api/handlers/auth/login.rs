use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::store::UserStore;

use super::{
    issue_pair,
    state::AuthState,
    types::{AuthResponse, LoginRequest},
};

type LoginResult = Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError>;

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted; refresh cookie set", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Bad credentials"),
        (status = 500, description = "Unexpected error")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    store: Extension<Arc<dyn UserStore>>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> LoginResult {
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("Missing payload"));
    };

    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::validation("Missing email or password"));
    }

    // One generic message for unknown email and wrong password, so the
    // endpoint cannot be used to probe which accounts exist.
    let user = store
        .verify(&request.email, &request.password)
        .await?
        .ok_or_else(|| ApiError::authentication("Invalid email or password"))?;

    let (access_token, cookie) = issue_pair(&auth_state, &user)?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponse {
            success: true,
            user,
            access_token,
        }),
    ))
}
