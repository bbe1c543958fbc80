use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::handlers::valid_email;
use crate::store::UserStore;

use super::{
    issue_pair,
    state::AuthState,
    types::{AuthResponse, RegisterRequest},
};

const MIN_PASSWORD_CHARS: usize = 6;

type RegisterResult = Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError>;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created; refresh cookie set", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Unexpected error")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    store: Extension<Arc<dyn UserStore>>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> RegisterResult {
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("Missing payload"));
    };

    if request.email.is_empty() || request.password.is_empty() || request.name.is_empty() {
        return Err(ApiError::validation("Missing registration fields"));
    }
    if !valid_email(&request.email) {
        return Err(ApiError::validation("Invalid email"));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let user = store
        .create(&request.email, &request.password, &request.name)
        .await?
        .ok_or_else(|| ApiError::conflict("Email already registered"))?;

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
