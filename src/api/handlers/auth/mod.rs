//! Auth endpoints composing the token service, credential store, and
//! session transport into the login/register/refresh/logout/me operations.

pub mod login;
pub mod me;
pub mod refresh;
pub mod register;
pub mod session;
pub mod state;
pub mod tokens;
pub mod types;

pub use login::login;
pub use me::me;
pub use refresh::refresh;
pub use register::register;
pub use session::logout;
pub use state::{AuthConfig, AuthState};
pub use tokens::TokenKeys;

use anyhow::Context;
use axum::http::HeaderValue;

use crate::api::error::ApiError;
use crate::store::User;

/// Mint a fresh access/refresh pair for `user` and package the refresh
/// token as a `Set-Cookie` value. Every issuing endpoint rotates the pair
/// through this helper; the refresh token never appears in a body.
fn issue_pair(auth_state: &AuthState, user: &User) -> Result<(String, HeaderValue), ApiError> {
    let access_token = auth_state.issue_access(user)?;
    let refresh_token = auth_state.issue_refresh(user)?;
    let cookie = session::refresh_cookie(auth_state.config(), &refresh_token)
        .context("failed to build refresh cookie")?;
    Ok((access_token, cookie))
}
