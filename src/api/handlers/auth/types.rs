//! Request/response types for auth endpoints. Request payloads carry
//! plaintext passwords, so their `Debug` output redacts them.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::store::User;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login/register response: the refresh token travels only in the
/// `Set-Cookie` header, never in this body.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub success: bool,
    pub user: User,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OkResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_uses_camel_case_access_token() -> Result<(), serde_json::Error> {
        let response = AuthResponse {
            success: true,
            user: User {
                id: uuid::Uuid::nil(),
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
            },
            access_token: "token".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["accessToken"], "token");
        assert_eq!(value["user"]["email"], "ann@example.com");
        Ok(())
    }

    #[test]
    fn request_debug_redacts_passwords() {
        let register = RegisterRequest {
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Ann".to_string(),
        };
        let login = LoginRequest {
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
        };

        assert!(!format!("{register:?}").contains("secret1"));
        assert!(!format!("{login:?}").contains("secret1"));
    }
}
