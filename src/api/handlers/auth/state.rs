//! Auth state and token lifetime configuration.

use anyhow::Result;
use auth_token::{AuthTokenClaims, TokenClass};
use chrono::Utc;

use crate::store::User;

use super::tokens::TokenKeys;

/// Access tokens bound the blast radius of a leaked bearer credential.
const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
/// Refresh tokens live in the HttpOnly cookie for a week.
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub(crate) fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Only mark the refresh cookie `Secure` when the frontend is served
    /// over HTTPS, so local development keeps working.
    pub(crate) fn refresh_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    keys: TokenKeys,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, keys: TokenKeys) -> Self {
        Self { config, keys }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// # Errors
    /// Returns an error if the claims cannot be encoded or signed.
    pub fn issue_access(&self, user: &User) -> Result<String> {
        self.keys.issue(
            user,
            TokenClass::Access,
            self.config.access_ttl_seconds,
            now_unix_seconds(),
        )
    }

    /// # Errors
    /// Returns an error if the claims cannot be encoded or signed.
    pub fn issue_refresh(&self, user: &User) -> Result<String> {
        self.keys.issue(
            user,
            TokenClass::Refresh,
            self.config.refresh_ttl_seconds,
            now_unix_seconds(),
        )
    }

    /// Fails closed: any verification failure yields `None`.
    #[must_use]
    pub fn verify_access(&self, token: &str) -> Option<AuthTokenClaims> {
        self.keys
            .verify(token, TokenClass::Access, now_unix_seconds())
    }

    /// Fails closed: any verification failure yields `None`.
    #[must_use]
    pub fn verify_refresh(&self, token: &str) -> Option<AuthTokenClaims> {
        self.keys
            .verify(token, TokenClass::Refresh, now_unix_seconds())
    }
}

fn now_unix_seconds() -> i64 {
    Utc::now().timestamp()
}
