//! Token service: issues and verifies the access/refresh pair.
//!
//! Each token class is signed with its own secret, so a leaked access
//! secret cannot forge refresh tokens and vice versa.

use anyhow::{Context, Result};
use auth_token::{sign_hs256, verify_hs256, AuthTokenClaims, TokenClass, TOKEN_VERSION};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::store::User;

pub struct TokenKeys {
    access_secret: SecretString,
    refresh_secret: SecretString,
}

impl TokenKeys {
    #[must_use]
    pub fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
        }
    }

    fn secret_for(&self, class: TokenClass) -> &[u8] {
        match class {
            TokenClass::Access => self.access_secret.expose_secret().as_bytes(),
            TokenClass::Refresh => self.refresh_secret.expose_secret().as_bytes(),
        }
    }

    /// Sign a token of the given class for `user`.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded or signed.
    pub fn issue(
        &self,
        user: &User,
        class: TokenClass,
        ttl_seconds: i64,
        now_unix_seconds: i64,
    ) -> Result<String> {
        let claims = AuthTokenClaims {
            v: TOKEN_VERSION,
            sub: user.id.to_string(),
            email: user.email.clone(),
            cls: class,
            iat: now_unix_seconds,
            exp: now_unix_seconds + ttl_seconds,
        };
        sign_hs256(self.secret_for(class), &claims).context("failed to sign token")
    }

    /// Verify a token against the given class.
    ///
    /// Fails closed: signature, structure, version, class, and expiry
    /// failures all normalize to `None`; nothing is raised to the caller.
    #[must_use]
    pub fn verify(
        &self,
        token: &str,
        class: TokenClass,
        now_unix_seconds: i64,
    ) -> Option<AuthTokenClaims> {
        match verify_hs256(token, self.secret_for(class), class, now_unix_seconds) {
            Ok(claims) => Some(claims),
            Err(err) => {
                // Invalid tokens are routine traffic, not server errors.
                debug!("Token rejected: {err}");
                None
            }
        }
    }
}
