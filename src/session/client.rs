//! HTTP client for the auth endpoints.
//!
//! The client keeps a cookie store, so the `HttpOnly` refresh cookie rides
//! along exactly as it would in a browser; the access token is the only
//! credential callers ever see.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::api::handlers::auth::types::{AuthResponse, MeResponse, OkResponse, RefreshResponse};
use crate::api::APP_USER_AGENT;
use crate::store::User;

/// Request timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error-body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Parse(String),
}

impl ClientError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Errors
    /// Returns an error on network failure or a non-success response.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ClientError> {
        let payload = json!({ "email": email, "password": password, "name": name });
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json(response).await
    }

    /// # Errors
    /// Returns an error on network failure or a non-success response.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let payload = json!({ "email": email, "password": password });
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json(response).await
    }

    /// Mint a new token pair from the refresh cookie held in the jar.
    ///
    /// # Errors
    /// Returns an error on network failure or a non-success response.
    pub async fn refresh(&self) -> Result<RefreshResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json(response).await
    }

    /// # Errors
    /// Returns an error on network failure or a non-success response.
    pub async fn me(&self, access_token: &str) -> Result<User, ClientError> {
        let response = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_request_error)?;
        let me: MeResponse = handle_json(response).await?;
        Ok(me.user)
    }

    /// # Errors
    /// Returns an error on network failure or a non-success response.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .send()
            .await
            .map_err(map_request_error)?;
        let _: OkResponse = handle_json(response).await?;
        Ok(())
    }
}

fn map_request_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(err.to_string())
    }
}

async fn handle_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http {
            status,
            message: error_message(&body),
        })
    }
}

/// Pull the `error` field out of a failure body, falling back to the
/// sanitized raw text.
fn error_message(body: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"].as_str().map(str::to_string))
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
