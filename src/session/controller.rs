//! Session controller: a state machine over the auth endpoints.
//!
//! Holds the current user and access token, refreshes silently on a timer
//! and on 401, and signs out locally when the refresh path fails — an
//! expired refresh token is not recoverable client-side.

use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

use crate::store::User;

use super::client::{AuthClient, ClientError};

/// Interval between silent refreshes: three minutes of margin ahead of the
/// fifteen-minute access token expiry.
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60);

/// Mirror for the access token, standing in for the browser's persistent
/// storage key that gives cross-tab continuity.
pub trait TokenCache: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, token: &str);
    fn clear(&self);
}

pub struct MemoryTokenCache {
    token: StdMutex<Option<String>>,
}

impl MemoryTokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: StdMutex::new(None),
        }
    }
}

impl Default for MemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache for MemoryTokenCache {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

struct Session {
    user: Option<User>,
    access_token: Option<String>,
    state: SessionState,
}

struct ControllerInner {
    client: AuthClient,
    cache: Arc<dyn TokenCache>,
    refresh_interval: Duration,
    session: RwLock<Session>,
    // Single-flight guard: concurrent refresh callers wait for the winner
    // instead of issuing duplicate calls.
    refresh_gate: Mutex<()>,
    refresh_task: StdMutex<Option<AbortHandle>>,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        if let Ok(guard) = self.refresh_task.get_mut() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

impl SessionController {
    #[must_use]
    pub fn new(client: AuthClient, cache: Arc<dyn TokenCache>) -> Self {
        Self::with_refresh_interval(client, cache, DEFAULT_REFRESH_INTERVAL)
    }

    /// Shorten the refresh interval for tests; production callers use `new`.
    #[must_use]
    pub fn with_refresh_interval(
        client: AuthClient,
        cache: Arc<dyn TokenCache>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                client,
                cache,
                refresh_interval,
                session: RwLock::new(Session {
                    user: None,
                    access_token: None,
                    state: SessionState::Unauthenticated,
                }),
                refresh_gate: Mutex::new(()),
                refresh_task: StdMutex::new(None),
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.session.read().await.state
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.session.read().await.user.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.session.read().await.access_token.clone()
    }

    /// Bootstrap the session: validate a cached access token, fall back to
    /// one silent refresh, and end in a definite state either way.
    pub async fn initialize(&self) {
        self.set_state(SessionState::Authenticating).await;

        if let Some(stored) = self.inner.cache.load() {
            match self.inner.client.me(&stored).await {
                Ok(user) => {
                    self.enter_authenticated(user, stored).await;
                    return;
                }
                Err(err) if err.status() == Some(401) => {
                    // Expired access token: one refresh, one retry.
                    if let Some(token) = self.refresh().await {
                        if let Ok(user) = self.inner.client.me(&token).await {
                            self.enter_authenticated(user, token).await;
                            return;
                        }
                    }
                }
                Err(err) => {
                    debug!("Session bootstrap failed: {err}");
                }
            }
            self.sign_out_locally().await;
        } else {
            // No cached token; only the HttpOnly cookie may have survived
            // (fresh tab), so try a direct refresh.
            if let Some(token) = self.refresh().await {
                if let Ok(user) = self.inner.client.me(&token).await {
                    self.enter_authenticated(user, token).await;
                    return;
                }
            }
            self.sign_out_locally().await;
        }
    }

    /// # Errors
    /// Propagates the endpoint failure message for display; the session
    /// stays unauthenticated.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        self.set_state(SessionState::Authenticating).await;
        match self.inner.client.login(email, password).await {
            Ok(response) => {
                self.enter_authenticated(response.user.clone(), response.access_token)
                    .await;
                Ok(response.user)
            }
            Err(err) => {
                self.sign_out_locally().await;
                Err(err)
            }
        }
    }

    /// # Errors
    /// Propagates the endpoint failure message for display; the session
    /// stays unauthenticated.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, ClientError> {
        self.set_state(SessionState::Authenticating).await;
        match self.inner.client.register(email, password, name).await {
            Ok(response) => {
                self.enter_authenticated(response.user.clone(), response.access_token)
                    .await;
                Ok(response.user)
            }
            Err(err) => {
                self.sign_out_locally().await;
                Err(err)
            }
        }
    }

    /// Best-effort logout: the endpoint call may fail, local state always
    /// clears.
    pub async fn logout(&self) {
        if let Err(err) = self.inner.client.logout().await {
            debug!("Logout call failed: {err}");
        }
        self.sign_out_locally().await;
    }

    /// Mint a new access token from the refresh cookie. Returns the new
    /// token, or `None` after signing out locally — any failure on the
    /// refresh path is terminal for the session.
    pub async fn refresh(&self) -> Option<String> {
        let before = self.access_token().await;
        let _gate = self.inner.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate;
        // their token is just as valid.
        let current = self.access_token().await;
        if current != before {
            return current;
        }

        match self.inner.client.refresh().await {
            Ok(response) => {
                let token = response.access_token;
                self.inner.cache.store(&token);
                let mut session = self.inner.session.write().await;
                session.access_token = Some(token.clone());
                Some(token)
            }
            Err(err) => {
                warn!("Refresh failed, signing out: {err}");
                self.sign_out_locally().await;
                None
            }
        }
    }

    async fn set_state(&self, state: SessionState) {
        self.inner.session.write().await.state = state;
    }

    async fn enter_authenticated(&self, user: User, access_token: String) {
        self.inner.cache.store(&access_token);
        {
            let mut session = self.inner.session.write().await;
            session.user = Some(user);
            session.access_token = Some(access_token);
            session.state = SessionState::Authenticated;
        }
        self.spawn_refresh_task();
    }

    async fn sign_out_locally(&self) {
        self.inner.cache.clear();
        {
            let mut session = self.inner.session.write().await;
            session.user = None;
            session.access_token = None;
            session.state = SessionState::Unauthenticated;
        }
        // Torn down last: this may abort the task we are running on.
        self.set_refresh_task(None);
    }

    fn set_refresh_task(&self, handle: Option<AbortHandle>) {
        if let Ok(mut guard) = self.inner.refresh_task.lock() {
            if let Some(old) = guard.take() {
                old.abort();
            }
            *guard = handle;
        }
    }

    fn spawn_refresh_task(&self) {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let controller = SessionController { inner };
                if controller.refresh().await.is_none() {
                    break;
                }
            }
        });
        self.set_refresh_task(Some(handle.abort_handle()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_token_cache_round_trips() {
        let cache = MemoryTokenCache::new();
        assert!(cache.load().is_none());

        cache.store("token-1");
        assert_eq!(cache.load(), Some("token-1".to_string()));

        cache.store("token-2");
        assert_eq!(cache.load(), Some("token-2".to_string()));

        cache.clear();
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn controller_starts_unauthenticated() -> Result<(), ClientError> {
        let client = AuthClient::new("http://localhost:1")?;
        let controller = SessionController::new(client, Arc::new(MemoryTokenCache::new()));

        assert_eq!(controller.state().await, SessionState::Unauthenticated);
        assert!(controller.user().await.is_none());
        assert!(controller.access_token().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn initialize_without_server_or_cookie_ends_unauthenticated() -> Result<(), ClientError>
    {
        // Port 1 is unreachable; both the cached-token and refresh paths
        // fail, which must land in a definite unauthenticated state.
        let client = AuthClient::new("http://127.0.0.1:1")?;
        let cache = Arc::new(MemoryTokenCache::new());
        cache.store("stale-token");
        let controller = SessionController::new(client, cache.clone());

        controller.initialize().await;

        assert_eq!(controller.state().await, SessionState::Unauthenticated);
        assert!(cache.load().is_none());
        Ok(())
    }
}
