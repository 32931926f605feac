//! Login, registration, and logout flow.
//!
//! `AuthService` drives `SessionManager` from `/api/user/*` response
//! payloads and persists the token through `SecureStore` so a relaunch can
//! restore an unexpired session. Every transport or auth failure is
//! normalized into an `AuthOutcome` here; callers never see raw errors.
//!
//! Racing logins are last-writer-wins: the most recently completed attempt
//! determines the final session. In-flight attempts are not fenced.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserRecord};

use super::clock::{Clock, SystemClock};
use super::credentials::SecureStore;
use super::identity::AuthOutcome;
use super::session::{SessionManager, DEFAULT_SESSION_TTL_SECS};

/// Secure store key for the bearer token
const STORED_TOKEN_KEY: &str = "session.token";

/// Secure store key for the serialized user record
const STORED_USER_KEY: &str = "session.user";

/// Secure store key for the RFC 3339 expiry instant
const STORED_EXPIRES_AT_KEY: &str = "session.expires_at";

/// The auth endpoints the service needs, as a seam for tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        ApiClient::login(self, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        ApiClient::register(self, request).await
    }
}

pub struct AuthService<A: AuthApi = ApiClient> {
    api: A,
    session: SessionManager,
    store: Arc<dyn SecureStore>,
    clock: Arc<dyn Clock>,
}

impl<A: AuthApi> AuthService<A> {
    pub fn new(api: A, store: Arc<dyn SecureStore>) -> Self {
        Self::with_clock(api, store, Arc::new(SystemClock))
    }

    pub fn with_clock(api: A, store: Arc<dyn SecureStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            session: SessionManager::with_clock(clock.clone()),
            store,
            clock,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Authenticate against `/api/user/login` and store the session.
    pub async fn login(&mut self, email: &str, password: &str) -> AuthOutcome {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.login(&request).await {
            Ok(resp) => self.accept(resp),
            Err(e) => Self::normalize_error(e),
        }
    }

    /// Create an account via `/api/user/register` and store the session.
    pub async fn register(&mut self, request: RegisterRequest) -> AuthOutcome {
        match self.api.register(&request).await {
            Ok(resp) => self.accept(resp),
            Err(e) => Self::normalize_error(e),
        }
    }

    /// Clear the session and the persisted token. Idempotent.
    pub fn logout(&mut self) {
        self.session.clear_session();
        for key in [STORED_TOKEN_KEY, STORED_USER_KEY, STORED_EXPIRES_AT_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Failed to remove stored session value");
            }
        }
        info!("Logged out");
    }

    /// Re-hydrate a persisted session at startup.
    ///
    /// Returns true when an unexpired session was restored. Stale entries
    /// are removed so the next launch skips the parse.
    pub fn restore_session(&mut self) -> bool {
        let stored = (
            self.store.get_string(STORED_TOKEN_KEY),
            self.store.get_string(STORED_USER_KEY),
            self.store.get_string(STORED_EXPIRES_AT_KEY),
        );
        let (Ok(Some(token)), Ok(Some(user_json)), Ok(Some(expires_at))) = stored else {
            // A partial session (or an unreadable key) is unusable; drop
            // whatever is left so no orphaned keys linger in the keychain
            self.discard_stored();
            return false;
        };

        let user: UserRecord = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user record is unreadable, discarding");
                self.discard_stored();
                return false;
            }
        };
        let expires_at = match DateTime::parse_from_rfc3339(&expires_at) {
            Ok(ts) => ts.with_timezone(&chrono::Utc),
            Err(e) => {
                warn!(error = %e, "Stored expiry is unreadable, discarding");
                self.discard_stored();
                return false;
            }
        };

        let remaining = (expires_at - self.clock.now()).num_seconds();
        if remaining <= 0 {
            debug!("Stored session expired, discarding");
            self.discard_stored();
            return false;
        }

        info!(uid = %user.uid, remaining, "Restored persisted session");
        self.session.save_session(token, user, remaining);
        true
    }

    /// Store a successful auth payload in the session and the secure store.
    fn accept(&mut self, resp: AuthResponse) -> AuthOutcome {
        let ttl = resp.expires_in.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let uid = resp.user.uid.clone();
        self.session.save_session(resp.token.clone(), resp.user.clone(), ttl);
        self.persist(&resp);
        AuthOutcome::success(uid)
    }

    fn persist(&self, resp: &AuthResponse) {
        let expires_at = match self.session.expires_at() {
            Some(ts) => ts.to_rfc3339(),
            None => return,
        };
        let user_json = match serde_json::to_string(&resp.user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize user record for storage");
                return;
            }
        };
        // Best-effort: a keychain failure degrades to in-memory-only session
        for (key, value) in [
            (STORED_TOKEN_KEY, resp.token.as_str()),
            (STORED_USER_KEY, user_json.as_str()),
            (STORED_EXPIRES_AT_KEY, expires_at.as_str()),
        ] {
            if let Err(e) = self.store.save_string(key, value) {
                warn!(error = %e, key, "Failed to persist session value");
            }
        }
    }

    fn discard_stored(&self) {
        for key in [STORED_TOKEN_KEY, STORED_USER_KEY, STORED_EXPIRES_AT_KEY] {
            let _ = self.store.remove(key);
        }
    }

    fn normalize_error(err: anyhow::Error) -> AuthOutcome {
        let message = match err.downcast_ref::<ApiError>() {
            Some(api_err) => api_err.user_message(),
            None => "Something went wrong - try again".to_string(),
        };
        warn!(error = %err, "Auth request failed");
        AuthOutcome::failure(message)
    }
}
