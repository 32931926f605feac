//! Platform identity provider boundary.
//!
//! `IdentityProvider` abstracts the platform-native authentication
//! capability behind one object-safe async trait. Adapters are leaf
//! implementations selected at startup by the host shell:
//!
//! - `CloudIdentity`: production adapter against the cloud identity service
//! - `NoopIdentity`: platforms without an identity integration; reports a
//!   fixed failure so the rest of the client runs unmodified
//!
//! Expected failures (bad credentials, unreachable network) are returned as
//! `AuthOutcome::Failure`, never as errors or panics. An empty string from
//! `bearer_credential` means "no credential", not a zero-length token.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::UserRecord;

use super::clock::{Clock, SystemClock};

/// Identity request timeout in seconds
const IDENTITY_TIMEOUT_SECS: u64 = 30;

/// Token TTL assumed when the identity service omits `expiresIn`
const DEFAULT_ID_TOKEN_TTL_SECS: i64 = 3600;

/// Failure message reported by the no-op adapter
const NOOP_FAILURE_MESSAGE: &str = "Identity services are unavailable on this platform";

/// Failure message for unreachable identity service
const NETWORK_FAILURE_MESSAGE: &str = "Could not reach the identity service";

/// Uniform result of an identity operation.
///
/// Bad credentials and transport problems both land in `Failure`; only
/// programming misuse propagates as a fault elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { user_id: String },
    Failure { message: String },
}

impl AuthOutcome {
    pub fn success(user_id: impl Into<String>) -> Self {
        AuthOutcome::Success {
            user_id: user_id.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { user_id } => Some(user_id),
            AuthOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Failure { message } => Some(message),
        }
    }
}

/// Capability contract over platform authentication.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account. May suspend on network I/O.
    async fn create_account(&self, email: &str, password: &str) -> AuthOutcome;

    /// Sign in to an existing account. May suspend on network I/O.
    async fn sign_in(&self, email: &str, password: &str) -> AuthOutcome;

    /// Drop the cached identity. Synchronous, always succeeds, idempotent.
    fn sign_out(&self);

    /// The cached identity, if signed in. No I/O.
    fn current_identity(&self) -> Option<UserRecord>;

    /// The current bearer token, refreshing if needed. Empty string means
    /// "no credential" - callers must not treat it as a valid token.
    async fn bearer_credential(&self) -> String;

    /// Update the signed-in profile's display name.
    async fn update_display_name(&self, display_name: &str) -> AuthOutcome;
}

// ============================================================================
// Cloud adapter
// ============================================================================

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct ProfileUpdateRequest<'a> {
    #[serde(rename = "displayName")]
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: Option<i64>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedIdentity {
    user: UserRecord,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// Production adapter backed by the cloud identity service.
///
/// Caches the signed-in identity in memory; `bearer_credential` refreshes
/// the token through the refresh endpoint once the cached one expires.
pub struct CloudIdentity {
    client: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedIdentity>>,
}

impl CloudIdentity {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_clock(base_url, Arc::new(SystemClock))
    }

    pub fn with_clock(base_url: impl Into<String>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(IDENTITY_TIMEOUT_SECS))
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client,
            base_url,
            clock,
            cached: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, Option<CachedIdentity>> {
        self.cached.lock().expect("identity cache lock poisoned")
    }

    fn store_response(&self, email: Option<&str>, resp: IdentityResponse) -> AuthOutcome {
        let ttl = resp.expires_in.unwrap_or(DEFAULT_ID_TOKEN_TTL_SECS);
        let user = UserRecord {
            uid: resp.user_id.clone(),
            display_name: resp.display_name,
            email: resp.email.or_else(|| email.map(str::to_string)),
        };
        *self.cache() = Some(CachedIdentity {
            user,
            id_token: resp.id_token,
            refresh_token: resp.refresh_token,
            expires_at: self.clock.now() + Duration::seconds(ttl),
        });
        AuthOutcome::success(resp.user_id)
    }

    /// POST a credential request, folding every failure mode into an outcome.
    async fn password_call(&self, path: &str, email: &str, password: &str) -> AuthOutcome {
        let body = PasswordRequest { email, password };
        let response = match self.client.post(self.url(path)).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, path, "Identity request failed to send");
                return AuthOutcome::failure(NETWORK_FAILURE_MESSAGE);
            }
        };

        if response.status().is_success() {
            match response.json::<IdentityResponse>().await {
                Ok(resp) => {
                    debug!(user_id = %resp.user_id, path, "Identity request succeeded");
                    self.store_response(Some(email), resp)
                }
                Err(e) => {
                    warn!(error = %e, path, "Malformed identity response");
                    AuthOutcome::failure("Unexpected response from the identity service")
                }
            }
        } else {
            let status = response.status();
            let message = Self::error_message(response).await;
            warn!(%status, path, rejection = %message, "Identity request rejected");
            AuthOutcome::failure(message)
        }
    }

    async fn error_message(response: reqwest::Response) -> String {
        match response.json::<IdentityErrorBody>().await {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| "Authentication failed".to_string()),
            Err(_) => "Authentication failed".to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for CloudIdentity {
    async fn create_account(&self, email: &str, password: &str) -> AuthOutcome {
        self.password_call("/v1/accounts/signup", email, password)
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthOutcome {
        self.password_call("/v1/accounts/signin", email, password)
            .await
    }

    fn sign_out(&self) {
        *self.cache() = None;
    }

    fn current_identity(&self) -> Option<UserRecord> {
        self.cache().as_ref().map(|c| c.user.clone())
    }

    async fn bearer_credential(&self) -> String {
        // Snapshot under the lock; the refresh round trip runs without it
        let (token, refresh_token, expires_at) = match self.cache().as_ref() {
            Some(c) => (c.id_token.clone(), c.refresh_token.clone(), c.expires_at),
            None => return String::new(),
        };

        if self.clock.now() < expires_at {
            return token;
        }

        debug!("Cached identity token expired, refreshing");
        let body = RefreshRequest {
            refresh_token: &refresh_token,
        };
        let response = match self
            .client
            .post(self.url("/v1/accounts/refresh"))
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "Token refresh rejected");
                return String::new();
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed to send");
                return String::new();
            }
        };

        match response.json::<IdentityResponse>().await {
            Ok(resp) => {
                let token = resp.id_token.clone();
                self.store_response(None, resp);
                token
            }
            Err(e) => {
                warn!(error = %e, "Malformed token refresh response");
                String::new()
            }
        }
    }

    async fn update_display_name(&self, display_name: &str) -> AuthOutcome {
        let token = self.bearer_credential().await;
        if token.is_empty() {
            return AuthOutcome::failure("Not signed in");
        }

        let body = ProfileUpdateRequest { display_name };
        let response = match self
            .client
            .post(self.url("/v1/accounts/profile"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Profile update failed to send");
                return AuthOutcome::failure(NETWORK_FAILURE_MESSAGE);
            }
        };

        if response.status().is_success() {
            let mut cache = self.cache();
            match cache.as_mut() {
                Some(c) => {
                    c.user.display_name = Some(display_name.to_string());
                    AuthOutcome::success(c.user.uid.clone())
                }
                // Signed out while the request was in flight
                None => AuthOutcome::failure("Not signed in"),
            }
        } else {
            let message = Self::error_message(response).await;
            AuthOutcome::failure(message)
        }
    }
}

// ============================================================================
// No-op adapter
// ============================================================================

/// Adapter for platforms without an identity integration.
///
/// Create/sign-in always report a fixed failure and queries return
/// None/empty, so the rest of the client runs unmodified in degraded
/// environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIdentity;

#[async_trait]
impl IdentityProvider for NoopIdentity {
    async fn create_account(&self, _email: &str, _password: &str) -> AuthOutcome {
        AuthOutcome::failure(NOOP_FAILURE_MESSAGE)
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AuthOutcome {
        AuthOutcome::failure(NOOP_FAILURE_MESSAGE)
    }

    fn sign_out(&self) {}

    fn current_identity(&self) -> Option<UserRecord> {
        None
    }

    async fn bearer_credential(&self) -> String {
        String::new()
    }

    async fn update_display_name(&self, _display_name: &str) -> AuthOutcome {
        AuthOutcome::failure(NOOP_FAILURE_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    #[test]
    fn test_auth_outcome_accessors() {
        let ok = AuthOutcome::success("u1");
        assert!(ok.is_success());
        assert_eq!(ok.user_id(), Some("u1"));
        assert_eq!(ok.error_message(), None);

        let err = AuthOutcome::failure("nope");
        assert!(!err.is_success());
        assert_eq!(err.user_id(), None);
        assert_eq!(err.error_message(), Some("nope"));
    }

    #[tokio::test]
    async fn test_noop_identity_contract() {
        let identity = NoopIdentity;

        let outcome = identity.sign_in("pat@example.com", "pw").await;
        assert_eq!(outcome.error_message(), Some(NOOP_FAILURE_MESSAGE));

        let outcome = identity.create_account("pat@example.com", "pw").await;
        assert!(!outcome.is_success());

        assert!(identity.current_identity().is_none());
        assert_eq!(identity.bearer_credential().await, "");

        // sign_out is a no-op and idempotent
        identity.sign_out();
        identity.sign_out();

        let outcome = identity.update_display_name("Pat").await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_cloud_identity_starts_signed_out() {
        let clock = ManualClock::new(1_000);
        let identity = CloudIdentity::with_clock("https://id.huddle.app/", clock)
            .expect("Failed to build identity adapter");

        assert!(identity.current_identity().is_none());
        // No cached credential; returns empty without any I/O
        assert_eq!(identity.bearer_credential().await, "");

        identity.sign_out();
        assert!(identity.current_identity().is_none());
    }

    #[tokio::test]
    async fn test_cloud_identity_caches_and_signs_out() {
        let clock = ManualClock::new(1_000);
        let identity = CloudIdentity::with_clock("https://id.huddle.app", clock)
            .expect("Failed to build identity adapter");

        let resp = IdentityResponse {
            user_id: "u1".to_string(),
            id_token: "tok-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_in: Some(600),
            display_name: Some("Pat".to_string()),
            email: None,
        };
        let outcome = identity.store_response(Some("pat@example.com"), resp);
        assert_eq!(outcome.user_id(), Some("u1"));

        let user = identity.current_identity().expect("expected cached identity");
        assert_eq!(user.uid, "u1");
        assert_eq!(user.email.as_deref(), Some("pat@example.com"));

        // Unexpired token is served from cache
        assert_eq!(identity.bearer_credential().await, "tok-1");

        identity.sign_out();
        assert!(identity.current_identity().is_none());
        assert_eq!(identity.bearer_credential().await, "");
    }

    #[test]
    fn test_identity_response_parses_service_payload() {
        let json = r#"{"userId":"u1","idToken":"tok","refreshToken":"ref","expiresIn":3600,"displayName":"Pat","email":"pat@example.com"}"#;
        let resp: IdentityResponse =
            serde_json::from_str(json).expect("Failed to parse identity response");
        assert_eq!(resp.user_id, "u1");
        assert_eq!(resp.expires_in, Some(3600));
    }
}
