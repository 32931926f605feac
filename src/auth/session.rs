//! In-memory session lifecycle.
//!
//! `SessionManager` owns the bearer token, the authenticated user record,
//! and the token expiry. It performs no I/O; it is driven by auth response
//! payloads (see `auth::service`) and queried by the navigation layer.
//!
//! Expiry never mutates state on its own: `is_valid` and `valid_token`
//! simply start reporting invalidity once the clock passes `expires_at`,
//! and the user record stays in place until `clear_session`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::UserRecord;

use super::clock::{Clock, SystemClock};

/// Session TTL in seconds used when the server omits `expiresIn`.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// A bearer token with its issuance window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Derived session state. Never stored - computed from the presence and
/// validity of the credential and user record, so it cannot diverge.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn {
        user: UserRecord,
        credential: Credential,
    },
}

pub struct SessionManager {
    clock: Arc<dyn Clock>,
    credential: Option<Credential>,
    user: Option<UserRecord>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            credential: None,
            user: None,
        }
    }

    /// Store a new session, replacing any prior one (no merge).
    ///
    /// `token` must be non-empty; an empty bearer string means "no
    /// credential" everywhere in this crate and must not reach here.
    pub fn save_session(&mut self, token: impl Into<String>, user: UserRecord, ttl_seconds: i64) {
        let token = token.into();
        let now = self.clock.now();
        self.credential = Some(Credential {
            token,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        });
        info!(uid = %user.uid, ttl_seconds, "Session saved");
        self.user = Some(user);
    }

    /// Discard the credential, user, and expiry. Idempotent.
    pub fn clear_session(&mut self) {
        if self.credential.is_some() || self.user.is_some() {
            debug!("Session cleared");
        }
        self.credential = None;
        self.user = None;
    }

    /// True iff a credential and user are present and the token is unexpired.
    pub fn is_valid(&self) -> bool {
        let now = self.clock.now();
        self.user.is_some()
            && self
                .credential
                .as_ref()
                .map(|c| c.is_valid_at(now))
                .unwrap_or(false)
    }

    /// The bearer token, only while the session is valid.
    ///
    /// Does not clear expired state; the caller redirects to an
    /// unauthenticated destination when this returns None.
    pub fn valid_token(&self) -> Option<&str> {
        if self.is_valid() {
            self.credential.as_ref().map(|c| c.token.as_str())
        } else {
            None
        }
    }

    /// Seconds until expiry, clamped at zero.
    pub fn remaining_seconds(&self) -> i64 {
        self.credential
            .as_ref()
            .map(|c| (c.expires_at - self.clock.now()).num_seconds().max(0))
            .unwrap_or(0)
    }

    /// The last authenticated user, if any. Survives token expiry until
    /// `clear_session` runs.
    pub fn current_user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Compute the derived session state.
    pub fn state(&self) -> SessionState {
        match (&self.user, &self.credential) {
            (Some(user), Some(credential)) if self.is_valid() => SessionState::LoggedIn {
                user: user.clone(),
                credential: credential.clone(),
            },
            _ => SessionState::LoggedOut,
        }
    }

    /// Expiry instant of the current credential, valid or not.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.credential.as_ref().map(|c| c.expires_at)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
