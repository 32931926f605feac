//! Authentication module for managing user sessions and identity.
//!
//! This module provides:
//! - `SessionManager`: in-memory token session with expiry tracking
//! - `IdentityProvider`: the platform identity capability boundary, with
//!   `CloudIdentity` (cloud-backed) and `NoopIdentity` (degraded) adapters
//! - `SecureStore`: token-at-rest storage via the OS keychain
//! - `AuthService`: login/register/logout flow against the Huddle API
//! - `Clock`: injectable time source so expiry is testable without delay
//!
//! Session state lives in process memory; the `AuthService` persists the
//! token through `SecureStore` so a restart can restore an unexpired session.

pub mod clock;
pub mod credentials;
pub mod identity;
pub mod service;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{KeyringStore, MemoryStore, SecureStore};
pub use identity::{AuthOutcome, CloudIdentity, IdentityProvider, NoopIdentity};
pub use service::{AuthApi, AuthService};
pub use session::{Credential, SessionManager, SessionState, DEFAULT_SESSION_TTL_SECS};
