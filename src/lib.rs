//! Huddle core - the client-side session & navigation control core.
//!
//! This crate backs the Huddle mobile/desktop clients. It owns the pieces
//! with real state in them and leaves rendering to the platform shells:
//!
//! - `auth`: session lifecycle (`SessionManager`), the platform identity
//!   provider boundary (`IdentityProvider` and its adapters), secure
//!   credential storage, and the `AuthService` login/logout flow
//! - `nav`: the navigation backstack state machine (`NavigationController`)
//! - `api`: the auth API client for the Huddle backend
//! - `models`: user and auth payload types
//! - `config`: base URL and app configuration
//!
//! The crate assumes a single-threaded cooperative UI event loop. Session
//! and navigation state are mutated through `&mut self`; a multi-threaded
//! host must wrap them in its own mutual-exclusion boundary.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod nav;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthOutcome, AuthService, Clock, IdentityProvider, SecureStore, SessionManager, SessionState,
    SystemClock,
};
pub use config::Config;
pub use models::UserRecord;
pub use nav::{Destination, NavSnapshot, NavigationController};
