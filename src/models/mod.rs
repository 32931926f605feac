//! Data models for Huddle auth payloads.
//!
//! This module contains the wire and domain types shared between the
//! API client, the session manager, and the identity provider boundary:
//!
//! - `UserRecord`: the authenticated user as the client knows it
//! - `LoginRequest`, `RegisterRequest`: request bodies for `/api/user/*`
//! - `AuthResponse`: the `{token, user, expiresIn?}` success payload

pub mod user;

pub use user::{AuthResponse, LoginRequest, RegisterRequest, UserRecord};
