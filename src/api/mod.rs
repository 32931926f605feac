//! REST API client module for the Huddle backend.
//!
//! This module provides the `ApiClient` for the auth endpoints
//! (`POST /api/user/login`, `POST /api/user/register`) and a bearer-auth
//! helper for later authenticated calls.
//!
//! The API uses JWT bearer token authentication; tokens are issued by the
//! login and register endpoints and tracked by `auth::SessionManager`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
