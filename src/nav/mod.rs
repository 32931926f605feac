//! Navigation module for the in-memory backstack.
//!
//! This module provides:
//! - `Destination`: the closed set of addressable screens
//! - `NavigationController`: push/pop/reset over the backstack, with the
//!   current destination derived from the top of the stack
//! - `NavSnapshot`: the atomically published backstack + current pair
//!
//! The controller checks session validity exactly once, at startup, to pick
//! the root destination. Session expiry mid-use does not auto-navigate.

pub mod controller;
pub mod destination;

pub use controller::{NavSnapshot, NavigationController};
pub use destination::Destination;
