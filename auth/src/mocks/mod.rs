//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests.

pub mod identity;
pub mod session;

pub use identity::MockIdentityProvider;
pub use session::MockSessionStore;
