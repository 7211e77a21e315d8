//! Provider traits for external dependencies.
//!
//! Implementations of these traits live in [`crate::stores`] (durable
//! backends) and [`crate::mocks`] (in-memory test doubles).

pub mod identity;
pub mod session;

pub use identity::{IdentityProvider, SignUpRequest};
pub use session::SessionStore;
