//! # Univent Authentication
//!
//! Account and session management for the Univent client core.
//!
//! ## Components
//!
//! - [`SessionStore`]: persisted `{user, token}` pair and the onboarding flag
//! - [`IdentityProvider`]: the remote identity service boundary
//! - [`AuthGateway`]: owns the session context for the running app
//!
//! ## Example
//!
//! ```rust,ignore
//! use univent_auth::{AuthGateway, FileSessionStore};
//!
//! let gateway = AuthGateway::new(FileSessionStore::new(data_dir), provider);
//!
//! // Hydrate the context from disk at startup
//! if gateway.restore().await.is_none() {
//!     gateway.login("alex@university.edu", "secret1").await?;
//! }
//!
//! let session = gateway.current_session().await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod gateway;
pub mod providers;
pub mod stores;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use gateway::AuthGateway;
pub use providers::{IdentityProvider, SessionStore, SignUpRequest};
pub use stores::FileSessionStore;
