//! # Univent App
//!
//! Wires the Univent crates into a running client core: configuration,
//! the composition root and startup routing.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod startup;
pub mod state;

pub use config::Config;
pub use startup::{Route, finish_onboarding, initial_route};
pub use state::AppState;
