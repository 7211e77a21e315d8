//! Durable store implementations.

pub mod file;

pub use file::FileSessionStore;
