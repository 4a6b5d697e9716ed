//! HTTP request handlers for the Axum web server.
//!
//! Handlers are thin wrappers that delegate to `LifecycleManager`.

pub mod artifacts;
pub mod downloads;
pub mod runs;
