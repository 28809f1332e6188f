//! Folio Backend Library
//!
//! Exposes the HTTP API, the auth gates and the storage/payment
//! collaborators for use by the binary and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod payments;
pub mod store;

pub use api::{create_router, AppState};
pub use config::Config;
