//! # lumina-server
//!
//! HTTP entry point for Lumina: a single `{action, payload}` RPC endpoint
//! over the orchestration core, with bearer-token auth resolution, a
//! per-client request throttle, and permissive CORS for the web client.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod throttle;

pub use auth::{HttpAuthProvider, NullAuthProvider};
pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{create_router, AppState};
pub use throttle::{RequestThrottle, ThrottleWindow};
