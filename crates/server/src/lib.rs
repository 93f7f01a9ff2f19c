//! HTTP API server for Folio portfolio collections.
//!
//! This crate provides the HTTP surface:
//! - JWT bearer authentication (owner = `sub` claim)
//! - Ordered collection CRUD and reorder endpoints
//! - Collection metadata and profile endpoints
//! - Error-to-status mapping and request tracing

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, TokenVerifier, TraceId, issue_token};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
