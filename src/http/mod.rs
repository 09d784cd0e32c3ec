//! HTTP Module
//!
//! Thin JSON adapter over the [`Engine`].
//!
//! ## Routes
//! ```text
//! GET    /get?key=K        → 200 {"key","value"} | 400 | 404
//! POST   /set  {key,value} → 200 {"key","value"} | 400
//! DELETE /delete?key=K     → 200 {"key"}         | 400
//! GET    /health           → 200 {"status","keys"} | 503
//! ```
//!
//! Engine errors map to status codes in [`ApiError`]: invalid input is 400,
//! a closed store is 503, anything else is 500.

mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::engine::Engine;

pub use error::ApiError;
pub use handlers::{KeyQuery, SetPayload};

/// Build the router for a shared engine
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/get", get(handlers::get_value))
        .route("/set", post(handlers::set_value))
        .route("/delete", delete(handlers::delete_value))
        .route("/health", get(handlers::health))
        .with_state(engine)
}
