//! HTTP API layer for colloquy.
//!
//! JSON-over-POST endpoints for comment threads and reactions:
//!
//! - **Endpoints**: `/comments/*` and `/reactions/*`
//! - **Extractors**: optional caller identity
//! - **Middleware**: identity headers from the fronting identity provider
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// API router with identity resolution applied and state attached.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn(middleware::identity_middleware))
        .with_state(state)
}
