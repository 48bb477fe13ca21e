//! API endpoints.

mod comments;
mod reactions;

use axum::Router;

use crate::middleware::AppState;

pub use comments::CommentResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/comments", comments::router())
        .nest("/reactions", reactions::router())
}
