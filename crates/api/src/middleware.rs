//! API middleware.

use axum::{body::Body, http::HeaderMap, http::Request, middleware::Next, response::Response};
use colloquy_core::{Actor, InteractionService};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Header carrying the user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub interaction_service: InteractionService,
}

impl AppState {
    #[must_use]
    pub const fn new(interaction_service: InteractionService) -> Self {
        Self {
            interaction_service,
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Resolve the caller identity set by the upstream identity provider.
///
/// Requests without a usable `X-User-Id` continue anonymously.
#[must_use]
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let user_id = header(headers, USER_ID_HEADER)?;
    Some(Actor::new(
        user_id,
        header(headers, USER_NAME_HEADER).unwrap_or(user_id),
        header(headers, USER_ROLE_HEADER).unwrap_or_default(),
    ))
}

/// Identity middleware.
pub async fn identity_middleware(mut req: Request<Body>, next: Next) -> Response {
    if let Some(actor) = actor_from_headers(req.headers()) {
        tracing::trace!(user_id = %actor.user_id, role = %actor.role, "Resolved caller identity");
        req.extensions_mut().insert(actor);
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(actor_from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(actor_from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(
            actor_from_headers(&headers),
            Some(Actor::new("alice", "alice", ""))
        );

        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("Alice"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("Admin"));
        assert_eq!(
            actor_from_headers(&headers),
            Some(Actor::new("alice", "Alice", "Admin"))
        );
    }
}
