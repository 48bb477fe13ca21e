//! Request extractors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use colloquy_core::Actor;

/// Optional caller identity extractor.
///
/// Anonymous requests are passed through; the interaction service decides
/// which operations require an identity.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Actor>);

impl MaybeAuthUser {
    /// Borrow the actor, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by identity middleware
        Ok(Self(parts.extensions.get::<Actor>().cloned()))
    }
}
