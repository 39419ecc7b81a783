//! Per-request cancellation.
//!
//! [`RequestCancellation`] hands a handler a token that is cancelled when the request future
//! is dropped (client disconnect, timeout) or when the server-wide token stored in the
//! request extensions is cancelled (shutdown).

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio_util::sync::{CancellationToken, DropGuard};

pub struct RequestCancellation {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestCancellation {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<CancellationToken>()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let guard = token.clone().drop_guard();
        Ok(Self {
            token,
            _guard: guard,
        })
    }
}
