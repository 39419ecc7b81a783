//! Centralized failure translation.
//!
//! Every failure that escapes request handling ends up here and is turned into a
//! [`Problem`] envelope. This is the only place where failure status codes are chosen:
//! - validation failures become a 400 with per-field messages;
//! - timeouts and oversized bodies keep their 4xx status as a plain client-error envelope;
//! - anything else is logged in full and becomes a generic 500 with no internal detail.

use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::problem::{internal_error, Problem, ProblemResponse, CLIENT_ERROR_TYPE};
use crate::dispatch::DispatchError;

/// Map a dispatch failure to its envelope.
pub fn map_dispatch_error(error: DispatchError, instance: &str) -> ProblemResponse {
    match error {
        DispatchError::Validation(violations) => {
            tracing::debug!(instance, %violations, "request failed validation");
            Problem::validation(&violations).into()
        }
        DispatchError::Cancelled => {
            tracing::warn!(instance, "request cancelled before completion");
            internal_error()
        }
        other => {
            tracing::error!(instance, error = ?other, "An unhandled error occurred");
            internal_error()
        }
    }
}

impl From<DispatchError> for ProblemResponse {
    fn from(error: DispatchError) -> Self {
        map_dispatch_error(error, "")
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        ProblemResponse::from(self).into_response()
    }
}

/// Map a body that could not be read as JSON. The rejection text describes the caller's
/// input only, so it is safe to return.
pub fn map_json_rejection(rejection: JsonRejection) -> ProblemResponse {
    let status = rejection.status();
    tracing::debug!(status = status.as_u16(), error = %rejection, "rejected request body");
    Problem::new(status, status.canonical_reason().unwrap_or("Bad Request"))
        .with_type(CLIENT_ERROR_TYPE)
        .with_detail(rejection.body_text())
        .into()
}

/// Map a status produced by transport middleware rather than by a handler.
pub fn map_transport_status(status: StatusCode) -> ProblemResponse {
    if !status.is_client_error() {
        tracing::error!(status = status.as_u16(), "An unhandled error occurred");
        return internal_error();
    }
    tracing::debug!(status = status.as_u16(), "request rejected before completion");
    Problem::new(status, status.canonical_reason().unwrap_or("Bad Request"))
        .with_type(CLIENT_ERROR_TYPE)
        .into()
}

fn is_json(resp: &Response) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"))
}

/// Middleware for `axum::middleware::from_fn`: rewrites the bare 408 and 413 responses of
/// the timeout and body-limit layers into envelopes. Responses that already carry JSON
/// pass through untouched.
pub async fn translate_transport_errors(req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    match resp.status() {
        status @ (StatusCode::REQUEST_TIMEOUT | StatusCode::PAYLOAD_TOO_LARGE)
            if !is_json(&resp) =>
        {
            map_transport_status(status).into_response()
        }
        _ => resp,
    }
}

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %message, "An unhandled error occurred");
    internal_error().into_response()
}
