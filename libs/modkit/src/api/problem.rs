use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::Violations;

/// Problem type for client errors (RFC 7231 §6.5.1, 400 Bad Request).
pub const CLIENT_ERROR_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.1";
/// Problem type for server errors (RFC 7231 §6.6.1, 500 Internal Server Error).
pub const SERVER_ERROR_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.6.1";

pub const VALIDATION_ERROR_TITLE: &str = "Validation Error";
pub const INTERNAL_ERROR_TITLE: &str = "Internal Server Error";
/// The only detail a caller ever sees for an unexpected failure.
pub const INTERNAL_ERROR_DETAIL: &str = "An error occurred while processing your request";

/// Error envelope written for every failed request.
///
/// Carries either `detail` (generic failures) or `errors` (validation failures), never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    title = "Problem",
    description = "Error envelope returned for failed requests"
)]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation of this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Validation messages grouped by field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<IndexMap<String, Vec<String>>>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            errors: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_errors(mut self, errors: IndexMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// 400 envelope listing every violation under its field.
    pub fn validation(violations: &Violations) -> Self {
        Problem::new(StatusCode::BAD_REQUEST, VALIDATION_ERROR_TITLE)
            .with_type(CLIENT_ERROR_TYPE)
            .with_errors(violations.by_field())
    }

    /// Generic 500 envelope. Never carries internal details.
    pub fn internal() -> Self {
        Problem::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_TITLE)
            .with_type(SERVER_ERROR_TYPE)
            .with_detail(INTERNAL_ERROR_DETAIL)
    }
}

/// Axum response wrapper that renders `Problem` with its status code.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = axum::Json(self.0).into_response();
        *resp.status_mut() = status;
        resp
    }
}

pub fn internal_error() -> ProblemResponse {
    Problem::internal().into()
}
