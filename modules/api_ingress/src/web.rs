use std::sync::Arc;

use axum::{
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Serves a document rendered once at startup.
pub fn openapi_json(
    document: Arc<Value>,
) -> impl Fn() -> std::future::Ready<Response> + Clone + Send + Sync + 'static {
    move || {
        let body = Json((*document).clone());
        std::future::ready(([(header::CACHE_CONTROL, "no-store")], body).into_response())
    }
}
