use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

/// 200 OK + JSON
pub fn ok_json<T: serde::Serialize>(value: T) -> impl IntoResponse {
    (StatusCode::OK, Json(value))
}

/// 201 Created + `Location` + JSON
pub fn created_json<T: serde::Serialize>(location: String, value: T) -> impl IntoResponse {
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(value))
}

/// 404 Not Found with an empty body
pub fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
