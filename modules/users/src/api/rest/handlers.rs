use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::Uri,
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::api::{map_dispatch_error, map_json_rejection, response};
use modkit::{Dispatcher, Problem, ProblemResponse, RequestCancellation};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::rest::dto::{CreateUserReq, UserDto, UserListDto};
use crate::domain::requests::{CreateUser, GetUserById, GetUsers};

/// Get all users
///
/// Retrieves a list of all users
#[utoipa::path(
    get,
    path = "/api/users",
    operation_id = "GetUsers",
    tag = "Users",
    responses(
        (status = 200, description = "List of users", body = UserListDto),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn list_users(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    cancel: RequestCancellation,
    uri: Uri,
) -> Result<Json<UserListDto>, ProblemResponse> {
    info!("Listing users");

    let users = dispatcher
        .send(GetUsers, cancel.token())
        .await
        .map_err(|e| map_dispatch_error(e, uri.path()))?;
    Ok(Json(UserListDto::from(users)))
}

/// Get user by ID
///
/// Retrieves a specific user by their ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    operation_id = "GetUserById",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn get_user(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Path(raw_id): Path<String>,
    cancel: RequestCancellation,
    uri: Uri,
) -> Result<Response, ProblemResponse> {
    // Only UUID-shaped ids match this route; anything else is treated as an unknown resource.
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        debug!(id = %raw_id, "id is not a UUID");
        return Ok(response::not_found().into_response());
    };
    info!("Getting user with id: {}", id);

    let user = dispatcher
        .send(GetUserById { id }, cancel.token())
        .await
        .map_err(|e| map_dispatch_error(e, uri.path()))?;

    Ok(match user {
        Some(user) => response::ok_json(UserDto::from(user)).into_response(),
        None => response::not_found().into_response(),
    })
}

/// Create a new user
///
/// Creates a new user with the provided information
#[utoipa::path(
    post,
    path = "/api/users",
    operation_id = "CreateUser",
    tag = "Users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Validation Error", body = Problem),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn create_user(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    cancel: RequestCancellation,
    uri: Uri,
    payload: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<Response, ProblemResponse> {
    let Json(req_body) = payload.map_err(map_json_rejection)?;
    info!("Creating user");

    let user = dispatcher
        .send(CreateUser::from(req_body), cancel.token())
        .await
        .map_err(|e| map_dispatch_error(e, uri.path()))?;

    let location = format!("/api/users/{}", user.id);
    Ok(response::created_json(location, UserDto::from(user)).into_response())
}
