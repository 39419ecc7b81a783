use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use modkit::{Dispatcher, Problem};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::requests::{CreateUser, GetUserById, GetUsers};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::rest::handlers::list_users,
        crate::api::rest::handlers::get_user,
        crate::api::rest::handlers::create_user
    ),
    components(schemas(dto::UserDto, dto::UserListDto, dto::CreateUserReq, Problem)),
    tags((name = "Users", description = "User management"))
)]
pub struct UsersApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    UsersApiDoc::openapi()
}

pub fn register_routes(router: Router, dispatcher: Arc<Dispatcher>) -> anyhow::Result<Router> {
    // Every bound endpoint must have a handler behind it before we accept traffic.
    dispatcher.ensure_handler::<GetUsers>()?;
    dispatcher.ensure_handler::<GetUserById>()?;
    dispatcher.ensure_handler::<CreateUser>()?;

    let users = Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/{id}", get(handlers::get_user))
        .layer(Extension(dispatcher));

    Ok(router.merge(users))
}
