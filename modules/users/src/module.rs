use std::sync::Arc;

use axum::Router;
use modkit::{DispatcherBuilder, RegistryError};
use tracing::info;

use crate::domain::handlers::{CreateUserHandler, GetUserByIdHandler, GetUsersHandler};
use crate::domain::repo::UsersRepository;
use crate::domain::requests::{CreateUser, GetUserById, GetUsers};
use crate::domain::validators::CreateUserValidator;
use crate::infra::sample_repo::SampleUsersRepository;

/// Register every users request with its handler and validators.
pub fn register_requests(
    builder: DispatcherBuilder,
    repo: Arc<dyn UsersRepository>,
) -> Result<DispatcherBuilder, RegistryError> {
    let builder = builder
        .handler::<CreateUser, _>(CreateUserHandler)?
        .validator::<CreateUser, _>(CreateUserValidator)
        .handler::<GetUserById, _>(GetUserByIdHandler::new(repo.clone()))?
        .handler::<GetUsers, _>(GetUsersHandler::new(repo))?;
    Ok(builder)
}

/// The users feature: request registrations plus REST bindings.
#[derive(Clone)]
pub struct UsersModule {
    repo: Arc<dyn UsersRepository>,
}

impl Default for UsersModule {
    fn default() -> Self {
        Self::new(Arc::new(SampleUsersRepository::new()))
    }
}

impl UsersModule {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    pub fn register_requests(
        &self,
        builder: DispatcherBuilder,
    ) -> Result<DispatcherBuilder, RegistryError> {
        info!("registering users requests");
        register_requests(builder, self.repo.clone())
    }

    /// Mount the REST endpoints. Fails if the dispatcher lacks a handler they rely on.
    pub fn register_rest(
        &self,
        router: Router,
        dispatcher: Arc<modkit::Dispatcher>,
    ) -> anyhow::Result<Router> {
        crate::api::rest::routes::register_routes(router, dispatcher)
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        crate::api::rest::routes::openapi()
    }
}
