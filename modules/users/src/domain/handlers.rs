//! One handler per request. Handlers only see requests that already passed validation.

use std::sync::Arc;

use async_trait::async_trait;
use modkit::{DispatchError, RequestHandler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::repo::UsersRepository;
use crate::domain::requests::{CreateUser, GetUserById, GetUsers};

fn checkpoint(cancel: &CancellationToken) -> Result<(), DispatchError> {
    if cancel.is_cancelled() {
        return Err(DispatchError::Cancelled);
    }
    Ok(())
}

/// Mints a new id and echoes the input. Nothing is stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateUserHandler;

#[async_trait]
impl RequestHandler<CreateUser> for CreateUserHandler {
    #[instrument(name = "users.handler.create_user", skip_all)]
    async fn handle(
        &self,
        request: CreateUser,
        cancel: &CancellationToken,
    ) -> Result<User, DispatchError> {
        checkpoint(cancel)?;
        let user = User::new(
            Uuid::new_v4(),
            request.name.unwrap_or_default(),
            request.email.unwrap_or_default(),
        );
        info!(user_id = %user.id, "user created");
        Ok(user)
    }
}

#[derive(Clone)]
pub struct GetUserByIdHandler {
    repo: Arc<dyn UsersRepository>,
}

impl GetUserByIdHandler {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RequestHandler<GetUserById> for GetUserByIdHandler {
    #[instrument(name = "users.handler.get_user_by_id", skip_all, fields(user_id = %request.id))]
    async fn handle(
        &self,
        request: GetUserById,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, DispatchError> {
        checkpoint(cancel)?;
        let user = self.repo.find_by_id(request.id).await?;
        debug!(found = user.is_some(), "user lookup finished");
        Ok(user)
    }
}

#[derive(Clone)]
pub struct GetUsersHandler {
    repo: Arc<dyn UsersRepository>,
}

impl GetUsersHandler {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RequestHandler<GetUsers> for GetUsersHandler {
    #[instrument(name = "users.handler.get_users", skip_all)]
    async fn handle(
        &self,
        _request: GetUsers,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>, DispatchError> {
        checkpoint(cancel)?;
        let users = self.repo.list().await?;
        debug!(count = users.len(), "listed users");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sample_repo::SampleUsersRepository;

    #[tokio::test]
    async fn create_user_mints_distinct_ids() {
        let cancel = CancellationToken::new();
        let req = CreateUser {
            name: Some("John".into()),
            email: Some("john@example.com".into()),
        };
        let a = CreateUserHandler.handle(req.clone(), &cancel).await.unwrap();
        let b = CreateUserHandler.handle(req, &cancel).await.unwrap();

        assert_eq!(a.name, "John");
        assert_eq!(a.email, "john@example.com");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.get_version_num(), 4);
    }

    #[tokio::test]
    async fn get_user_by_id_returns_none_when_absent() {
        let handler = GetUserByIdHandler::new(Arc::new(SampleUsersRepository::new()));
        let out = handler
            .handle(GetUserById { id: Uuid::nil() }, &CancellationToken::new())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn handlers_stop_at_cancellation_checkpoint() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let handler = GetUsersHandler::new(Arc::new(SampleUsersRepository::new()));
        let err = handler.handle(GetUsers, &cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }
}
