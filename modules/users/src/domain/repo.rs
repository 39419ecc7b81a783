use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::User;

/// Port for the domain layer: the read capabilities handlers need from a user store.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// All users, in a stable order.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
}
