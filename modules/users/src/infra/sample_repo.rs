//! Fixed in-memory user set standing in for a real store.

use async_trait::async_trait;
use uuid::{uuid, Uuid};

use crate::contract::model::User;
use crate::domain::repo::UsersRepository;

const JOHN_ID: Uuid = uuid!("550e8400-e29b-41d4-a716-446655440000");
const JANE_ID: Uuid = uuid!("6ba7b810-9dad-11d1-80b4-00c04fd430c8");
const BOB_ID: Uuid = uuid!("7c9e6679-7425-40de-944b-e07fc1f90ae7");

/// The sample users, in listing order.
pub fn sample_users() -> Vec<User> {
    vec![
        User::new(JOHN_ID, "John Doe", "john.doe@example.com"),
        User::new(JANE_ID, "Jane Smith", "jane.smith@example.com"),
        User::new(BOB_ID, "Bob Johnson", "bob.johnson@example.com"),
    ]
}

/// Read-only repository over [`sample_users`]. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct SampleUsersRepository {
    users: Vec<User>,
}

impl SampleUsersRepository {
    pub fn new() -> Self {
        Self {
            users: sample_users(),
        }
    }
}

impl Default for SampleUsersRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsersRepository for SampleUsersRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_each_sample_user() {
        let repo = SampleUsersRepository::new();
        for user in sample_users() {
            assert_eq!(repo.find_by_id(user.id).await.unwrap(), Some(user));
        }
    }

    #[tokio::test]
    async fn list_is_stable() {
        let repo = SampleUsersRepository::new();
        let first = repo.list().await.unwrap();
        let second = repo.list().await.unwrap();
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith", "Bob Johnson"]);
    }
}
