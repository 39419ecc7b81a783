use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::requests::CreateUser;

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// REST DTO for creating a new user.
///
/// Missing and null fields both deserialize as `None` and are then rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// REST DTO for user list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListDto {
    pub users: Vec<UserDto>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<CreateUserReq> for CreateUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
        }
    }
}

impl From<Vec<User>> for UserListDto {
    fn from(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(UserDto::from).collect(),
        }
    }
}
