//! Commands and queries of the users feature.

use modkit::Request;
use uuid::Uuid;

use crate::contract::model::User;

/// Create a user from a name and an email address.
///
/// `None` marks a field that was absent (or null) in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Request for CreateUser {
    type Response = User;
}

/// Look up a single user. `None` means no such user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserById {
    pub id: Uuid,
}

impl Request for GetUserById {
    type Response = Option<User>;
}

/// List every user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetUsers;

impl Request for GetUsers {
    type Response = Vec<User>;
}
