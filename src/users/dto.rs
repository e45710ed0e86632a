use serde::Serialize;

use crate::auth::repo_types::User;

/// Public profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}
