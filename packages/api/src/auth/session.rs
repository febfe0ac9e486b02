//! Request-scoped session context.

use serde::{Deserialize, Serialize};
use store::User;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";
/// Key for storing the username in session.
pub const SESSION_USERNAME_KEY: &str = "username";

/// Who is making the current request. Built per request from the cookie
/// session and handed to every operation that needs an owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            username: Some(user.username.clone()),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}
