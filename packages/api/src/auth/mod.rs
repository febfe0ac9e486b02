//! Password hashing and the per-request session context.

mod password;
mod session;

pub use password::{hash_password, verify_password};
pub use session::{SessionContext, SESSION_USERNAME_KEY, SESSION_USER_ID_KEY};
