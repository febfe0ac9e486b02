//! User-facing failures of the account and secret operations.
//!
//! Every variant is recoverable: the web layer reports the `Display` text back
//! to the caller and maps the variant to an HTTP status.

use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username or email already exists")]
    Duplicate,

    /// Unknown username and wrong password are deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Secret not found")]
    NotFound,

    #[error("This secret has expired")]
    Expired,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Not logged in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Could not allocate a unique secret identifier")]
    IdSpaceExhausted,

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
