use std::future::Future;

use crate::error::StoreError;
use crate::models::{NewSecret, NewUser, Secret, User};

/// Persistence backend for accounts and secrets.
///
/// Backends enforce the uniqueness of `username`, `email` and `unique_id`
/// (reported as [`StoreError::Duplicate`]), and deleting a user removes the
/// secrets it owns.
pub trait VaultStore: Send + Sync {
    fn insert_user(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;
    fn find_user(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
    fn find_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
    /// Whether any account already uses `username` or `email`.
    fn user_exists(
        &self,
        username: &str,
        email: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
    /// Delete a user and every secret it owns. Returns false if no such user.
    fn delete_user(&self, id: i64) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn insert_secret(
        &self,
        secret: NewSecret,
    ) -> impl Future<Output = Result<Secret, StoreError>> + Send;
    fn find_secret(
        &self,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Secret>, StoreError>> + Send;
    /// Secrets owned by `user_id`, newest first.
    fn list_secrets(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Secret>, StoreError>> + Send;
    /// Atomically add one to `view_count` and return the new value.
    fn increment_view_count(
        &self,
        unique_id: &str,
    ) -> impl Future<Output = Result<i32, StoreError>> + Send;
    fn set_qr_path(
        &self,
        unique_id: &str,
        qr_path: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Delete a secret only if `user_id` owns it. Returns the deleted row.
    fn delete_secret(
        &self,
        user_id: i64,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Secret>, StoreError>> + Send;
}
