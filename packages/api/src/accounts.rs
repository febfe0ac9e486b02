//! # Account Manager — registration and login
//!
//! [`AccountManager`] creates and authenticates `users` rows on top of any
//! [`VaultStore`]. Passwords are stored only as Argon2id hashes (see
//! [`crate::auth::hash_password`]).
//!
//! Duplicate usernames and emails are rejected up front with
//! [`AccountError::Duplicate`]; the store's unique constraints catch the race
//! where two registrations for the same name arrive together, and that case is
//! reported the same way.
//!
//! Logins for unknown usernames still run one Argon2 verification, against a
//! throwaway hash, so the response time does not reveal which names exist.

use std::sync::Arc;

use store::{NewUser, StoreError, User, VaultStore};
use tokio::sync::OnceCell;

use crate::auth::{hash_password, verify_password};
use crate::error::AccountError;
use crate::qr::{discard_blocking, QrEncoder};

/// Hash checked when the username is unknown. `None` if hashing failed.
static DUMMY_HASH: OnceCell<Option<String>> = OnceCell::const_new();

pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;

pub struct AccountManager<S> {
    store: S,
    qr: Option<Arc<dyn QrEncoder>>,
}

impl<S: VaultStore> AccountManager<S> {
    pub fn new(store: S) -> Self {
        Self { store, qr: None }
    }

    /// Encoder whose images are removed when an account is deleted.
    pub fn with_qr_encoder(mut self, encoder: Arc<dyn QrEncoder>) -> Self {
        self.qr = Some(encoder);
        self
    }

    /// Register a new (non-admin) account.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        let user = self.create(username, email, password, false).await?;
        tracing::info!(user_id = user.id, username = %user.username, "registered account");
        Ok(user)
    }

    /// Return the account if `password` matches.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let Some(user) = self.store.find_user_by_username(username.trim()).await? else {
            tracing::warn!(username = %username.trim(), "login for unknown user");
            let dummy = DUMMY_HASH
                .get_or_init(|| async { hash_password("unknown-user").ok() })
                .await;
            if let Some(hash) = dummy {
                let _ = verify_password(password, hash);
            }
            return Err(AccountError::InvalidCredentials);
        };

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;
        if !valid {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_user(user_id).await?)
    }

    /// Create the admin account unless `username` is already taken, in which
    /// case the existing account is returned untouched.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        if let Some(existing) = self.store.find_user_by_username(username.trim()).await? {
            tracing::debug!(user_id = existing.id, "admin account already present");
            return Ok(existing);
        }

        let admin = self.create(username, email, password, true).await?;
        tracing::info!(user_id = admin.id, username = %admin.username, "created admin account");
        Ok(admin)
    }

    /// Delete an account together with all of its secrets and their QR
    /// images.
    pub async fn delete(&self, user_id: i64) -> Result<bool, AccountError> {
        let qr_paths: Vec<String> = match &self.qr {
            Some(_) => self
                .store
                .list_secrets(user_id)
                .await?
                .into_iter()
                .filter_map(|secret| secret.qr_path)
                .collect(),
            None => Vec::new(),
        };

        let deleted = self.store.delete_user(user_id).await?;
        if !deleted {
            return Ok(false);
        }

        if let Some(encoder) = &self.qr {
            for path in qr_paths {
                if let Err(e) = discard_blocking(encoder.clone(), path).await {
                    tracing::warn!(user_id, error = %e, "failed to remove QR image");
                }
            }
        }

        tracing::info!(user_id, "deleted account");
        Ok(true)
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AccountError> {
        let username = username.trim();
        let email = email.trim().to_lowercase();
        validate_registration(username, &email, password)?;

        if self.store.user_exists(username, &email).await? {
            return Err(AccountError::Duplicate);
        }

        let password_hash =
            hash_password(password).map_err(|e| AccountError::Hashing(e.to_string()))?;

        let new_user = NewUser {
            username: username.to_string(),
            email,
            password_hash,
            is_admin,
        };
        match self.store.insert_user(new_user).await {
            Ok(user) => Ok(user),
            Err(StoreError::Duplicate { .. }) => Err(AccountError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AccountError> {
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AccountError::Validation(
            "Username, email and password are required".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AccountError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AccountError::Validation(format!(
            "Email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    if !email.contains('@') {
        return Err(AccountError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}
