//! # Secret Vault — password-gated secrets with optional expiry
//!
//! [`SecretVault`] owns the lifecycle of a secret:
//!
//! | Operation | Behaviour |
//! |-----------|-----------|
//! | [`create`](SecretVault::create) | Validates input, hashes the access password, picks a fresh `sec_` identifier (regenerating on collision), computes `expires_at = now + ttl_hours` when `ttl_hours > 0`, and returns the share URL. With a [`QrEncoder`] attached the URL is also rendered to an image. |
//! | [`view`](SecretVault::view) | Missing → [`VaultError::NotFound`]; past `expires_at` → [`VaultError::Expired`] whatever the password; no password → metadata only; right password → view count incremented and content returned; wrong password → [`VaultError::WrongPassword`], count untouched. |
//! | [`list`](SecretVault::list) | The owner's secrets as summaries, newest first. |
//! | [`delete`](SecretVault::delete) | Owner-only manual deletion; the QR image is discarded too. |
//!
//! The clock and the identifier generator are plain function pointers so tests
//! can move time forward or force collisions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use store::{NewSecret, SecretContent, SecretSummary, StoreError, VaultStore};

use crate::auth::{hash_password, verify_password, SessionContext};
use crate::error::VaultError;
use crate::ids::{generate_unique_id, is_valid_unique_id};
use crate::qr::{discard_blocking, encode_blocking, qr_file_name, ErrorCorrection, QrEncoder};

pub const DEFAULT_BLUR_LEVEL: i32 = 10;
pub const MAX_TITLE_LEN: usize = 100;
/// Identifier draws before giving up on a collision streak.
const MAX_ID_ATTEMPTS: usize = 5;

/// Input for [`SecretVault::create`].
#[derive(Debug, Clone)]
pub struct CreateSecret {
    pub title: String,
    pub content: String,
    pub password: String,
    pub blur_level: i32,
    /// Hours until expiry; zero or negative means never.
    pub ttl_hours: i64,
}

/// Result of [`SecretVault::create`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatedSecret {
    pub unique_id: String,
    pub share_url: String,
    pub qr_path: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What a viewer gets back from [`SecretVault::view`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SecretView {
    /// No password supplied yet.
    Locked(SecretSummary),
    /// Password accepted; `view_count` already includes this view.
    Unlocked(SecretContent),
}

pub struct SecretVault<S> {
    store: S,
    public_url: String,
    qr: Option<Arc<dyn QrEncoder>>,
    clock: fn() -> DateTime<Utc>,
    generate_id: fn() -> String,
}

impl<S: VaultStore> SecretVault<S> {
    /// `public_url` is the externally visible origin used in share links,
    /// e.g. `https://share.example.com`.
    pub fn new(store: S, public_url: impl Into<String>) -> Self {
        Self {
            store,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            qr: None,
            clock: Utc::now,
            generate_id: generate_unique_id,
        }
    }

    pub fn with_qr_encoder(mut self, encoder: Arc<dyn QrEncoder>) -> Self {
        self.qr = Some(encoder);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, generate_id: fn() -> String) -> Self {
        self.generate_id = generate_id;
        self
    }

    /// The link a secret is shared under.
    pub fn share_url(&self, unique_id: &str) -> String {
        format!("{}/view/{}", self.public_url, unique_id)
    }

    pub async fn create(
        &self,
        owner: &SessionContext,
        request: CreateSecret,
    ) -> Result<CreatedSecret, VaultError> {
        let user_id = owner.user_id().ok_or(VaultError::Unauthenticated)?;
        validate_secret(&request)?;

        let password_hash =
            hash_password(&request.password).map_err(|e| VaultError::Hashing(e.to_string()))?;
        let created_at = (self.clock)();
        let expires_at = expiry(created_at, request.ttl_hours)?;

        let mut attempts = 0;
        let secret = loop {
            attempts += 1;
            let new_secret = NewSecret {
                user_id,
                title: request.title.trim().to_string(),
                content: request.content.clone(),
                password_hash: password_hash.clone(),
                blur_level: request.blur_level,
                created_at,
                expires_at,
                unique_id: (self.generate_id)(),
            };
            match self.store.insert_secret(new_secret).await {
                Ok(secret) => break secret,
                Err(StoreError::Duplicate { field: "unique_id" }) if attempts < MAX_ID_ATTEMPTS => {
                    tracing::debug!(attempts, "secret identifier collision, drawing again");
                }
                Err(StoreError::Duplicate { field: "unique_id" }) => {
                    return Err(VaultError::IdSpaceExhausted)
                }
                Err(e) => return Err(e.into()),
            }
        };

        let share_url = self.share_url(&secret.unique_id);
        let qr_path = match &self.qr {
            Some(encoder) => self.attach_qr(encoder.clone(), &secret.unique_id, &share_url).await,
            None => None,
        };

        tracing::info!(
            user_id,
            unique_id = %secret.unique_id,
            expires_at = ?secret.expires_at,
            "created secret"
        );

        Ok(CreatedSecret {
            unique_id: secret.unique_id,
            share_url,
            qr_path,
            expires_at: secret.expires_at,
        })
    }

    pub async fn view(
        &self,
        unique_id: &str,
        password: Option<&str>,
    ) -> Result<SecretView, VaultError> {
        if !is_valid_unique_id(unique_id) {
            return Err(VaultError::NotFound);
        }
        let secret = self
            .store
            .find_secret(unique_id)
            .await?
            .ok_or(VaultError::NotFound)?;

        if secret.is_expired_at((self.clock)()) {
            return Err(VaultError::Expired);
        }

        let Some(password) = password else {
            return Ok(SecretView::Locked(secret.to_summary()));
        };

        let valid = verify_password(password, &secret.password_hash)
            .map_err(|e| VaultError::Hashing(e.to_string()))?;
        if !valid {
            tracing::warn!(unique_id, "wrong password for secret");
            return Err(VaultError::WrongPassword);
        }

        let view_count = match self.store.increment_view_count(unique_id).await {
            Ok(count) => count,
            // Deleted between lookup and increment.
            Err(StoreError::NotFound) => return Err(VaultError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let mut content = secret.to_content();
        content.summary.view_count = view_count;
        Ok(SecretView::Unlocked(content))
    }

    pub async fn list(&self, owner: &SessionContext) -> Result<Vec<SecretSummary>, VaultError> {
        let user_id = owner.user_id().ok_or(VaultError::Unauthenticated)?;
        let secrets = self.store.list_secrets(user_id).await?;
        Ok(secrets.iter().map(|s| s.to_summary()).collect())
    }

    pub async fn delete(&self, owner: &SessionContext, unique_id: &str) -> Result<(), VaultError> {
        let user_id = owner.user_id().ok_or(VaultError::Unauthenticated)?;
        let secret = self
            .store
            .delete_secret(user_id, unique_id)
            .await?
            .ok_or(VaultError::NotFound)?;

        if let (Some(encoder), Some(path)) = (&self.qr, secret.qr_path) {
            if let Err(e) = discard_blocking(encoder.clone(), path).await {
                tracing::warn!(unique_id, error = %e, "failed to remove QR image");
            }
        }

        tracing::info!(user_id, unique_id, "deleted secret");
        Ok(())
    }

    /// Render the share link and record its path. Failures leave the secret
    /// without a QR image; the link itself still works.
    async fn attach_qr(
        &self,
        encoder: Arc<dyn QrEncoder>,
        unique_id: &str,
        share_url: &str,
    ) -> Option<String> {
        let encoded = encode_blocking(
            encoder,
            share_url.to_string(),
            ErrorCorrection::Low,
            qr_file_name(unique_id),
        )
        .await;
        let path = match encoded {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(unique_id, error = %e, "failed to render QR code");
                return None;
            }
        };

        match self.store.set_qr_path(unique_id, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(unique_id, error = %e, "failed to record QR path");
                None
            }
        }
    }
}

fn validate_secret(request: &CreateSecret) -> Result<(), VaultError> {
    if request.title.trim().is_empty() || request.content.is_empty() || request.password.is_empty()
    {
        return Err(VaultError::Validation("All fields are required".to_string()));
    }
    if request.title.trim().chars().count() > MAX_TITLE_LEN {
        return Err(VaultError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if request.blur_level < 0 {
        return Err(VaultError::Validation(
            "Blur level must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn expiry(created_at: DateTime<Utc>, ttl_hours: i64) -> Result<Option<DateTime<Utc>>, VaultError> {
    if ttl_hours <= 0 {
        return Ok(None);
    }
    Duration::try_hours(ttl_hours)
        .and_then(|ttl| created_at.checked_add_signed(ttl))
        .map(Some)
        .ok_or_else(|| VaultError::Validation("Expiration is too far in the future".to_string()))
}
