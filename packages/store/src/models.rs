//! # Domain records for accounts and secrets
//!
//! Defines the rows kept by a [`crate::VaultStore`] and the projections that are
//! safe to hand to a renderer or serialise as JSON.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`User`] | A full row of the `users` table, password hash included. Never serialised. |
//! | [`UserInfo`] | The client-safe projection of a user (no hash). |
//! | [`NewUser`] | The insert payload for a user; the store assigns `id` and `created_at`. |
//! | [`Secret`] | A full row of the `secrets` table: plaintext content, access hash, expiry and counters. |
//! | [`NewSecret`] | The insert payload for a secret; the caller chooses `created_at` so expiry is computed against the same clock. |
//! | [`SecretSummary`] | Metadata shown before the password is entered (no content, no hash). |
//! | [`SecretContent`] | The summary plus the plaintext, returned after a successful password check. |
//!
//! A [`Secret`] is expired once `expires_at` lies strictly in the past; a secret
//! without `expires_at` never expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every public secret identifier starts with this prefix.
pub const UNIQUE_ID_PREFIX: &str = "sec_";

/// Full user record.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            is_admin: self.is_admin,
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Full secret record.
#[derive(Debug, Clone, PartialEq)]
pub struct Secret {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub password_hash: String,
    pub blur_level: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i32,
    pub unique_id: String,
    pub qr_path: Option<String>,
}

impl Secret {
    /// Whether the secret has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    pub fn to_summary(&self) -> SecretSummary {
        SecretSummary {
            id: self.id,
            title: self.title.clone(),
            blur_level: self.blur_level,
            created_at: self.created_at,
            expires_at: self.expires_at,
            view_count: self.view_count,
            unique_id: self.unique_id.clone(),
            qr_path: self.qr_path.clone(),
        }
    }

    pub fn to_content(&self) -> SecretContent {
        SecretContent {
            summary: self.to_summary(),
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSecret {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub password_hash: String,
    pub blur_level: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub unique_id: String,
}

/// Secret metadata, safe to show without the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretSummary {
    pub id: i64,
    pub title: String,
    pub blur_level: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i32,
    pub unique_id: String,
    pub qr_path: Option<String>,
}

/// An unlocked secret: metadata plus plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretContent {
    #[serde(flatten)]
    pub summary: SecretSummary,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn secret(expires_at: Option<DateTime<Utc>>) -> Secret {
        Secret {
            id: 1,
            user_id: 1,
            title: "wifi".to_string(),
            content: "hunter2".to_string(),
            password_hash: "hash".to_string(),
            blur_level: 10,
            created_at: Utc::now(),
            expires_at,
            view_count: 0,
            unique_id: "sec_abcdefghij".to_string(),
            qr_path: None,
        }
    }

    #[test]
    fn test_secret_without_expiry_never_expires() {
        let s = secret(None);
        assert!(!s.is_expired_at(Utc::now() + Duration::days(365 * 100)));
    }

    #[test]
    fn test_secret_expires_strictly_after_deadline() {
        let deadline = Utc::now() + Duration::hours(1);
        let s = secret(Some(deadline));
        assert!(!s.is_expired_at(deadline));
        assert!(s.is_expired_at(deadline + Duration::seconds(1)));
    }

    #[test]
    fn test_summary_omits_content() {
        let summary = format!("{:?}", secret(None).to_summary());
        assert!(!summary.contains("hunter2"));
        assert!(!summary.contains("hash"));
    }

    #[test]
    fn test_user_info_omits_password_hash() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            is_admin: false,
        };
        let info = user.to_info();
        assert_eq!(info.id, 7);
        assert_eq!(info.username, "alice");
        assert!(!format!("{info:?}").contains("argon2id"));
    }
}
