use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::error::StoreError;
use crate::models::{NewSecret, NewUser, Secret, User};
use crate::repo::VaultStore;

/// In-memory VaultStore for testing and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    secrets: Vec<Secret>,
    next_user_id: i64,
    next_secret_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl VaultStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
            is_admin: user.is_admin,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        // Cascade, like the ON DELETE CASCADE foreign key.
        tables.secrets.retain(|s| s.user_id != id);
        Ok(true)
    }

    async fn insert_secret(&self, secret: NewSecret) -> Result<Secret, StoreError> {
        let mut tables = self.tables()?;
        if !tables.users.iter().any(|u| u.id == secret.user_id) {
            return Err(StoreError::Constraint(format!(
                "user {} does not exist",
                secret.user_id
            )));
        }
        if secret
            .expires_at
            .is_some_and(|expires_at| expires_at <= secret.created_at)
        {
            return Err(StoreError::Constraint(
                "expires_at must be after created_at".to_string(),
            ));
        }
        if tables.secrets.iter().any(|s| s.unique_id == secret.unique_id) {
            return Err(StoreError::Duplicate { field: "unique_id" });
        }

        tables.next_secret_id += 1;
        let secret = Secret {
            id: tables.next_secret_id,
            user_id: secret.user_id,
            title: secret.title,
            content: secret.content,
            password_hash: secret.password_hash,
            blur_level: secret.blur_level,
            created_at: secret.created_at,
            expires_at: secret.expires_at,
            view_count: 0,
            unique_id: secret.unique_id,
            qr_path: None,
        };
        tables.secrets.push(secret.clone());
        Ok(secret)
    }

    async fn find_secret(&self, unique_id: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self
            .tables()?
            .secrets
            .iter()
            .find(|s| s.unique_id == unique_id)
            .cloned())
    }

    async fn list_secrets(&self, user_id: i64) -> Result<Vec<Secret>, StoreError> {
        let mut secrets: Vec<Secret> = self
            .tables()?
            .secrets
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        secrets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(secrets)
    }

    async fn increment_view_count(&self, unique_id: &str) -> Result<i32, StoreError> {
        let mut tables = self.tables()?;
        let secret = tables
            .secrets
            .iter_mut()
            .find(|s| s.unique_id == unique_id)
            .ok_or(StoreError::NotFound)?;
        secret.view_count += 1;
        Ok(secret.view_count)
    }

    async fn set_qr_path(&self, unique_id: &str, qr_path: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let secret = tables
            .secrets
            .iter_mut()
            .find(|s| s.unique_id == unique_id)
            .ok_or(StoreError::NotFound)?;
        secret.qr_path = Some(qr_path.to_string());
        Ok(())
    }

    async fn delete_secret(
        &self,
        user_id: i64,
        unique_id: &str,
    ) -> Result<Option<Secret>, StoreError> {
        let mut tables = self.tables()?;
        let position = tables
            .secrets
            .iter()
            .position(|s| s.unique_id == unique_id && s.user_id == user_id);
        Ok(position.map(|i| tables.secrets.remove(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        }
    }

    fn new_secret(user_id: i64, unique_id: &str, created_at: DateTime<Utc>) -> NewSecret {
        NewSecret {
            user_id,
            title: "Router".to_string(),
            content: "admin / admin".to_string(),
            password_hash: "hash".to_string(),
            blur_level: 10,
            created_at,
            expires_at: None,
            unique_id: unique_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = MemoryStore::new();

        let alice = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(alice.id, 1);
        assert!(!alice.is_admin);

        let found = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, alice);
        assert_eq!(store.find_user(alice.id).await.unwrap(), Some(alice));
        assert!(store.find_user(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let store = MemoryStore::new();
        store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = store
            .insert_user(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate { field: "username" });

        let err = store
            .insert_user(new_user("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate { field: "email" });

        assert!(store.user_exists("alice", "x@example.com").await.unwrap());
        assert!(store.user_exists("x", "alice@example.com").await.unwrap());
        assert!(!store.user_exists("bob", "bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_unique_id_rejected() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        store
            .insert_secret(new_secret(user.id, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap();
        let err = store
            .insert_secret(new_secret(user.id, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate { field: "unique_id" });
    }

    #[tokio::test]
    async fn test_secret_requires_existing_owner_and_valid_expiry() {
        let store = MemoryStore::new();
        let err = store
            .insert_secret(new_secret(42, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let user = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let now = Utc::now();
        let mut secret = new_secret(user.id, "sec_AAAAAAAAAA", now);
        secret.expires_at = Some(now);
        let err = store.insert_secret(secret).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        store
            .insert_secret(new_secret(user.id, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap();

        assert_eq!(store.increment_view_count("sec_AAAAAAAAAA").await.unwrap(), 1);
        assert_eq!(store.increment_view_count("sec_AAAAAAAAAA").await.unwrap(), 2);
        assert_eq!(
            store.increment_view_count("sec_missing000").await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_secrets_newest_first() {
        let store = MemoryStore::new();
        let alice = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = store
            .insert_user(new_user("bob", "bob@example.com"))
            .await
            .unwrap();
        let now = Utc::now();

        store
            .insert_secret(new_secret(alice.id, "sec_old0000000", now - Duration::hours(2)))
            .await
            .unwrap();
        store
            .insert_secret(new_secret(alice.id, "sec_new0000000", now))
            .await
            .unwrap();
        store
            .insert_secret(new_secret(bob.id, "sec_bob0000000", now))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_secrets(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.unique_id)
            .collect();
        assert_eq!(ids, vec!["sec_new0000000", "sec_old0000000"]);
    }

    #[tokio::test]
    async fn test_delete_secret_only_by_owner() {
        let store = MemoryStore::new();
        let alice = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = store
            .insert_user(new_user("bob", "bob@example.com"))
            .await
            .unwrap();
        store
            .insert_secret(new_secret(alice.id, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap();

        assert!(store
            .delete_secret(bob.id, "sec_AAAAAAAAAA")
            .await
            .unwrap()
            .is_none());
        let deleted = store
            .delete_secret(alice.id, "sec_AAAAAAAAAA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.unique_id, "sec_AAAAAAAAAA");
        assert!(store.find_secret("sec_AAAAAAAAAA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_secrets() {
        let store = MemoryStore::new();
        let alice = store
            .insert_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        store
            .insert_secret(new_secret(alice.id, "sec_AAAAAAAAAA", Utc::now()))
            .await
            .unwrap();
        store
            .set_qr_path("sec_AAAAAAAAAA", "qrcodes/qr_sec_AAAAAAAAAA.png")
            .await
            .unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(!store.delete_user(alice.id).await.unwrap());
        assert!(store.find_secret("sec_AAAAAAAAAA").await.unwrap().is_none());
    }
}
