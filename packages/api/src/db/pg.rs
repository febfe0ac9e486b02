use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use store::{NewSecret, NewUser, Secret, StoreError, User, VaultStore};

/// PostgreSQL-backed VaultStore.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row of the `users` table.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    is_admin: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            is_admin: row.is_admin,
        }
    }
}

/// Row of the `secrets` table.
#[derive(Debug, FromRow)]
struct SecretRow {
    id: i64,
    user_id: i64,
    title: String,
    content: String,
    password_hash: String,
    blur_level: i32,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    view_count: i32,
    unique_id: String,
    qr_path: Option<String>,
}

impl From<SecretRow> for Secret {
    fn from(row: SecretRow) -> Self {
        Secret {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            password_hash: row.password_hash,
            blur_level: row.blur_level,
            created_at: row.created_at,
            expires_at: row.expires_at,
            view_count: row.view_count,
            unique_id: row.unique_id,
            qr_path: row.qr_path,
        }
    }
}

/// Translate sqlx errors, naming the column behind a unique violation.
fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let field = match db.constraint() {
                Some("users_username_key") => "username",
                Some("users_email_key") => "email",
                Some("secrets_unique_id_key") => "unique_id",
                _ => "value",
            };
            StoreError::Duplicate { field }
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
            StoreError::Constraint(db.message().to_string())
        }
        e => StoreError::Backend(e.to_string()),
    }
}

impl VaultStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, is_admin) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.into())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_secret(&self, secret: NewSecret) -> Result<Secret, StoreError> {
        let row: SecretRow = sqlx::query_as(
            "INSERT INTO secrets (user_id, title, content, password_hash, blur_level, created_at, expires_at, unique_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(secret.user_id)
        .bind(&secret.title)
        .bind(&secret.content)
        .bind(&secret.password_hash)
        .bind(secret.blur_level)
        .bind(secret.created_at)
        .bind(secret.expires_at)
        .bind(&secret.unique_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.into())
    }

    async fn find_secret(&self, unique_id: &str) -> Result<Option<Secret>, StoreError> {
        let row: Option<SecretRow> = sqlx::query_as("SELECT * FROM secrets WHERE unique_id = $1")
            .bind(unique_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Secret::from))
    }

    async fn list_secrets(&self, user_id: i64) -> Result<Vec<Secret>, StoreError> {
        let rows: Vec<SecretRow> = sqlx::query_as(
            "SELECT * FROM secrets WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(Secret::from).collect())
    }

    async fn increment_view_count(&self, unique_id: &str) -> Result<i32, StoreError> {
        let count: Option<i32> = sqlx::query_scalar(
            "UPDATE secrets SET view_count = view_count + 1 WHERE unique_id = $1 RETURNING view_count",
        )
        .bind(unique_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        count.ok_or(StoreError::NotFound)
    }

    async fn set_qr_path(&self, unique_id: &str, qr_path: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE secrets SET qr_path = $2 WHERE unique_id = $1")
            .bind(unique_id)
            .bind(qr_path)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_secret(
        &self,
        user_id: i64,
        unique_id: &str,
    ) -> Result<Option<Secret>, StoreError> {
        let row: Option<SecretRow> = sqlx::query_as(
            "DELETE FROM secrets WHERE unique_id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(unique_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.map(Secret::from))
    }
}
