//! Errors surfaced by [`crate::VaultStore`] backends.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique column already holds the value. `field` is the column name
    /// (`"username"`, `"email"` or `"unique_id"`).
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    #[error("record not found")]
    NotFound,

    /// A foreign key or check constraint rejected the row.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
