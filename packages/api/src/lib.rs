//! # API crate — account and secret operations for ShareSecret
//!
//! Everything the HTTP layer calls lives here. The two managers sit directly on
//! a [`store::VaultStore`]; there is no orchestration layer in between.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`accounts`] | — | [`AccountManager`]: register, authenticate, admin bootstrap, account deletion |
//! | [`vault`] | — | [`SecretVault`]: create, view (password gate, expiry, view count), list, delete |
//! | [`auth`] | — | Argon2id password hashing and the request-scoped [`SessionContext`] |
//! | [`ids`] | — | `sec_` identifier generation and validation |
//! | [`qr`] | partly `server` | [`qr::QrEncoder`] seam; the PNG encoder is server only |
//! | [`db`] | `server` | PostgreSQL pool and the [`db::PgStore`] backend |
//! | [`error`] | — | [`AccountError`] and [`VaultError`] |

pub mod accounts;
pub mod auth;
#[cfg(feature = "server")]
pub mod db;
pub mod error;
pub mod ids;
pub mod qr;
pub mod vault;

pub use accounts::AccountManager;
pub use auth::SessionContext;
pub use error::{AccountError, VaultError};
pub use vault::{CreateSecret, CreatedSecret, SecretVault, SecretView};

pub use store::{SecretContent, SecretSummary, UserInfo};
