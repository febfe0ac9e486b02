//! # Database module — PostgreSQL persistence
//!
//! Server builds persist accounts and secrets in PostgreSQL through sqlx.
//!
//! - [`connect`] opens a connection pool (up to 5 connections) for a database URL.
//!   The web binary owns the pool and runs the migrations in `api/migrations`.
//! - [`PgStore`] implements [`store::VaultStore`] over that pool. Uniqueness,
//!   the owner foreign key (`ON DELETE CASCADE`) and the expiry check are all
//!   enforced by the schema; their violations come back as
//!   [`store::StoreError`] variants.

mod pg;
mod pool;

pub use pg::PgStore;
pub use pool::connect;
