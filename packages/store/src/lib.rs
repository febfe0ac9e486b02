pub mod error;
pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use error::StoreError;
pub use models::{
    NewSecret, NewUser, Secret, SecretContent, SecretSummary, User, UserInfo, UNIQUE_ID_PREFIX,
};
pub use repo::VaultStore;
