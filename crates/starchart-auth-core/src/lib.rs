//! Star Chart credential store.
//!
//! A small authentication core: a user table and a single active session,
//! both persisted as JSON blobs through an injected [`Storage`] provider.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use starchart_auth_core::{AuthConfig, CredentialStore, MemoryStorage};
//!
//! # async fn demo() -> starchart_auth_core::Result<()> {
//! let store = CredentialStore::new(Arc::new(MemoryStorage::new()), &AuthConfig::default());
//! store.init().await?;
//! store.register("alice", "wonder").await?;
//! store.login("alice", "wonder").await?;
//! assert_eq!(store.current_user().as_deref(), Some("alice"));
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod digest;
pub mod error;
pub mod response;
pub mod storage;

pub use auth::{
    CredentialStore, NamespaceSweep, NoSweep, PrefixSweep, SessionData, UserRecord, UserRole,
    UserTable, ADMIN_USERNAME,
};
pub use config::AuthConfig;
pub use digest::{Argon2Digest, DigestAlgorithm, LegacyRollingDigest, PasswordDigest, Sha256Digest};
pub use error::{AuthError, Result, StorageError, ValidationError};
pub use response::{AuthAction, AuthResponse};
pub use storage::{FileStorage, MemoryStorage, Storage};
