//! Account and session management.
//!
//! This module provides:
//! - `CredentialStore`: registration, login, logout and account deletion
//! - `SessionData`: the single logged-in identity
//! - `UserRecord` / `UserRole`: entries of the persisted user table
//! - `NamespaceSweep`: the hook that removes a deleted user's app data
//!
//! An empty user table is bootstrapped with the `Cyrus` admin account.

pub mod credentials;
pub mod session;
pub mod sweep;
pub mod user;

pub use credentials::CredentialStore;
pub use session::SessionData;
pub use sweep::{NamespaceSweep, NoSweep, PrefixSweep};
pub use user::{UserRecord, UserRole, UserTable, ADMIN_USERNAME};
