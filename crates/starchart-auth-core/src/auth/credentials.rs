use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::SessionData;
use super::sweep::{NamespaceSweep, NoSweep};
use super::user::{UserRecord, UserRole, UserTable, ADMIN_USERNAME};
use crate::config::{AuthConfig, DEFAULT_ADMIN_PASSWORD};
use crate::digest::PasswordDigest;
use crate::error::{AuthError, Result, ValidationError};
use crate::storage::{load_json, save_json, Storage};

/// Owns the user table and the single session persisted in a [`Storage`].
///
/// Every read-modify-write of the table runs under one async lock, so
/// concurrent callers cannot lose each other's updates.
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
    digest: Arc<dyn PasswordDigest>,
    sweep: Arc<dyn NamespaceSweep>,
    users_key: String,
    session_key: String,
    admin_password: String,
    min_username_len: usize,
    min_password_len: usize,
    table_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>, config: &AuthConfig) -> Self {
        Self {
            storage,
            digest: config.digest.build(),
            sweep: Arc::new(NoSweep),
            users_key: config.users_key.clone(),
            session_key: config.session_key.clone(),
            admin_password: config.admin_password.clone(),
            min_username_len: config.min_username_len,
            min_password_len: config.min_password_len,
            table_lock: Mutex::new(()),
        }
    }

    pub fn with_digest(mut self, digest: Arc<dyn PasswordDigest>) -> Self {
        self.digest = digest;
        self
    }

    pub fn with_sweep(mut self, sweep: Arc<dyn NamespaceSweep>) -> Self {
        self.sweep = sweep;
        self
    }

    /// Load the table once, creating the admin account if it is empty.
    pub async fn init(&self) -> Result<()> {
        let _guard = self.table_lock.lock().await;
        let users = self.load_users().await?;
        debug!(users = users.len(), "Credential store ready");
        Ok(())
    }

    // ===== Accounts =====

    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        self.validate(username, password)?;

        let _guard = self.table_lock.lock().await;
        let mut users = self.load_users().await?;
        if users.contains_key(username) {
            return Err(AuthError::DuplicateUser(username.to_string()));
        }

        let digest = self.hash(password).await?;
        users.insert(username.to_string(), UserRecord::new(digest, UserRole::User));
        self.save_users(&users)?;

        info!(username, "Registered user");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let _guard = self.table_lock.lock().await;
        let users = self.load_users().await?;

        let verified = match users.get(username) {
            Some(record) => self.verify(password, &record.password_digest).await?,
            None => {
                // Same work as a wrong password
                self.hash(password).await?;
                false
            }
        };
        if !verified {
            info!(username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        save_json(&*self.storage, &self.session_key, &SessionData::new(username))?;
        info!(username, "Logged in");
        Ok(())
    }

    /// Succeeds whether or not a session exists.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.table_lock.lock().await;
        self.storage.delete(&self.session_key)?;
        info!("Logged out");
        Ok(())
    }

    /// Remove the logged-in user's account, their namespaced keys and the session.
    pub async fn delete_account(&self, password: &str) -> Result<()> {
        let _guard = self.table_lock.lock().await;

        let username = self
            .current_session()?
            .ok_or(AuthError::NotLoggedIn)?
            .username;
        if username == ADMIN_USERNAME {
            return Err(AuthError::ProtectedAccount);
        }

        let mut users = self.read_users()?;
        let record = users.get(&username).ok_or(AuthError::NotLoggedIn)?;
        if record.is_admin() {
            return Err(AuthError::ProtectedAccount);
        }
        if !self.verify(password, &record.password_digest).await? {
            return Err(AuthError::IncorrectPassword);
        }

        // Sweep first: if it fails the account is still there to retry with.
        let swept = self.sweep_user_keys(&username)?;
        users.remove(&username);
        self.save_users(&users)?;
        self.storage.delete(&self.session_key)?;

        info!(username = %username, swept, "Deleted account");
        Ok(())
    }

    /// Replace the logged-in user's digest after checking the old password.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        if new_password.chars().count() < self.min_password_len {
            return Err(ValidationError::PasswordTooShort(self.min_password_len).into());
        }

        let _guard = self.table_lock.lock().await;
        let username = self
            .current_session()?
            .ok_or(AuthError::NotLoggedIn)?
            .username;

        let mut users = self.load_users().await?;
        let stored = users
            .get(&username)
            .map(|record| record.password_digest.clone())
            .ok_or(AuthError::NotLoggedIn)?;
        if !self.verify(old_password, &stored).await? {
            return Err(AuthError::IncorrectPassword);
        }

        let digest = self.hash(new_password).await?;
        if let Some(record) = users.get_mut(&username) {
            record.password_digest = digest;
        }
        self.save_users(&users)?;

        info!(username = %username, "Changed password");
        Ok(())
    }

    // ===== Session queries =====

    pub fn current_session(&self) -> Result<Option<SessionData>> {
        // The legacy client may have left a literal `null` behind.
        let session = load_json::<Option<SessionData>>(&*self.storage, &self.session_key)?;
        Ok(session.flatten())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_or_log().is_some()
    }

    pub fn current_user(&self) -> Option<String> {
        self.session_or_log().map(|session| session.username)
    }

    /// True when the session user's record carries the admin role.
    /// Checks the `role` field, not the username.
    pub fn is_admin(&self) -> bool {
        let Some(username) = self.current_user() else {
            return false;
        };
        match self.read_users() {
            Ok(users) => users.get(&username).is_some_and(UserRecord::is_admin),
            Err(e) => {
                warn!(error = %e, "Failed to read user table for admin check");
                false
            }
        }
    }

    pub fn user_count(&self) -> Result<usize> {
        Ok(self.read_users()?.len())
    }

    // ===== Internals =====

    fn validate(&self, username: &str, password: &str) -> Result<(), ValidationError> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if username.chars().count() < self.min_username_len {
            return Err(ValidationError::UsernameTooShort(self.min_username_len));
        }
        if password.chars().count() < self.min_password_len {
            return Err(ValidationError::PasswordTooShort(self.min_password_len));
        }
        Ok(())
    }

    fn session_or_log(&self) -> Option<SessionData> {
        match self.current_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Unreadable session treated as logged out");
                None
            }
        }
    }

    fn read_users(&self) -> Result<UserTable> {
        Ok(load_json::<UserTable>(&*self.storage, &self.users_key)?.unwrap_or_default())
    }

    fn save_users(&self, users: &UserTable) -> Result<()> {
        save_json(&*self.storage, &self.users_key, users)?;
        Ok(())
    }

    /// Read the table, bootstrapping the admin account when it is empty.
    /// Callers hold `table_lock`.
    async fn load_users(&self) -> Result<UserTable> {
        let mut users = self.read_users()?;
        if users.is_empty() {
            let digest = self.hash(&self.admin_password).await?;
            users.insert(
                ADMIN_USERNAME.to_string(),
                UserRecord::new(digest, UserRole::Admin),
            );
            self.save_users(&users)?;

            if self.admin_password == DEFAULT_ADMIN_PASSWORD {
                warn!(
                    username = ADMIN_USERNAME,
                    "Admin account created with the default password; change it"
                );
            } else {
                info!(username = ADMIN_USERNAME, "Admin account created");
            }
        }
        Ok(users)
    }

    fn sweep_user_keys(&self, username: &str) -> Result<usize> {
        let keys: Vec<String> = self
            .storage
            .list_keys()?
            .into_iter()
            .filter(|key| *key != self.users_key && *key != self.session_key)
            .filter(|key| self.sweep.owns(username, key))
            .collect();

        for key in &keys {
            self.storage.delete(key)?;
            debug!(key = %key, "Swept user key");
        }
        Ok(keys.len())
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let digest = Arc::clone(&self.digest);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || digest.hash(&password))
            .await
            .map_err(|e| AuthError::Digest(e.to_string()))?
    }

    async fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let digest = Arc::clone(&self.digest);
        let password = password.to_string();
        let stored = stored.to_string();
        tokio::task::spawn_blocking(move || digest.verify(&password, &stored))
            .await
            .map_err(|e| AuthError::Digest(e.to_string()))?
    }
}
