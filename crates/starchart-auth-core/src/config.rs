//! Credential store configuration.
//!
//! Holds the two storage keys the store owns, the password policy, the
//! digest algorithm and the bootstrap admin password.
//!
//! Configuration is stored at `~/.config/starchart-auth/config.json`;
//! `STARCHART_AUTH_*` environment variables override individual fields.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;

/// Application name used for config/data directory paths
const APP_NAME: &str = "starchart-auth";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Storage key of the serialized user table
pub const DEFAULT_USERS_KEY: &str = "starchart_users";

/// Storage key of the serialized session
pub const DEFAULT_SESSION_KEY: &str = "starchart_session";

/// Password given to the bootstrap admin account.
/// Known to anyone who has read this file: rotate it after first login.
pub const DEFAULT_ADMIN_PASSWORD: &str = "cyrus123";

pub const DEFAULT_MIN_USERNAME_LEN: usize = 3;
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 4;

const ENV_DATA_DIR: &str = "STARCHART_AUTH_DATA_DIR";
const ENV_ADMIN_PASSWORD: &str = "STARCHART_AUTH_ADMIN_PASSWORD";
const ENV_DIGEST: &str = "STARCHART_AUTH_DIGEST";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub users_key: String,
    pub session_key: String,
    pub admin_password: String,
    pub min_username_len: usize,
    pub min_password_len: usize,
    pub digest: DigestAlgorithm,
    pub data_dir: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_key: DEFAULT_USERS_KEY.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            min_username_len: DEFAULT_MIN_USERNAME_LEN,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            digest: DigestAlgorithm::default(),
            data_dir: None,
        }
    }
}

impl AuthConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `STARCHART_AUTH_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD).filter(|v| !v.is_empty()) {
            self.admin_password = password;
        }
        if let Some(digest) = lookup(ENV_DIGEST).filter(|v| !v.is_empty()) {
            self.digest = digest
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid {}: {}", ENV_DIGEST, e))?;
        }
        Ok(self)
    }

    /// Directory the file-backed provider keeps its blobs in.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}
