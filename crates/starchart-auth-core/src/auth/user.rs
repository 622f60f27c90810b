use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the bootstrap administrator. Never deletable.
pub const ADMIN_USERNAME: &str = "Cyrus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account. The digest keeps the legacy `password` field name so
/// tables written by the old client still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "password")]
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub role: UserRole,
}

impl UserRecord {
    pub fn new(password_digest: String, role: UserRole) -> Self {
        Self {
            password_digest,
            created_at: Utc::now(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Username (case-sensitive) to record.
pub type UserTable = BTreeMap<String, UserRecord>;
