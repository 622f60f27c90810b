use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The single authenticated identity of this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub username: String,
    pub login_time: DateTime<Utc>,
}

impl SessionData {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            login_time: Utc::now(),
        }
    }

    /// Time elapsed since login
    pub fn duration(&self) -> Duration {
        Utc::now() - self.login_time
    }

    /// Get minutes since login (for display)
    pub fn minutes_logged_in(&self) -> i64 {
        self.duration().num_minutes().max(0)
    }
}
