use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Operations whose outcome is rendered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Register,
    Login,
    Logout,
    DeleteAccount,
    ChangePassword,
}

impl AuthAction {
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Register => "Account created successfully!",
            Self::Login => "Login successful!",
            Self::Logout => "Logged out successfully",
            Self::DeleteAccount => "Account deleted successfully",
            Self::ChangePassword => "Password changed successfully",
        }
    }
}

/// `{success, message}` as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

impl AuthResponse {
    pub fn ok(action: AuthAction) -> Self {
        Self {
            success: true,
            message: action.success_message().to_string(),
        }
    }

    pub fn from_result(action: AuthAction, result: Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => Self::ok(action),
            Err(e) => e.into(),
        }
    }
}

impl From<AuthError> for AuthResponse {
    fn from(err: AuthError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}
