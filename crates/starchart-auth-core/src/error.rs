use thiserror::Error;

/// Failures of the persistence provider or of the blobs it holds.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Failed to parse stored value for {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input shape problems, checked in a fixed order by registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username and password are required")]
    MissingFields,

    #[error("Username must be at least {0} characters")]
    UsernameTooShort(usize),

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Username already exists")]
    DuplicateUser(String),

    /// Unknown user and wrong password share this message.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Password re-check for an already authenticated user.
    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Admin account cannot be deleted")]
    ProtectedAccount,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Password digest failed: {0}")]
    Digest(String),
}

impl AuthError {
    /// True for the closed set of outcomes a caller may re-prompt on.
    /// Infrastructure failures return false.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AuthError::Storage(_) | AuthError::Digest(_))
    }
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;
