//! CredentialStore integration tests: register, login, logout, delete, bootstrap

use std::sync::Arc;

use tempfile::TempDir;

use starchart_auth_core::{
    AuthAction, AuthConfig, AuthError, AuthResponse, CredentialStore, FileStorage,
    MemoryStorage, PrefixSweep, Storage, StorageError, ValidationError, ADMIN_USERNAME,
};

/// Memory storage whose `delete` fails for one user's namespaced keys.
struct FailingDelete {
    inner: MemoryStorage,
    prefix: &'static str,
}

impl Storage for FailingDelete {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        if key.starts_with(self.prefix) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only key",
            )));
        }
        self.inner.delete(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.list_keys()
    }
}

fn memory_store() -> (Arc<MemoryStorage>, CredentialStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = CredentialStore::new(storage.clone(), &AuthConfig::default())
        .with_sweep(Arc::new(PrefixSweep));
    (storage, store)
}

#[tokio::test]
async fn test_alice_scenario() {
    let (_storage, store) = memory_store();
    store.init().await.unwrap();

    store.register("alice", "wonder").await.unwrap();
    store.login("alice", "wonder").await.unwrap();
    assert!(store.is_logged_in());
    assert_eq!(store.current_session().unwrap().unwrap().username, "alice");
    assert!(!store.is_admin());

    store.delete_account("wonder").await.unwrap();
    assert!(!store.is_logged_in());

    let err = store.login("alice", "wonder").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid username or password");
}

#[tokio::test]
async fn test_register_boundaries() {
    let (_storage, store) = memory_store();

    assert!(matches!(
        store.register("ab", "1234").await,
        Err(AuthError::Validation(ValidationError::UsernameTooShort(3)))
    ));
    assert!(matches!(
        store.register("abc", "123").await,
        Err(AuthError::Validation(ValidationError::PasswordTooShort(4)))
    ));
    assert!(store.register("abc", "1234").await.is_ok());
}

#[tokio::test]
async fn test_duplicate_register() {
    let (_storage, store) = memory_store();
    store.register("alice", "wonder").await.unwrap();

    let err = store.register("alice", "another").await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUser(ref name) if name == "alice"));
    assert_eq!(err.to_string(), "Username already exists");

    // Admin plus exactly one alice; the original password still works
    assert_eq!(store.user_count().unwrap(), 2);
    assert!(store.login("alice", "wonder").await.is_ok());

    // Case-sensitive names are distinct accounts
    assert!(store.register("Alice", "wonder").await.is_ok());
}

#[tokio::test]
async fn test_register_cannot_claim_admin() {
    let (_storage, store) = memory_store();
    assert!(matches!(
        store.register(ADMIN_USERNAME, "mine!").await,
        Err(AuthError::DuplicateUser(_))
    ));
}

#[tokio::test]
async fn test_enumeration_resistance() {
    let (_storage, store) = memory_store();
    store.register("alice", "wonder").await.unwrap();

    let unknown = store.login("noSuchUser", "x").await.unwrap_err().to_string();
    let wrong = store.login("alice", "wrongPassword").await.unwrap_err().to_string();
    assert_eq!(unknown.as_bytes(), wrong.as_bytes());
    assert!(!store.is_logged_in());
}

#[tokio::test]
async fn test_logout_idempotent() {
    let (_storage, store) = memory_store();
    assert!(store.logout().await.is_ok());
    assert!(store.logout().await.is_ok());

    store.register("alice", "wonder").await.unwrap();
    store.login("alice", "wonder").await.unwrap();
    store.logout().await.unwrap();
    assert!(!store.is_logged_in());
    assert!(store.current_user().is_none());
    assert!(store.logout().await.is_ok());
}

#[tokio::test]
async fn test_admin_bootstrap_and_protection() {
    let (_storage, store) = memory_store();
    store.init().await.unwrap();

    store.login(ADMIN_USERNAME, "cyrus123").await.unwrap();
    assert!(store.is_admin());

    let err = store.delete_account("cyrus123").await.unwrap_err();
    assert!(matches!(err, AuthError::ProtectedAccount));
    assert_eq!(err.to_string(), "Admin account cannot be deleted");

    // Still there, still logged in
    assert_eq!(store.user_count().unwrap(), 1);
    assert!(store.is_logged_in());
}

#[tokio::test]
async fn test_bootstrap_refires_on_empty_table() {
    let (storage, store) = memory_store();
    store.init().await.unwrap();
    store.register("alice", "wonder").await.unwrap();

    // An operator wipes every user
    storage.set("starchart_users", "{}").unwrap();
    store.init().await.unwrap();

    assert_eq!(store.user_count().unwrap(), 1);
    store.login(ADMIN_USERNAME, "cyrus123").await.unwrap();
    assert!(store.is_admin());

    // Repeated loads never add a second admin
    store.init().await.unwrap();
    assert_eq!(store.user_count().unwrap(), 1);
}

#[tokio::test]
async fn test_delete_account_failures() {
    let (_storage, store) = memory_store();
    store.register("alice", "wonder").await.unwrap();

    let err = store.delete_account("wonder").await.unwrap_err();
    assert!(matches!(err, AuthError::NotLoggedIn));
    assert_eq!(err.to_string(), "Not logged in");

    store.login("alice", "wonder").await.unwrap();
    let err = store.delete_account("wander").await.unwrap_err();
    assert!(matches!(err, AuthError::IncorrectPassword));
    assert_eq!(err.to_string(), "Incorrect password");

    // Nothing changed
    assert!(store.is_logged_in());
    assert_eq!(store.user_count().unwrap(), 2);
}

#[tokio::test]
async fn test_delete_sweeps_only_user_namespace() {
    let (storage, store) = memory_store();
    store.register("alice", "wonder").await.unwrap();
    store.register("bob", "builder").await.unwrap();
    storage.set("alice_charts", "[1,2]").unwrap();
    storage.set("alice_prefs", "{}").unwrap();
    storage.set("alicent_charts", "[]").unwrap();
    storage.set("bob_charts", "[]").unwrap();

    store.login("alice", "wonder").await.unwrap();
    store.delete_account("wonder").await.unwrap();

    let mut keys = storage.list_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["alicent_charts", "bob_charts", "starchart_users"]);
    assert!(store.login("bob", "builder").await.is_ok());
}

#[tokio::test]
async fn test_failed_sweep_keeps_account() {
    let storage = Arc::new(FailingDelete {
        inner: MemoryStorage::new(),
        prefix: "alice_",
    });
    let store = CredentialStore::new(storage.clone(), &AuthConfig::default())
        .with_sweep(Arc::new(PrefixSweep));

    store.register("alice", "wonder").await.unwrap();
    storage.set("alice_charts", "[1,2]").unwrap();
    store.login("alice", "wonder").await.unwrap();

    let err = store.delete_account("wonder").await.unwrap_err();
    assert!(matches!(err, AuthError::Storage(_)));

    // Nothing committed: account, session and data survive
    assert_eq!(store.user_count().unwrap(), 2);
    assert_eq!(store.current_user().as_deref(), Some("alice"));
    assert!(storage.get("alice_charts").unwrap().is_some());
    store.logout().await.unwrap();
    assert!(store.login("alice", "wonder").await.is_ok());
}

#[tokio::test]
async fn test_sweep_never_removes_store_keys() {
    let storage = Arc::new(MemoryStorage::new());
    let greedy = |_user: &str, _key: &str| true;
    let store = CredentialStore::new(storage.clone(), &AuthConfig::default())
        .with_sweep(Arc::new(greedy));

    store.register("alice", "wonder").await.unwrap();
    storage.set("unrelated", "1").unwrap();
    store.login("alice", "wonder").await.unwrap();
    store.delete_account("wonder").await.unwrap();

    assert!(storage.get("starchart_users").unwrap().is_some());
    assert!(storage.get("unrelated").unwrap().is_none());
    assert_eq!(store.user_count().unwrap(), 1);
}

#[tokio::test]
async fn test_table_never_holds_plaintext() {
    let (storage, store) = memory_store();
    store.register("alice", "wonder-secret").await.unwrap();

    let blob = storage.get("starchart_users").unwrap().unwrap();
    assert!(!blob.contains("wonder-secret"));
    assert!(!blob.contains("cyrus123"));
}

#[tokio::test]
async fn test_concurrent_registrations_keep_every_user() {
    let (_storage, store) = memory_store();
    let names: Vec<String> = (0..16).map(|i| format!("user{i:02}")).collect();

    let results =
        futures::future::join_all(names.iter().map(|name| store.register(name, "secret"))).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(store.user_count().unwrap(), names.len() + 1);
}

#[tokio::test]
async fn test_file_storage_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = AuthConfig::default();

    {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let store = CredentialStore::new(storage, &config);
        store.register("alice", "wonder").await.unwrap();
        store.login("alice", "wonder").await.unwrap();
    }

    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let store = CredentialStore::new(storage, &config);
    assert_eq!(store.current_user().as_deref(), Some("alice"));
    store.logout().await.unwrap();
    assert!(store.login("alice", "wonder").await.is_ok());
}

#[tokio::test]
async fn test_responses_for_presentation() {
    let (_storage, store) = memory_store();

    let ok = AuthResponse::from_result(AuthAction::Register, store.register("alice", "wonder").await);
    assert_eq!(ok, AuthResponse { success: true, message: "Account created successfully!".into() });

    let bad = AuthResponse::from_result(AuthAction::Register, store.register("", "x").await);
    assert!(!bad.success);
    assert_eq!(bad.message, "Username and password are required");

    let out = AuthResponse::from_result(AuthAction::Logout, store.logout().await);
    assert_eq!(out.message, "Logged out successfully");
}
