use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::auth::models::User;
use crate::errors::Error;
use crate::token::write_json_atomic;

/// Holds the signed-in user between launches.
pub trait UserStore: Send + Sync {
    fn user(&self) -> Option<User>;
    fn set_user(&self, user: Option<User>);
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Option<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn user(&self) -> Option<User> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_user(&self, user: Option<User>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}

/// Keeps the user as JSON on disk; clearing removes the file.
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    inner: RwLock<Option<User>>,
}

impl FileUserStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let user = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(serde_json::from_str(&contents).map_err(|e| {
                Error::Config(format!("Corrupt user file '{}': {e}", path.display()))
            })?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), cached = user.is_some(), "user store opened");
        Ok(Self {
            path,
            inner: RwLock::new(user),
        })
    }

    fn persist(&self, user: Option<&User>) -> Result<(), Error> {
        match user {
            Some(user) => write_json_atomic(&self.path, user),
            None => match std::fs::remove_file(&self.path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            },
        }
    }
}

impl UserStore for FileUserStore {
    fn user(&self) -> Option<User> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_user(&self, user: Option<User>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = user;
        if let Err(err) = self.persist(guard.as_ref()) {
            warn!(path = %self.path.display(), error = %err, "user store write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str) -> User {
        serde_json::from_value(json!({
            "id": id,
            "telegram_id": "123",
            "current_gem_balance": 7,
            "created_at": "2025-09-20T00:00:00Z",
            "updated_at": "2025-09-21T08:30:00.250Z"
        }))
        .unwrap()
    }

    #[test]
    fn file_store_keeps_user_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth").join("user.json");

        let store = FileUserStore::open(&path).unwrap();
        assert_eq!(store.user(), None);
        store.set_user(Some(user("u1")));

        let reopened = FileUserStore::open(&path).unwrap();
        assert_eq!(reopened.user(), Some(user("u1")));
    }

    #[test]
    fn clearing_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");

        let store = FileUserStore::open(&path).unwrap();
        store.set_user(Some(user("u1")));
        assert!(path.exists());
        store.set_user(None);
        assert!(!path.exists());
        store.set_user(None);

        assert_eq!(FileUserStore::open(&path).unwrap().user(), None);
    }

    #[test]
    fn corrupt_user_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, "{\"id\":").unwrap();
        assert!(matches!(FileUserStore::open(&path), Err(Error::Config(_))));
    }

    #[test]
    fn memory_store_replaces_and_clears() {
        let store = MemoryUserStore::new();
        store.set_user(Some(user("u1")));
        store.set_user(Some(user("u2")));
        assert_eq!(store.user().map(|u| u.id), Some("u2".to_string()));
        store.set_user(None);
        assert!(store.user().is_none());
    }
}
