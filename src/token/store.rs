use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::Error;

/// Access/refresh token pair as persisted by a [`CredentialStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

/// Shared, mutable token storage. Implementations must make `set_pair` and
/// `clear_all` atomic with respect to `pair`.
pub trait CredentialStore: Send + Sync {
    fn pair(&self) -> CredentialPair;
    fn set_pair(&self, pair: CredentialPair);

    fn access_token(&self) -> Option<String> {
        self.pair().access_token
    }

    fn refresh_token(&self) -> Option<String> {
        self.pair().refresh_token
    }

    fn set_access_token(&self, token: Option<String>);
    fn set_refresh_token(&self, token: Option<String>);

    fn clear_all(&self) {
        self.set_pair(CredentialPair::default());
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<CredentialPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            inner: RwLock::new(pair),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn pair(&self) -> CredentialPair {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_pair(&self, pair: CredentialPair) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = pair;
    }

    fn set_access_token(&self, token: Option<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token = token;
    }

    fn set_refresh_token(&self, token: Option<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token = token;
    }
}

/// Persists the pair as JSON on disk. Non-secure fallback for hosts without
/// a keychain; the in-memory copy stays authoritative if a write fails.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    inner: RwLock<CredentialPair>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, loading an existing pair if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let pair = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                Error::Config(format!(
                    "Corrupt credential file '{}': {e}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CredentialPair::default(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), "credential store opened");
        Ok(Self {
            path,
            inner: RwLock::new(pair),
        })
    }

    fn update(&self, apply: impl FnOnce(&mut CredentialPair)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        // Persist under the write lock so the file never lags a newer in-memory pair.
        if let Err(err) = write_json_atomic(&self.path, &*guard) {
            warn!(path = %self.path.display(), error = %err, "credential store write failed");
        }
    }
}

/// Writes `value` as JSON next to `path`, then renames it into place.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn pair(&self) -> CredentialPair {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_pair(&self, pair: CredentialPair) {
        self.update(|current| *current = pair);
    }

    fn set_access_token(&self, token: Option<String>) {
        self.update(|current| current.access_token = token);
    }

    fn set_refresh_token(&self, token: Option<String>) {
        self.update(|current| current.refresh_token = token);
    }
}
