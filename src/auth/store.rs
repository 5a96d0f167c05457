//! Durable storage for the session token and the serialized user record.
//!
//! Two string values are kept: the opaque bearer token (`admin_token`) and the
//! JSON user record (`admin_user`). They are written together and cleared
//! together; the authenticator decides what a half-present record means.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::debug;

pub const TOKEN_KEY: &str = "admin_token";
pub const USER_KEY: &str = "admin_user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read session file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write session file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("session file {0} is corrupted")]
    Corrupted(PathBuf),
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Raw persisted values, exactly as stored.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntries {
    #[serde(rename = "admin_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "admin_user", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl std::fmt::Debug for StoredEntries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredEntries")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user", &self.user)
            .finish()
    }
}

/// Key/value persistence for one session.
pub trait SessionStore: Send + Sync {
    /// Reads whatever is stored; missing values are `None`.
    ///
    /// # Errors
    /// Returns an error when storage cannot be read or is unreadable as a whole.
    fn load(&self) -> Result<StoredEntries, StoreError>;

    /// Writes both values in one step.
    ///
    /// # Errors
    /// Returns an error when storage cannot be written.
    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StoreError>;

    /// Removes both values.
    ///
    /// # Errors
    /// Returns an error when storage cannot be cleared.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<StoredEntries>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds raw values, including ones the authenticator will reject.
    #[must_use]
    pub fn with_entries(token: Option<&str>, user: Option<&str>) -> Self {
        Self {
            entries: Mutex::new(StoredEntries {
                token: token.map(ToString::to_string),
                user: user.map(ToString::to_string),
            }),
        }
    }

    /// Snapshot of the stored values.
    #[must_use]
    pub fn entries(&self) -> StoredEntries {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<StoredEntries, StoreError> {
        Ok(self.entries())
    }

    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = StoredEntries {
            token: Some(token.expose_secret().to_string()),
            user: Some(user_json.to_string()),
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = StoredEntries::default();
        Ok(())
    }
}

/// JSON file holding both values; replaced through a temp file and rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<StoredEntries, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(StoredEntries::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|_| StoreError::Corrupted(self.path.clone()))
    }

    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StoreError> {
        let entries = StoredEntries {
            token: Some(token.expose_secret().to_string()),
            user: Some(user_json.to_string()),
        };
        let payload = serde_json::to_vec_pretty(&entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.write_error(err))?;
        }

        let temp_path = self.temp_path();
        let mut file = open_private(&temp_path).map_err(|err| self.write_error(err))?;
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|err| self.write_error(err))?;
        fs::rename(&temp_path, &self.path).map_err(|err| self.write_error(err))?;

        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.write_error(err)),
        }
    }
}

/// Creates (or truncates) a file readable only by the current user.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
