//! Persisted session pair on top of a string key-value backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser build persists to `localStorage`; tests and native builds use
//! `MemoryStorage`. `TokenStore` owns the key names and keeps the token and
//! user entries consistent: they are written together and cleared together.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::StorageKeys;
use crate::net::types::SessionUser;
use crate::util::jwt;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected write to {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("could not encode {key}: {reason}")]
    Encode { key: String, reason: String },
}

/// Minimal string key-value backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend is missing or refuses the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend is missing.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// `window.localStorage`, looked up on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(feature = "csr")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        #[cfg(feature = "csr")]
        {
            local_storage()?.get_item(key).ok().flatten()
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = key;
            None
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(feature = "csr")]
        {
            let storage = local_storage().ok_or(StorageError::Unavailable)?;
            storage.set_item(key, value).map_err(|e| StorageError::Write {
                key: key.to_owned(),
                reason: format!("{e:?}"),
            })
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (key, value);
            Err(StorageError::Unavailable)
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        #[cfg(feature = "csr")]
        {
            let storage = local_storage().ok_or(StorageError::Unavailable)?;
            storage.remove_item(key).map_err(|_| StorageError::Unavailable)
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = key;
            Err(StorageError::Unavailable)
        }
    }
}

/// In-process backend. Writes to keys marked with [`MemoryStorage::reject_writes_to`]
/// fail, to exercise partial-write handling.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    rejected: Mutex<HashSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_writes_to(&self, key: &str) {
        self.rejected.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_owned());
    }

    pub fn accept_all_writes(&self) {
        self.rejected.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.rejected.lock().unwrap_or_else(PoisonError::into_inner).contains(key) {
            return Err(StorageError::Write { key: key.to_owned(), reason: "quota exceeded".to_owned() });
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

/// Typed access to the persisted token and user-info entries.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend refuses the write.
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(&self.keys.token, token)?;
        log::debug!("storage: token saved {}", jwt::redact(token));
        Ok(())
    }

    pub fn get_token(&self) -> Option<String> {
        self.backend.get(&self.keys.token).filter(|t| !t.is_empty())
    }

    /// Remove the token together with the user info.
    pub fn clear_token(&self) {
        for key in [&self.keys.token, &self.keys.user] {
            if let Err(e) = self.backend.remove(key) {
                log::error!("storage: failed to remove {key}: {e}");
            }
        }
    }

    /// Persisted user info. `None` when missing or not parseable.
    pub fn get_user(&self) -> Option<SessionUser> {
        let raw = self.backend.get(&self.keys.user)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("storage: ignoring unreadable user info: {e}");
                None
            }
        }
    }

    /// Write token and user as one unit: on any failure neither entry is
    /// left behind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if either write fails; both keys are removed
    /// before returning.
    pub fn save_pair(&self, token: &str, user: &SessionUser) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(user)
            .map_err(|e| StorageError::Encode { key: self.keys.user.clone(), reason: e.to_string() })?;
        let written = self.save_token(token).and_then(|()| self.backend.set(&self.keys.user, &encoded));
        if let Err(e) = written {
            log::error!("storage: session write failed, rolling back: {e}");
            self.clear_token();
            return Err(e);
        }
        log::debug!("storage: user info saved for {}", user.username);
        Ok(())
    }
}
