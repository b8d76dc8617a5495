//! Storage backends for [`SessionManager`](super::SessionManager).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tower_sessions::Session;

use super::SessionError;

/// Key/value string storage behind the session manager.
pub trait SessionStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Storage backed by the request's `tower_sessions::Session`.
#[derive(Debug, Clone)]
pub struct TowerSessionStorage {
    session: Session,
}

impl TowerSessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The session's identifier, once the session has been saved.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.session.id().map(|id| id.to_string())
    }

    /// Persist the session now so it has an identifier.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the store rejects the save.
    pub async fn ensure_saved(&self) -> Result<String, SessionError> {
        if let Some(id) = self.id() {
            return Ok(id);
        }
        self.session
            .save()
            .await
            .map_err(|e| SessionError::Store(e.to_string()))?;
        self.id()
            .ok_or_else(|| SessionError::Store("session has no id after save".to_string()))
    }
}

impl SessionStorage for TowerSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.session
            .get::<String>(key)
            .await
            .map_err(|e| SessionError::Store(e.to_string()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| SessionError::Store(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.session
            .remove::<String>(key)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Store(e.to_string()))
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, SessionError> {
        self.values
            .lock()
            .map_err(|_| SessionError::Store("memory storage lock poisoned".to_string()))
    }
}

impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
