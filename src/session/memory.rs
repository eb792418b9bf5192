//! In-memory session backend — used by tests and the CLI demo.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::SessionError;
use crate::session::SessionStore;

/// A `SessionStore` backed by a process-local map.
///
/// Not durable across restarts; production deployments plug in whatever
/// per-user store the surrounding system provides.
#[derive(Debug, Default)]
pub struct MemorySession {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: &str) -> Result<Value, SessionError> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::KeyNotFound {
                key: key.to_string(),
            })
    }

    async fn has(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
