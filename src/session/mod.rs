//! Session State Contract — the sole persistence boundary of the engine.
//!
//! The orchestrator persists its workflow snapshot here and the attempts
//! plugin keeps its retry counters here; between suspension points nothing
//! else survives. The trait is backend-agnostic: the surrounding system
//! supplies whatever durable per-user store it has.

pub mod memory;

pub use memory::MemorySession;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::SessionError;

/// Keys used by the engine inside a user's session key space.
///
/// The orchestrator and the attempts plugin write to disjoint keys, so no
/// locking is needed within a single user's session.
pub mod session_keys {
    /// Key for the persisted workflow snapshot.
    pub const WORKFLOW_STATE: &str = "workflow_state";

    /// Key for plugin-local state, scoped to `(step_id, plugin name)`.
    pub fn plugin_state(step_id: &str, plugin: &str) -> String {
        format!("plugin:{step_id}:{plugin}")
    }
}

/// Scoped key-value surface backing one user's workflow session.
///
/// Reads of a missing key fail with [`SessionError::KeyNotFound`]; the
/// coercing readers fail with [`SessionError::TypeMismatch`] when the stored
/// value cannot be coerced. `remove` is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the raw JSON value stored under `key`.
    async fn get(&self, key: &str) -> Result<Value, SessionError>;

    /// Whether `key` is present.
    async fn has(&self, key: &str) -> Result<bool, SessionError>;

    /// Store a raw JSON value under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), SessionError>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), SessionError>;

    /// Delete every key in this session's key space.
    async fn clear(&self) -> Result<(), SessionError>;

    /// Read `key` as a string.
    async fn get_str(&self, key: &str) -> Result<String, SessionError> {
        match self.get(key).await? {
            Value::String(s) => Ok(s),
            _ => Err(SessionError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Read `key` as a signed integer.
    async fn get_i64(&self, key: &str) -> Result<i64, SessionError> {
        self.get(key)
            .await?
            .as_i64()
            .ok_or_else(|| SessionError::TypeMismatch {
                key: key.to_string(),
                expected: "integer",
            })
    }

    /// Read `key` as a float. Integers coerce losslessly.
    async fn get_f64(&self, key: &str) -> Result<f64, SessionError> {
        self.get(key)
            .await?
            .as_f64()
            .ok_or_else(|| SessionError::TypeMismatch {
                key: key.to_string(),
                expected: "float",
            })
    }

    /// Read `key` as a boolean.
    async fn get_bool(&self, key: &str) -> Result<bool, SessionError> {
        self.get(key)
            .await?
            .as_bool()
            .ok_or_else(|| SessionError::TypeMismatch {
                key: key.to_string(),
                expected: "boolean",
            })
    }
}

/// Read `key` and deserialize it into `T`.
///
/// Free function rather than a trait method so [`SessionStore`] stays
/// object-safe.
pub async fn get_object<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<T, SessionError> {
    let value = store.get(key).await?;
    serde_json::from_value(value).map_err(|_| SessionError::TypeMismatch {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Serialize `value` and store it under `key`.
pub async fn set_object<T: Serialize>(
    store: &dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    let json = serde_json::to_value(value).map_err(|e| SessionError::Backend(e.to_string()))?;
    store.set(key, json).await
}
