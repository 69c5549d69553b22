use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreScopeError {
    #[error("player id cannot be empty")]
    Empty,

    #[error("player id is longer than {max} characters")]
    TooLong { max: usize },

    #[error("player id cannot contain control characters")]
    ControlCharacter,
}

//
// ─── SCOPE ────────────────────────────────────────────────────────────────────
//

/// Namespace owned by one player, usually an email address.
///
/// Identifiers are trimmed and lower-cased so `Ana@Example.com` and
/// `ana@example.com ` share one scope.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreScope(String);

impl StoreScope {
    pub const MAX_LEN: usize = 254;

    /// Validate a player identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreScopeError` if it is blank, too long or has control characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, StoreScopeError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(StoreScopeError::Empty);
        }
        if normalized.chars().count() > Self::MAX_LEN {
            return Err(StoreScopeError::TooLong { max: Self::MAX_LEN });
        }
        if normalized.chars().any(char::is_control) {
            return Err(StoreScopeError::ControlCharacter);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreScope({})", self.0)
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── CONTRACT ─────────────────────────────────────────────────────────────────
//

/// Session-scoped key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value, `None` if the key was never set or was cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or an empty key.
    async fn get(&self, scope: &StoreScope, key: &str) -> Result<Option<Value>, StorageError>;

    /// Insert or replace a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or an empty key.
    async fn set(&self, scope: &StoreScope, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Remove every key of a scope. Returns how many entries were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear(&self, scope: &StoreScope) -> Result<u64, StorageError>;
}

pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

/// In-memory store for tests and ephemeral play.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<StoreScope, BTreeMap<String, Value>>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, scope: &StoreScope, key: &str) -> Result<Option<Value>, StorageError> {
        check_key(key)?;
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(scope).and_then(|entries| entries.get(key)).cloned())
    }

    async fn set(&self, scope: &StoreScope, key: &str, value: &Value) -> Result<(), StorageError> {
        check_key(key)?;
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry(scope.clone())
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn clear(&self, scope: &StoreScope) -> Result<u64, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let removed = guard.remove(scope).map_or(0, |entries| entries.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

/// Storage backends behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(raw: &str) -> StoreScope {
        StoreScope::new(raw).unwrap()
    }

    #[test]
    fn scope_is_normalized() {
        assert_eq!(scope("  Ana@Example.COM "), scope("ana@example.com"));
        assert_eq!(scope("Ana@Example.COM").as_str(), "ana@example.com");
    }

    #[test]
    fn scope_rejects_bad_ids() {
        assert_eq!(StoreScope::new("  ").unwrap_err(), StoreScopeError::Empty);
        assert_eq!(
            StoreScope::new("a\u{7}b").unwrap_err(),
            StoreScopeError::ControlCharacter
        );
        assert!(matches!(
            StoreScope::new("x".repeat(StoreScope::MAX_LEN + 1)),
            Err(StoreScopeError::TooLong { .. })
        ));
    }

    #[tokio::test]
    async fn set_get_and_clear_are_scoped() {
        let store = InMemoryStore::new();
        let ana = scope("ana@example.com");
        let raj = scope("raj@example.com");

        store.set(&ana, "bodmas", &json!({"best": 40})).await.unwrap();
        store.set(&raj, "bodmas", &json!({"best": 10})).await.unwrap();

        assert_eq!(
            store.get(&ana, "bodmas").await.unwrap(),
            Some(json!({"best": 40}))
        );
        assert_eq!(store.clear(&ana).await.unwrap(), 1);
        assert_eq!(store.get(&ana, "bodmas").await.unwrap(), None);
        assert_eq!(
            store.get(&raj, "bodmas").await.unwrap(),
            Some(json!({"best": 10}))
        );
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryStore::new();
        let ana = scope("ana");
        assert_eq!(store.clear(&ana).await.unwrap(), 0);
        assert_eq!(store.clear(&ana).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let store = InMemoryStore::new();
        let err = store.get(&scope("ana"), " ").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
