//! [`PropertyStore`]: the lock-protected property map embedded in every entity.
//!
//! One `RwLock` guards the active properties, the not-yet-promoted cache
//! namespaces (see [`crate::cache`]) and an item's ranking scores, so an
//! entity has a single read/write exclusion domain. Every method holds the lock for its whole
//! body and never calls back into another locking method.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PropertyError;
use crate::value::{Properties, Value};

/// Ranking scores. Only items set them.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scores {
    pub(crate) score: f64,
    pub(crate) algo_scores: HashMap<String, f64>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct EntityState {
    pub(crate) properties: Properties,
    pub(crate) cache: HashMap<String, Properties>,
    pub(crate) scores: Scores,
}

/// Thread-safe property container with typed accessors.
#[derive(Debug, Default)]
pub struct PropertyStore {
    state: RwLock<EntityState>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `properties`.
    pub fn with_properties(properties: Properties) -> Self {
        Self {
            state: RwLock::new(EntityState {
                properties,
                ..EntityState::default()
            }),
        }
    }

    // Critical sections never panic mid-update, so a poisoned lock still
    // guards a consistent map.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, EntityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.write().properties.insert(key.into(), value.into());
    }

    /// Insert every pair of `properties`, last write wins per key.
    pub fn set_many(&self, properties: Properties) {
        self.write().properties.extend(properties);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().properties.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().properties.contains_key(key)
    }

    pub fn get_string(&self, key: &str) -> Result<String, PropertyError> {
        self.typed(key, Value::to_text)
    }

    pub fn get_int(&self, key: &str) -> Result<i64, PropertyError> {
        self.typed(key, Value::to_int)
    }

    pub fn get_float(&self, key: &str) -> Result<f64, PropertyError> {
        self.typed(key, Value::to_float)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, PropertyError> {
        self.typed(key, Value::to_bool)
    }

    fn typed<T>(
        &self,
        key: &str,
        coerce: impl FnOnce(&Value) -> Result<T, crate::error::CoercionError>,
    ) -> Result<T, PropertyError> {
        let state = self.read();
        let value = state
            .properties
            .get(key)
            .ok_or_else(|| PropertyError::NotFound(key.to_string()))?;
        coerce(value).map_err(|source| PropertyError::Coercion {
            key: key.to_string(),
            source,
        })
    }

    /// Remove `key`; absent keys are ignored.
    pub fn delete(&self, key: &str) {
        self.write().properties.remove(key);
    }

    pub fn delete_many<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut state = self.write();
        for key in keys {
            state.properties.remove(key.as_ref());
        }
    }

    /// Copy of the current properties.
    pub fn snapshot(&self) -> Properties {
        self.read().properties.clone()
    }

    pub fn len(&self) -> usize {
        self.read().properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().properties.is_empty()
    }

    /// Deep copy of the whole entity state into an independent store.
    pub fn duplicate(&self) -> Self {
        let state = self.read().clone();
        Self {
            state: RwLock::new(state),
        }
    }
}
