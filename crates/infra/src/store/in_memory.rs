use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value as JsonValue;

use onboard_core::{LabelSelector, ObjectUid, Resource};

use super::r#trait::{StateStore, StoreError};

/// Objects are keyed by `(kind, name)`; the map keeps `list` ordered by name.
type ObjectKey = (String, String);

/// In-memory state store holding JSON documents.
///
/// Intended for tests/dev. Resource versions come from one store-wide counter,
/// so they are unique across kinds.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, JsonValue>,
    last_version: u64,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects of kind `R`.
    pub fn count<R: Resource>(&self) -> usize {
        self.inner
            .read()
            .map(|inner| inner.objects.keys().filter(|(k, _)| k == R::KIND).count())
            .unwrap_or(0)
    }

    fn key<R: Resource>(name: &str) -> ObjectKey {
        (R::KIND.to_string(), name.to_string())
    }

    fn encode<R: Resource>(resource: &R) -> Result<JsonValue, StoreError> {
        serde_json::to_value(resource).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode<R: Resource>(value: &JsonValue) -> Result<R, StoreError> {
        R::deserialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl StateStore for InMemoryStateStore {
    fn get<R: Resource>(&self, name: &str) -> Result<R, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let value = inner
            .objects
            .get(&Self::key::<R>(name))
            .ok_or_else(|| StoreError::not_found::<R>(name))?;
        Self::decode(value)
    }

    fn list<R: Resource>(&self, selector: &LabelSelector) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut out = Vec::new();
        for ((kind, _), value) in &inner.objects {
            if kind != R::KIND {
                continue;
            }
            let resource: R = Self::decode(value)?;
            if selector.matches(&resource.meta().labels) {
                out.push(resource);
            }
        }
        Ok(out)
    }

    fn create<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let key = Self::key::<R>(resource.name());
        if inner.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: R::KIND.to_string(),
                name: resource.name().to_string(),
            });
        }

        inner.last_version += 1;
        let mut stored = resource.clone();
        let meta = stored.meta_mut();
        meta.uid = Some(ObjectUid::new());
        meta.creation_timestamp = Some(Utc::now());
        meta.resource_version = inner.last_version;

        inner.objects.insert(key, Self::encode(&stored)?);
        Ok(stored)
    }

    fn update<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let key = Self::key::<R>(resource.name());
        let current: R = match inner.objects.get(&key) {
            Some(value) => Self::decode(value)?,
            None => return Err(StoreError::not_found::<R>(resource.name())),
        };

        let found = current.meta().resource_version;
        let expected = resource.meta().resource_version;
        if expected != found {
            return Err(StoreError::Conflict {
                kind: R::KIND.to_string(),
                name: resource.name().to_string(),
                expected,
                found,
            });
        }

        inner.last_version += 1;
        let mut stored = resource.clone();
        let meta = stored.meta_mut();
        // Identity is owned by the store.
        meta.uid = current.meta().uid;
        meta.creation_timestamp = current.meta().creation_timestamp;
        meta.resource_version = inner.last_version;

        inner.objects.insert(key, Self::encode(&stored)?);
        Ok(stored)
    }

    fn delete<R: Resource>(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        match inner.objects.remove(&Self::key::<R>(name)) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found::<R>(name)),
        }
    }
}
