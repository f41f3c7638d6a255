use std::sync::Arc;

use thiserror::Error;

use onboard_core::{LabelSelector, Resource};

/// State store operation error.
///
/// These are infrastructure errors; the reconciler decides which of them are
/// worth a status condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: String, name: String },

    /// The write was based on a stale resource version.
    #[error("conflict writing {kind} '{name}': expected version {expected}, found {found}")]
    Conflict {
        kind: String,
        name: String,
        expected: u64,
        found: u64,
    },

    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The write succeeded but the watch event could not be published.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl StoreError {
    pub fn not_found<R: Resource>(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: R::KIND.to_string(),
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Worth retrying without any change to the stored objects.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::Unavailable(_) | StoreError::Publish(_)
        )
    }
}

/// Typed access to persisted objects.
///
/// ## Semantics
///
/// - `create` assigns a uid, creation timestamp and the first resource version;
///   it fails with `AlreadyExists` if the name is taken.
/// - `update` fails with `Conflict` when the caller's resource version is stale,
///   and returns the object as stored (with its new version).
/// - `list` returns every object of the kind matching the selector, ordered by
///   name.
/// - `delete` removes the object immediately.
///
/// Implementations must be safe to share across threads; callers never hold
/// locks across calls.
pub trait StateStore: Send + Sync {
    fn get<R: Resource>(&self, name: &str) -> Result<R, StoreError>;

    fn list<R: Resource>(&self, selector: &LabelSelector) -> Result<Vec<R>, StoreError>;

    fn create<R: Resource>(&self, resource: &R) -> Result<R, StoreError>;

    fn update<R: Resource>(&self, resource: &R) -> Result<R, StoreError>;

    fn delete<R: Resource>(&self, name: &str) -> Result<(), StoreError>;

    /// `get` that maps `NotFound` to `None`.
    fn find<R: Resource>(&self, name: &str) -> Result<Option<R>, StoreError> {
        match self.get(name) {
            Ok(resource) => Ok(Some(resource)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<S> StateStore for Arc<S>
where
    S: StateStore + ?Sized,
{
    fn get<R: Resource>(&self, name: &str) -> Result<R, StoreError> {
        (**self).get(name)
    }

    fn list<R: Resource>(&self, selector: &LabelSelector) -> Result<Vec<R>, StoreError> {
        (**self).list(selector)
    }

    fn create<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        (**self).create(resource)
    }

    fn update<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        (**self).update(resource)
    }

    fn delete<R: Resource>(&self, name: &str) -> Result<(), StoreError> {
        (**self).delete::<R>(name)
    }
}
