use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use onboard_core::Resource;

/// What happened to the object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchAction {
    Created,
    Updated,
    Deleted,
}

/// Notification that an object changed in the state store.
///
/// Carries only what the watch mappers need (kind, name, labels); consumers
/// re-read the store for the current state. Delivery is at-least-once and
/// consumers must treat duplicates as harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEvent {
    event_id: Uuid,
    kind: String,
    name: String,
    action: WatchAction,
    /// Store revision of the object right after the write.
    resource_version: u64,
    labels: BTreeMap<String, String>,
    occurred_at: DateTime<Utc>,
}

impl ResourceEvent {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        action: WatchAction,
        resource_version: u64,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind: kind.into(),
            name: name.into(),
            action,
            resource_version,
            labels,
            occurred_at: Utc::now(),
        }
    }

    /// Snapshot the metadata of a typed object.
    pub fn for_resource<R: Resource>(resource: &R, action: WatchAction) -> Self {
        let meta = resource.meta();
        Self::new(
            R::KIND,
            meta.name.clone(),
            action,
            meta.resource_version,
            meta.labels.clone(),
        )
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_kind<R: Resource>(&self) -> bool {
        self.kind == R::KIND
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> WatchAction {
        self.action
    }

    pub fn resource_version(&self) -> u64 {
        self.resource_version
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
