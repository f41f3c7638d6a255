//! State store boundary.
//!
//! Typed CRUD over [`Resource`] kinds plus a publishing adapter that turns
//! successful writes into watch events.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStateStore;
pub use r#trait::{StateStore, StoreError};

use onboard_core::{LabelSelector, Resource};
use onboard_events::{EventBus, ResourceEvent, WatchAction};

/// Adapter that publishes a `ResourceEvent` after every successful write.
///
/// Ordering invariant: **publish happens only after the write succeeds**. A
/// failed publish is reported as `StoreError::Publish` even though the write
/// itself is durable; reconciliation is level-triggered so that is harmless.
pub struct PublishingStateStore<S, B> {
    store: S,
    bus: B,
}

impl<S, B> PublishingStateStore<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> PublishingStateStore<S, B>
where
    B: EventBus<ResourceEvent>,
{
    fn publish(&self, event: ResourceEvent) -> Result<(), StoreError> {
        self.bus
            .publish(event)
            .map_err(|err| StoreError::Publish(format!("{err:?}")))
    }
}

impl<S, B> StateStore for PublishingStateStore<S, B>
where
    S: StateStore,
    B: EventBus<ResourceEvent>,
{
    fn get<R: Resource>(&self, name: &str) -> Result<R, StoreError> {
        self.store.get(name)
    }

    fn list<R: Resource>(&self, selector: &LabelSelector) -> Result<Vec<R>, StoreError> {
        self.store.list(selector)
    }

    fn create<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        let created = self.store.create(resource)?;
        self.publish(ResourceEvent::for_resource(&created, WatchAction::Created))?;
        Ok(created)
    }

    fn update<R: Resource>(&self, resource: &R) -> Result<R, StoreError> {
        let updated = self.store.update(resource)?;
        self.publish(ResourceEvent::for_resource(&updated, WatchAction::Updated))?;
        Ok(updated)
    }

    fn delete<R: Resource>(&self, name: &str) -> Result<(), StoreError> {
        // Snapshot labels first so mappers can still route the event.
        let existing: R = self.store.get(name)?;
        self.store.delete::<R>(name)?;
        self.publish(ResourceEvent::for_resource(&existing, WatchAction::Deleted))
    }
}
