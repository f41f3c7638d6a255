//! Watch events and their delivery.
//!
//! The state store emits a `ResourceEvent` after every successful write; the
//! controller subscribes through an `EventBus` and maps each event back to the
//! signup(s) that must be reconciled.

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::{ResourceEvent, WatchAction};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
