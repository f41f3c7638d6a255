//! External collaborators: cluster placement and notification delivery.

pub mod notification;
pub mod placement;

pub use notification::{NotificationError, NotificationRequest, NotificationSender, StoreNotificationSender};
pub use placement::{CapacityPlacement, PlacementDecision, PlacementError, PlacementProvider, PlacementRequest};
