//! Notification records. Existence of a record means "already sent".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use onboard_core::{LabelSelector, ObjectMeta, Resource};

use crate::keys;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Deactivating,
    Deactivated,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Deactivating => "deactivating",
            NotificationType::Deactivated => "deactivated",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            NotificationType::Deactivating => "userdeactivating",
            NotificationType::Deactivated => "userdeactivated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub template: String,
    pub notification_type: NotificationType,
    pub recipient: String,
    /// Rendering context describing the user the notification is about.
    #[serde(default)]
    pub subject: BTreeMap<String, String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub metadata: ObjectMeta,
    pub spec: NotificationSpec,
}

impl Resource for Notification {
    const KIND: &'static str = "Notification";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl Notification {
    /// Selector for the de-duplication key `(username, type)`.
    pub fn selector(username: &str, notification_type: NotificationType) -> LabelSelector {
        LabelSelector::new()
            .with(keys::NOTIFICATION_USERNAME_LABEL, username)
            .with(keys::NOTIFICATION_TYPE_LABEL, notification_type.as_str())
    }
}
