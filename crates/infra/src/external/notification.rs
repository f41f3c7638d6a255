use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use onboard_core::{ObjectMeta, OwnerReference, Resource};
use onboard_signup::{
    Notification, NotificationSpec, NotificationType, SignupRequest, keys,
};

use crate::store::{StateStore, StoreError};

/// Context key carrying the registration service URL.
pub const REGISTRATION_URL_KEY: &str = "registrationURL";

const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification recipient is empty")]
    MissingRecipient,

    #[error("failed to create notification: {0}")]
    Store(#[from] StoreError),
}

/// What to send. De-duplication is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub notification_type: NotificationType,
    /// Compliant username the notification is about (de-dup label).
    pub username: String,
    pub recipient: String,
    pub subject: BTreeMap<String, String>,
    pub context: BTreeMap<String, String>,
    pub owner: Option<OwnerReference>,
}

impl NotificationRequest {
    /// Build the request for `signup`, filling the user context from its
    /// spec and annotations.
    pub fn for_signup(
        signup: &SignupRequest,
        notification_type: NotificationType,
        registration_service_url: &str,
    ) -> Self {
        let mut subject = BTreeMap::new();
        subject.insert("username".to_string(), signup.status.compliant_username.clone());
        subject.insert(USER_ID_KEY.to_string(), signup.name().to_string());
        let optional = [
            ("given_name", &signup.spec.given_name),
            ("family_name", &signup.spec.family_name),
            ("company", &signup.spec.company),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                subject.insert(key.to_string(), value.clone());
            }
        }
        let recipient = signup.email().unwrap_or_default().to_string();
        subject.insert("email".to_string(), recipient.clone());

        let context = BTreeMap::from([(
            REGISTRATION_URL_KEY.to_string(),
            registration_service_url.to_string(),
        )]);

        Self {
            notification_type,
            username: signup.status.compliant_username.clone(),
            recipient,
            subject,
            context,
            owner: signup.controller_reference(),
        }
    }

    /// Prefix for the generated object name. Signups that were never
    /// provisioned have no username yet and use the signup name instead.
    fn name_prefix(&self) -> &str {
        if !self.username.is_empty() {
            return &self.username;
        }
        self.subject
            .get(USER_ID_KEY)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Delivers notifications. Returns the name of the created notification.
pub trait NotificationSender: Send + Sync {
    fn send(&self, request: &NotificationRequest) -> Result<String, NotificationError>;
}

/// Sender that records notifications as `Notification` objects in the state
/// store; a downstream mailer picks them up from there.
pub struct StoreNotificationSender<S> {
    store: S,
}

impl<S> StoreNotificationSender<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: StateStore> NotificationSender for StoreNotificationSender<S> {
    fn send(&self, request: &NotificationRequest) -> Result<String, NotificationError> {
        if request.recipient.is_empty() {
            return Err(NotificationError::MissingRecipient);
        }

        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!(
            "{}-{}-{}",
            request.name_prefix(),
            request.notification_type.as_str(),
            &suffix[..5]
        );
        let mut metadata = ObjectMeta::new(name)
            .with_label(keys::NOTIFICATION_USERNAME_LABEL, request.username.as_str())
            .with_label(keys::NOTIFICATION_TYPE_LABEL, request.notification_type.as_str());
        metadata.owner_references.extend(request.owner.clone());

        let notification = Notification {
            metadata,
            spec: NotificationSpec {
                template: request.notification_type.template().to_string(),
                notification_type: request.notification_type,
                recipient: request.recipient.clone(),
                subject: request.subject.clone(),
                context: request.context.clone(),
            },
        };

        let created = self.store.create(&notification)?;
        Ok(created.metadata.name)
    }
}
