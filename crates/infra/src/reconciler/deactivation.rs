//! De-duplicated deactivation notifications.
//!
//! A notification is sent at most once per (username, type): the
//! `…NotificationCreated` condition gates the attempt and an existing
//! `Notification` object short-circuits it.

use tracing::{debug, error, info};

use onboard_signup::{
    ConditionType, Notification, NotificationType, SignupRequest, SignupState, StatusUpdate,
};

use super::{ReconcileError, SignupReconciler};
use crate::external::NotificationRequest;
use crate::store::StateStore;

impl<S: StateStore> SignupReconciler<S> {
    /// Reset the notification conditions of active users so that a later
    /// deactivation sends again.
    pub(super) fn reset_notification_conditions(
        &self,
        signup: &mut SignupRequest,
        banned: bool,
    ) -> Result<(), ReconcileError> {
        let mut updates = Vec::new();
        if !banned && !signup.is_deactivated() {
            updates.push(StatusUpdate::UserIsActive);
        }
        if !banned && !signup.is_deactivating() && !signup.is_deactivated() {
            updates.push(StatusUpdate::NotInPreDeactivation);
        }
        self.update_status(signup, &updates)
    }

    pub(super) fn ensure_deactivating_notification(
        &self,
        signup: &mut SignupRequest,
    ) -> Result<(), ReconcileError> {
        if !signup.is_deactivating()
            || signup
                .status
                .conditions
                .is_true(ConditionType::DeactivatingNotificationCreated.as_str())
        {
            return Ok(());
        }

        if let Err(err) = self.send_notification_once(signup, NotificationType::Deactivating) {
            error!(error = %err, "failed to create user deactivating notification");
            return Err(self.fail(signup, &[StatusUpdate::DeactivatingNotificationFailed], err));
        }
        self.update_status(signup, &[StatusUpdate::DeactivatingNotificationCreated])
    }

    /// Terminal handling of a deactivated signup that no longer has an account.
    ///
    /// The deactivated notification only goes out when the signup was active
    /// (`approved`) before.
    pub(super) fn handle_deactivated(&self, signup: &mut SignupRequest) -> Result<(), ReconcileError> {
        let was_active = signup.state() == Some(SignupState::Approved);
        if was_active
            && signup
                .status
                .conditions
                .is_not_true(ConditionType::DeactivatedNotificationCreated.as_str())
        {
            if let Err(err) = self.send_notification_once(signup, NotificationType::Deactivated) {
                error!(error = %err, "failed to create user deactivated notification");
                return Err(self.fail(signup, &[StatusUpdate::DeactivatedNotificationFailed], err));
            }
            self.update_status(signup, &[StatusUpdate::DeactivatedNotificationCreated])?;
        }

        self.set_state_label(signup, SignupState::Deactivated)?;
        self.update_status(signup, &[StatusUpdate::Deactivated])
    }

    fn send_notification_once(
        &self,
        signup: &SignupRequest,
        notification_type: NotificationType,
    ) -> Result<(), ReconcileError> {
        let username = signup.status.compliant_username.as_str();
        let existing: Vec<Notification> = self
            .store
            .list(&Notification::selector(username, notification_type))?;
        if !existing.is_empty() {
            debug!(
                username,
                kind = notification_type.as_str(),
                "notification already exists"
            );
            return Ok(());
        }

        let request = NotificationRequest::for_signup(
            signup,
            notification_type,
            &self.config.registration_service_url,
        );
        let name = self.notifications.send(&request)?;
        info!(notification = %name, kind = notification_type.as_str(), "notification created");
        Ok(())
    }
}
