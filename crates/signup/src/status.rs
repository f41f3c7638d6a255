//! Enumerated status mutations for a signup.
//!
//! Each reconciler stage describes what it observed as a [`StatusUpdate`];
//! [`StatusUpdate::apply`] is the only place that knows which condition slot
//! and reason that maps to.

use onboard_core::{Condition, ConditionStatus};

use crate::request::SignupStatus;

/// Condition types written on a signup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Approved,
    Complete,
    DeactivatingNotificationCreated,
    DeactivatedNotificationCreated,
}

impl ConditionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Approved => "Approved",
            ConditionType::Complete => "Complete",
            ConditionType::DeactivatingNotificationCreated => "UserDeactivatingNotificationCreated",
            ConditionType::DeactivatedNotificationCreated => "UserDeactivatedNotificationCreated",
        }
    }
}

/// Reasons recorded on `Complete=False` when a stage fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureReason {
    MissingUserEmailAnnotation,
    MissingEmailHash,
    InvalidEmailHash,
    FailedToReadBannedUsers,
    InvalidUserAccountState,
    NoUserTierAvailable,
    NoWorkspaceTierAvailable,
    UnableToCreateUserAccount,
    UnableToDeleteUserAccount,
    UnableToCreateWorkspace,
    UnableToCreateBinding,
    FailedToUpdateStateLabel,
    FailedToUpdateAnnotation,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::MissingUserEmailAnnotation => "MissingUserEmailAnnotation",
            FailureReason::MissingEmailHash => "MissingEmailHash",
            FailureReason::InvalidEmailHash => "InvalidEmailHash",
            FailureReason::FailedToReadBannedUsers => "FailedToReadBannedUsers",
            FailureReason::InvalidUserAccountState => "InvalidUserAccountState",
            FailureReason::NoUserTierAvailable => "NoUserTierAvailable",
            FailureReason::NoWorkspaceTierAvailable => "NoWorkspaceTierAvailable",
            FailureReason::UnableToCreateUserAccount => "UnableToCreateUserAccount",
            FailureReason::UnableToDeleteUserAccount => "UnableToDeleteUserAccount",
            FailureReason::UnableToCreateWorkspace => "UnableToCreateWorkspace",
            FailureReason::UnableToCreateBinding => "UnableToCreateBinding",
            FailureReason::FailedToUpdateStateLabel => "FailedToUpdateStateLabel",
            FailureReason::FailedToUpdateAnnotation => "FailedToUpdateAnnotation",
        }
    }
}

pub mod reason {
    pub const APPROVED_AUTOMATICALLY: &str = "ApprovedAutomatically";
    pub const APPROVED_BY_ADMIN: &str = "ApprovedByAdmin";
    pub const PENDING_APPROVAL: &str = "PendingApproval";
    pub const NO_CLUSTER_AVAILABLE: &str = "NoClusterAvailable";
    pub const VERIFICATION_REQUIRED: &str = "VerificationRequired";
    pub const PROVISIONING: &str = "Provisioning";
    pub const BANNED: &str = "Banned";
    pub const BANNING: &str = "Banning";
    pub const DEACTIVATED: &str = "Deactivated";
    pub const DEACTIVATION_IN_PROGRESS: &str = "DeactivationInProgress";
    pub const NOTIFICATION_CREATED: &str = "NotificationCRCreated";
    pub const NOTIFICATION_CREATION_FAILED: &str = "NotificationCRCreationFailed";
    pub const NOT_IN_PRE_DEACTIVATION: &str = "UserNotInPreDeactivation";
    pub const USER_IS_ACTIVE: &str = "UserIsActive";
}

/// A single observation to project onto the signup status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    ApprovedAutomatically,
    ApprovedByAdmin,
    PendingApproval,
    NoClustersAvailable,
    IncompletePendingApproval,
    VerificationRequired,
    Complete { compliant_username: String },
    /// Dependent records exist but are not ready yet.
    Incomplete { message: String },
    Banned,
    Banning,
    Deactivated,
    DeactivationInProgress,
    Failed(FailureReason),
    DeactivatingNotificationCreated,
    DeactivatingNotificationFailed,
    NotInPreDeactivation,
    DeactivatedNotificationCreated,
    DeactivatedNotificationFailed,
    UserIsActive,
}

impl StatusUpdate {
    fn condition(&self) -> (ConditionType, ConditionStatus, &'static str) {
        use ConditionStatus::{False, True};
        use ConditionType::*;

        match self {
            StatusUpdate::ApprovedAutomatically => (Approved, True, reason::APPROVED_AUTOMATICALLY),
            StatusUpdate::ApprovedByAdmin => (Approved, True, reason::APPROVED_BY_ADMIN),
            StatusUpdate::PendingApproval => (Approved, False, reason::PENDING_APPROVAL),
            StatusUpdate::NoClustersAvailable => (Complete, False, reason::NO_CLUSTER_AVAILABLE),
            StatusUpdate::IncompletePendingApproval => (Complete, False, reason::PENDING_APPROVAL),
            StatusUpdate::VerificationRequired => (Complete, False, reason::VERIFICATION_REQUIRED),
            StatusUpdate::Complete { .. } => (Complete, True, ""),
            StatusUpdate::Incomplete { .. } => (Complete, False, reason::PROVISIONING),
            StatusUpdate::Banned => (Complete, True, reason::BANNED),
            StatusUpdate::Banning => (Complete, False, reason::BANNING),
            StatusUpdate::Deactivated => (Complete, True, reason::DEACTIVATED),
            StatusUpdate::DeactivationInProgress => {
                (Complete, False, reason::DEACTIVATION_IN_PROGRESS)
            }
            StatusUpdate::Failed(failure) => (Complete, False, failure.as_str()),
            StatusUpdate::DeactivatingNotificationCreated => {
                (DeactivatingNotificationCreated, True, reason::NOTIFICATION_CREATED)
            }
            StatusUpdate::DeactivatingNotificationFailed => (
                DeactivatingNotificationCreated,
                False,
                reason::NOTIFICATION_CREATION_FAILED,
            ),
            StatusUpdate::NotInPreDeactivation => {
                (DeactivatingNotificationCreated, False, reason::NOT_IN_PRE_DEACTIVATION)
            }
            StatusUpdate::DeactivatedNotificationCreated => {
                (DeactivatedNotificationCreated, True, reason::NOTIFICATION_CREATED)
            }
            StatusUpdate::DeactivatedNotificationFailed => (
                DeactivatedNotificationCreated,
                False,
                reason::NOTIFICATION_CREATION_FAILED,
            ),
            StatusUpdate::UserIsActive => {
                (DeactivatedNotificationCreated, False, reason::USER_IS_ACTIVE)
            }
        }
    }

    /// Project this update onto `status`.
    ///
    /// `error_message` becomes the condition message for failure updates; an
    /// explicit message carried by the update takes precedence. Returns
    /// whether anything changed.
    pub fn apply(&self, status: &mut SignupStatus, error_message: Option<&str>) -> bool {
        let (kind, condition_status, reason) = self.condition();
        let message = match self {
            StatusUpdate::Incomplete { message } => message.as_str(),
            _ => error_message.unwrap_or_default(),
        };

        let mut changed = status.conditions.set(
            Condition::new(kind.as_str(), condition_status, reason).with_message(message),
        );

        if let StatusUpdate::Complete { compliant_username } = self {
            if status.compliant_username != *compliant_username {
                status.compliant_username = compliant_username.clone();
                changed = true;
            }
        }
        changed
    }
}
