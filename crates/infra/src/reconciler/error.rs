use thiserror::Error;

use onboard_core::DomainError;
use onboard_signup::SignupState;

use crate::external::{NotificationError, PlacementError};
use crate::store::StoreError;

/// Why a reconcile attempt stopped.
///
/// Every variant aborts the current attempt; `is_transient` tells the worker
/// whether re-running without any external change can help.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("the required annotation '{0}' is not present")]
    MissingEmailAnnotation(String),

    #[error("the required label '{0}' is not present")]
    MissingEmailHashLabel(String),

    #[error("the email hash '{0}' is invalid")]
    InvalidEmailHash(String),

    #[error("multiple matching user accounts found for signup '{signup}' ({count})")]
    InvalidRecordState { signup: String, count: usize },

    #[error("no suitable member cluster found - capacity was reached")]
    NoCapacity,

    #[error("{0}")]
    InvalidUsername(String),

    #[error(
        "user account '{username}' is already owned by signup '{signup}'; the next reconcile will pick it up"
    )]
    UsernameOwnedBySignup { username: String, signup: String },

    #[error("unable to transform username [{requested}] even after {attempts} attempts")]
    UsernameExhausted { requested: String, attempts: usize },

    #[error("cannot create workspace '{0}' because it is currently being deleted")]
    WorkspaceTerminating(String),

    #[error("cannot create binding '{0}' because it is currently being deleted")]
    BindingTerminating(String),

    #[error(
        "unable to proceed because there are multiple bindings associated with user account '{account}' and workspace '{workspace}'"
    )]
    DuplicateBindings { account: String, workspace: String },

    #[error("unable to get target cluster from user account '{0}' for workspace creation")]
    MissingTargetCluster(String),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("unable to get the optimal target cluster: {0}")]
    Placement(#[from] PlacementError),

    #[error("illegal state transition from '{from}' to '{to}'")]
    IllegalStateTransition { from: SignupState, to: SignupState },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ReconcileError {
    pub fn is_transient(&self) -> bool {
        match self {
            ReconcileError::Store(err) => err.is_transient(),
            ReconcileError::Placement(err) => err.is_transient(),
            ReconcileError::Notification(NotificationError::Store(err)) => err.is_transient(),
            ReconcileError::NoCapacity | ReconcileError::UsernameOwnedBySignup { .. } => true,
            _ => false,
        }
    }
}
