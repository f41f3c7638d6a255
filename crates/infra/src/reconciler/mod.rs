//! Signup reconciliation.
//!
//! [`SignupReconciler::reconcile`] is a level-triggered decision function: it
//! re-reads the signup and its dependents on every call and converges on the
//! desired state no matter how often, or in which order, it is invoked. Each
//! stage lives in its own module:
//!
//! | Stage | Module |
//! |---|---|
//! | status/label persistence | `status` |
//! | ban evaluation | `ban` |
//! | deactivation notifications | `deactivation` |
//! | existing account handling | `existing` |
//! | approval and placement | `approval` |
//! | account provisioning | `provision` |
//! | username allocation | `username` |
//! | workspace and binding | `workspace` |

mod approval;
mod ban;
mod deactivation;
mod error;
mod existing;
mod provision;
mod status;
mod username;
mod workspace;

use std::sync::Arc;

use tracing::{debug, info, info_span};

use onboard_observability::MetricsSink;
use onboard_signup::{
    EmailDomain, SignupRequest, SignupState, SocialEvent, StatusUpdate, UserTier, WorkspaceTier,
    keys,
};

use crate::config::OnboardingConfig;
use crate::external::{NotificationSender, PlacementProvider};
use crate::store::StateStore;

pub use error::ReconcileError;
pub use username::probe_username;

/// Drives one signup towards its terminal state.
///
/// Collaborators are injected once and shared; the reconciler holds no
/// per-signup state between calls.
pub struct SignupReconciler<S> {
    store: S,
    config: Arc<OnboardingConfig>,
    placement: Arc<dyn PlacementProvider>,
    notifications: Arc<dyn NotificationSender>,
    metrics: Arc<dyn MetricsSink>,
}

impl<S: StateStore> SignupReconciler<S> {
    pub fn new(
        store: S,
        config: Arc<OnboardingConfig>,
        placement: Arc<dyn PlacementProvider>,
        notifications: Arc<dyn NotificationSender>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            store,
            config,
            placement,
            notifications,
            metrics,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    /// Reconcile the signup called `name`.
    ///
    /// A missing or terminating signup is a no-op.
    pub fn reconcile(&self, name: &str) -> Result<(), ReconcileError> {
        let span = info_span!("reconcile_signup", signup = %name);
        let _guard = span.enter();

        let Some(mut signup) = self.store.find::<SignupRequest>(name)? else {
            debug!("signup not found; nothing to do");
            return Ok(());
        };
        if signup.metadata.is_being_deleted() {
            info!("signup is being deleted");
            return Ok(());
        }
        debug!(username = %signup.spec.username, "reconciling signup");

        if signup
            .metadata
            .label(keys::STATE_LABEL)
            .is_none_or(str::is_empty)
        {
            self.set_state_label(&mut signup, SignupState::NotReady)?;
        }

        let banned = self.is_banned(&mut signup)?;

        self.reset_notification_conditions(&mut signup, banned)?;
        self.ensure_deactivating_notification(&mut signup)?;

        if self.reconcile_existing_account(&mut signup, banned)? {
            return Ok(());
        }

        if banned {
            self.set_state_label(&mut signup, SignupState::Banned)?;
            return self.update_status(&mut signup, &[StatusUpdate::Banned]);
        }

        if signup.is_deactivated() {
            return self.handle_deactivated(&mut signup);
        }

        self.ensure_account_if_approved(&mut signup)
    }

    /// Email-domain bucket used for counters.
    fn email_domain(&self, signup: &SignupRequest) -> &'static str {
        EmailDomain::classify(
            signup.email().unwrap_or_default(),
            &self.config.internal_email_domains,
        )
        .as_str()
    }

    /// The signup's social event; a dangling reference counts as none.
    fn social_event(&self, signup: &SignupRequest) -> Result<Option<SocialEvent>, ReconcileError> {
        match signup.social_event() {
            Some(event) => Ok(self.store.find(event)?),
            None => Ok(None),
        }
    }

    fn user_tier(&self, signup: &SignupRequest) -> Result<UserTier, ReconcileError> {
        let name = match self.social_event(signup)? {
            Some(event) => event.spec.user_tier,
            None => self.config.default_user_tier.clone(),
        };
        debug!(tier = %name, "looking up user tier");
        Ok(self.store.get(&name)?)
    }

    fn workspace_tier(&self, signup: &SignupRequest) -> Result<WorkspaceTier, ReconcileError> {
        let name = match self.social_event(signup)? {
            Some(event) => event.spec.workspace_tier,
            None => self.config.default_workspace_tier.clone(),
        };
        debug!(tier = %name, "looking up workspace tier");
        Ok(self.store.get(&name)?)
    }
}
